#[allow(unused_imports)]
pub(crate) use anyhow::{anyhow, bail, Error, Result};
#[allow(unused_imports)]
pub(crate) use tracing::{debug, error, info, trace, warn};

pub mod api;
pub mod articles;
pub mod batch;
pub mod checkpoint;
pub mod classify;
pub mod extract;
pub mod prompt;
pub mod taxonomy;
