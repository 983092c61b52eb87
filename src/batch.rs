use crate::articles::{Article, OutputRow};
use crate::checkpoint::CheckpointStore;
use crate::classify::ItemClassifier;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Process-scoped accumulator: the rows produced so far plus the set of
/// identifiers already present in them. Owned exclusively by [`run`]; seeded
/// from the checkpoint store at startup.
pub struct RunState {
    pub rows: Vec<OutputRow>,
    pub processed_ids: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Checkpoint after every Nth appended row.
    pub checkpoint_every: usize,
    /// Fixed delay after each classification attempt, to stay under the
    /// remote service's rate ceiling. Tests inject `Duration::ZERO`.
    pub delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            checkpoint_every: 20,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Articles seen in the source.
    pub total: usize,
    /// Articles classified during this run.
    pub classified: usize,
    /// Articles skipped because a prior run already classified them.
    pub skipped_processed: usize,
    /// Articles skipped for having neither a usable title nor body.
    pub skipped_empty: usize,
    /// True when the run stopped early on an interrupt; the checkpoint is
    /// left on disk for the next run to resume from.
    pub interrupted: bool,
}

/// Drive the full article set through the classifier, strictly sequentially
/// and in source order.
///
/// Already-processed and empty articles are skipped; every remaining article
/// yields exactly one appended row (the classifier is total, so a bad article
/// degrades rather than aborting the run). The accumulator is checkpointed on
/// a fixed cadence and finalized on normal exhaustion. When `shutdown` is
/// observed between articles the current progress is checkpointed and the
/// summary comes back flagged `interrupted` instead of being finalized.
pub async fn run(
    articles: Vec<Article>,
    classifier: &dyn ItemClassifier,
    store: &CheckpointStore,
    options: &RunOptions,
    shutdown: Arc<AtomicBool>,
) -> crate::Result<RunSummary> {
    let checkpoint_every = options.checkpoint_every.max(1);
    let (rows, processed_ids) = store.load()?;
    let mut state = RunState {
        rows,
        processed_ids,
    };
    let mut summary = RunSummary::default();

    for article in articles {
        if shutdown.load(Ordering::SeqCst) {
            store.save(&state.rows)?;
            crate::warn!(
                "Interrupted; progress saved to {}",
                store.checkpoint_path().display()
            );
            summary.interrupted = true;
            return Ok(summary);
        }

        summary.total += 1;

        if state.processed_ids.contains(&article.id) {
            summary.skipped_processed += 1;
            continue;
        }
        if !article.has_usable_text() {
            crate::info!(article_id = %article.id, "Skipping article: no title or content");
            summary.skipped_empty += 1;
            continue;
        }

        crate::info!(
            article_id = %article.id,
            "Processing article {}: {:.50}",
            summary.total,
            article.title
        );

        let classification = classifier.classify(&article).await;
        crate::info!(
            article_id = %article.id,
            "  -> {} (confidence: {:.2})",
            classification.neighborhood,
            classification.confidence
        );

        state.processed_ids.insert(article.id.clone());
        state.rows.push(OutputRow::new(article, classification));
        summary.classified += 1;

        if state.rows.len() % checkpoint_every == 0 {
            store.save(&state.rows)?;
        }

        tokio::time::sleep(options.delay).await;
    }

    if let Err(e) = store.finalize(&state.rows) {
        // Best-effort checkpoint so completed work survives the failure.
        crate::error!("Finalize failed: {e}");
        store.save(&state.rows).ok();
        return Err(e);
    }
    crate::info!(
        "Processing complete: {} classified, {} already done, {} skipped empty",
        summary.classified,
        summary.skipped_processed,
        summary.skipped_empty
    );
    Ok(summary)
}
