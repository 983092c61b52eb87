use clap::Parser;
use neighborhood_classifier::api::{AnthropicBackend, AnthropicConfig};
use neighborhood_classifier::articles::read_articles;
use neighborhood_classifier::batch::{run, RunOptions};
use neighborhood_classifier::checkpoint::CheckpointStore;
use neighborhood_classifier::classify::AnthropicClassifier;
use neighborhood_classifier::prompt::PromptTemplate;
use neighborhood_classifier::taxonomy::Taxonomy;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Exit status for a run stopped early by an interrupt. The checkpoint is
/// left on disk for the next invocation to resume from.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "neighborhood_classifier")]
#[command(about = "Classify news stories by San Francisco neighborhood using the Anthropic API")]
struct Cli {
    /// CSV export of stories to classify (id, title, clean_content, tags, categories)
    #[arg(short, long, default_value = "filtered_posts.csv")]
    input: PathBuf,

    /// CSV of allowed neighborhoods (canonical, aliases); built-in list if absent
    #[arg(short, long, default_value = "neighborhood_list.csv")]
    neighborhoods: PathBuf,

    /// Destination for the classified CSV; the checkpoint lives at <output>.tmp
    #[arg(short, long, default_value = "classified.csv")]
    output: PathBuf,

    /// Anthropic model id
    #[arg(long, default_value = "claude-3-5-sonnet-20241022")]
    model: String,

    /// Maximum tokens to generate per classification
    #[arg(long, default_value_t = 1000)]
    max_tokens: u64,

    /// Checkpoint after every Nth classified story
    #[arg(long, default_value_t = 20)]
    checkpoint_every: usize,

    /// Delay between API calls, in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match try_main(Cli::parse()).await {
        Ok(interrupted) => {
            if interrupted {
                ExitCode::from(EXIT_INTERRUPTED)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn try_main(cli: Cli) -> anyhow::Result<bool> {
    // Pre-flight: source and credentials must be present before any
    // processing begins.
    let articles = read_articles(&cli.input)?;
    let backend = AnthropicBackend::new(
        AnthropicConfig::new()
            .with_model_id(&cli.model)
            .with_max_tokens(cli.max_tokens),
    )?;

    let taxonomy = Taxonomy::load(&cli.neighborhoods)?;
    tracing::info!("Loaded {} neighborhoods", taxonomy.neighborhoods.len());

    let classifier = AnthropicClassifier::new(backend, PromptTemplate::for_taxonomy(&taxonomy));
    let store = CheckpointStore::new(&cli.output);
    let options = RunOptions {
        checkpoint_every: cli.checkpoint_every.max(1),
        delay: Duration::from_millis(cli.delay_ms),
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing the current story, then checkpointing");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let summary = run(articles, &classifier, &store, &options, shutdown).await?;
    tracing::info!(
        "Run finished: {} stories seen, {} classified, {} resumed from checkpoint, {} empty",
        summary.total,
        summary.classified,
        summary.skipped_processed,
        summary.skipped_empty
    );
    Ok(summary.interrupted)
}
