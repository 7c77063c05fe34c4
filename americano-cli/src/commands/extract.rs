//! Extract concepts from lecture text files
//!
//! Each file is split into paragraph chunks named `{file stem}-{n}` and sent
//! through the same batch extractor the server uses. Ctrl-C cancels the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use americano_extraction::{BatchExtractor, BatchSummary, ContentChunk, HttpContentGenerator};
use americano_resilience::{CircuitRegistry, ResilientCaller, RetryPolicy};
use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::ConfigLoader;

/// Arguments for the extract command
#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Lecture text files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Content service endpoint (overrides config)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Maximum chunks in flight (overrides config)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Print the batch summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the extract command
pub async fn run(args: ExtractArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(endpoint) = args.endpoint {
        config.extraction.generator.endpoint = endpoint;
    }
    if let Some(concurrency) = args.concurrency {
        config.extraction = config.extraction.with_max_concurrency(concurrency);
    }

    let chunks = load_chunks(&args.files)?;
    if chunks.is_empty() {
        anyhow::bail!("no text found in the given files");
    }

    let generator = Arc::new(HttpContentGenerator::new(&config.extraction.generator)?);
    let extractor = BatchExtractor::new(
        generator,
        ResilientCaller::new(RetryPolicy::new(&config.resilience.retry)),
        Arc::new(CircuitRegistry::from_config(&config.resilience)),
        config.extraction,
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Cancelling batch");
            on_signal.cancel();
        }
    });

    match extractor.extract(chunks, &cancel).await {
        Ok(summary) => {
            print_summary(&summary, args.json)?;
            Ok(())
        }
        Err(e) => {
            if let Some(summary) = e.summary() {
                print_summary(summary, args.json)?;
            }
            Err(e.into())
        }
    }
}

fn load_chunks(files: &[PathBuf]) -> Result<Vec<ContentChunk>> {
    let mut chunks = Vec::new();
    for path in files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        chunks.extend(ContentChunk::paragraphs(&chunk_prefix(path), &text));
    }
    Ok(chunks)
}

fn chunk_prefix(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chunk".to_string())
}

fn print_summary(summary: &BatchSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "Batch {}: {} ({}/{} chunks succeeded, {} attempts, {} ms)",
        summary.batch_id,
        summary.outcome.as_str(),
        summary.succeeded,
        summary.total,
        summary.total_attempts(),
        summary.duration_ms()
    );
    for failure in summary.failures() {
        println!(
            "  {} failed after {} attempt(s): {}",
            failure.chunk_id,
            failure.attempts,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }

    let concepts = summary.unique_concepts();
    if !concepts.is_empty() {
        println!("\nConcepts:");
        for concept in concepts {
            match concept.description {
                Some(description) => println!("  {} - {}", concept.name, description),
                None => println!("  {}", concept.name),
            }
        }
    }
    Ok(())
}
