//! Batch processing command for multiple message files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use mailfacts_core::{Pipeline, ProcessedMessage};

use super::process::{OutputFormat, format_output};
use super::{expand_inputs, load_config, reference_instant};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching message files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers (default from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Per-file timeout in seconds (default from config)
    #[arg(long)]
    timeout: Option<u64>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Resolve relative dates against this day (YYYY-MM-DD) instead of today
    #[arg(long)]
    reference: Option<NaiveDate>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    outcome: anyhow::Result<ProcessedMessage>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = expand_inputs(&args.input)?;

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);
    let limit = Duration::from_secs(args.timeout.unwrap_or(config.batch.attachment_timeout_secs));
    let reference = reference_instant(args.reference);
    let pipeline = Arc::new(Pipeline::from_config(&config));
    let semaphore = Arc::new(Semaphore::new(jobs));

    debug!("Processing with {} workers, {:?} timeout", jobs, limit);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut tasks = JoinSet::new();
    for path in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let pipeline = Arc::clone(&pipeline);

        tasks.spawn(async move {
            let file_start = Instant::now();
            let outcome = process_file(&path, pipeline, reference, limit).await;
            drop(permit);

            ProcessResult {
                path,
                outcome,
                processing_time_ms: file_start.elapsed().as_millis() as u64,
            }
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined?;

        if let Err(e) = &result.outcome {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), e);
            } else {
                error!("Failed to process {}: {}", result.path.display(), e);
                tasks.abort_all();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), e);
            }
        }

        overall_pb.inc(1);
        results.push(result);
    }

    overall_pb.finish_with_message("Complete");
    results.sort_by(|a, b| a.path.cmp(&b.path));

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            let Ok(processed) = &result.outcome else {
                continue;
            };

            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("message");
            let output_path =
                output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_output(processed, args.format, false)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&ProcessResult> = results.iter().filter(|r| r.outcome.is_err()).collect();
    let item_count: usize = results
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok())
        .map(|p| p.result.items.len())
        .sum();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} items",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red(),
        item_count
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Err(e) = &result.outcome {
                println!("  - {}: {}", result.path.display(), e);
            }
        }
    }

    Ok(())
}

/// Read and process one file on the blocking pool, bounded by `limit`.
async fn process_file(
    path: &Path,
    pipeline: Arc<Pipeline>,
    reference: NaiveDateTime,
    limit: Duration,
) -> anyhow::Result<ProcessedMessage> {
    let raw = tokio::fs::read(path).await?;
    run_bounded(limit, move || pipeline.process_bytes(&raw, Some(reference))).await
}

/// Run `work` on the blocking pool, giving up on it after `limit`.
///
/// Work that outlives `limit` keeps its thread until it returns; only its
/// result is discarded. The runtime is shut down without joining it.
async fn run_bounded<T, F>(limit: Duration, work: F) -> anyhow::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(joined) => Ok(joined?),
        Err(_) => anyhow::bail!("timed out after {:?}", limit),
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "category",
        "items",
        "amount",
        "currency",
        "date",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time_ms = result.processing_time_ms.to_string();

        match &result.outcome {
            Ok(processed) => {
                let first = processed.result.items.first();
                let item_count = processed.result.items.len().to_string();
                let amount = first
                    .and_then(|i| i.amount)
                    .map(|a| a.to_string())
                    .unwrap_or_default();
                let currency = first.and_then(|i| i.currency).map(|c| c.code()).unwrap_or("");
                let date = first
                    .and_then(|i| i.date)
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                let confidence = first
                    .map(|i| format!("{:.2}", i.confidence))
                    .unwrap_or_default();

                wtr.write_record([
                    filename,
                    "success",
                    processed.result.category.as_str(),
                    item_count.as_str(),
                    amount.as_str(),
                    currency,
                    date.as_str(),
                    confidence.as_str(),
                    time_ms.as_str(),
                    "",
                ])?;
            }
            Err(e) => {
                let message = e.to_string();
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    time_ms.as_str(),
                    message.as_str(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
