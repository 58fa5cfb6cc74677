//! Process command - extract items from a single message file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use mailfacts_core::{DocumentCategory, ParsedItem, Pipeline, ProcessedMessage};

use super::{load_config, reference_instant};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input message file (.eml)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Include the normalized body text in the output
    #[arg(long)]
    show_body: bool,

    /// Resolve relative dates against this day (YYYY-MM-DD) instead of today
    #[arg(long)]
    reference: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

/// Serializable view of one processed message.
#[derive(Serialize)]
struct MessageReport<'a> {
    subject: &'a str,
    sender: &'a str,
    recipient: &'a str,
    timestamp: Option<String>,
    category: DocumentCategory,
    items: &'a [ParsedItem],
    warnings: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Reading message...");

    let raw = fs::read(&args.input)?;

    pb.set_message("Extracting items...");
    let pipeline = Pipeline::from_config(&config);
    let processed = pipeline.process_bytes(&raw, Some(reference_instant(args.reference)));

    pb.finish_and_clear();

    for warning in &processed.result.warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }

    let output = format_output(&processed, args.format, args.show_body)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a processed message in the requested format.
pub fn format_output(
    processed: &ProcessedMessage,
    format: OutputFormat,
    show_body: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => format_json(processed, show_body),
        OutputFormat::Csv => format_csv(&processed.result.items),
        OutputFormat::Text => Ok(format_text(processed, show_body)),
    }
}

fn format_json(processed: &ProcessedMessage, show_body: bool) -> anyhow::Result<String> {
    let document = &processed.document;
    let report = MessageReport {
        subject: &document.subject,
        sender: &document.sender,
        recipient: &document.recipient,
        timestamp: document.timestamp.map(|t| t.to_rfc3339()),
        category: processed.result.category,
        items: &processed.result.items,
        warnings: &processed.result.warnings,
        body: show_body.then_some(document.body.as_str()),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn format_csv(items: &[ParsedItem]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "category",
        "subtype",
        "amount",
        "currency",
        "date",
        "confidence",
        "summary",
    ])?;

    for item in items {
        let amount = item.amount.map(|a| a.to_string()).unwrap_or_default();
        let date = item.date.map(|d| d.to_string()).unwrap_or_default();
        let confidence = format!("{:.2}", item.confidence);

        wtr.write_record([
            item.category.as_str(),
            item.subtype.as_deref().unwrap_or(""),
            amount.as_str(),
            item.currency.map(|c| c.code()).unwrap_or(""),
            date.as_str(),
            confidence.as_str(),
            item.summary.as_str(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(processed: &ProcessedMessage, show_body: bool) -> String {
    let document = &processed.document;
    let mut output = String::new();

    output.push_str(&format!("Subject: {}\n", document.subject));
    output.push_str(&format!("From: {}\n", document.sender));
    if let Some(timestamp) = document.timestamp {
        output.push_str(&format!("Date: {}\n", timestamp.to_rfc3339()));
    }
    output.push_str(&format!("Category: {}\n", processed.result.category));
    output.push('\n');

    if processed.result.items.is_empty() {
        output.push_str("No items found\n");
    } else {
        output.push_str("Items:\n");
        for (i, item) in processed.result.items.iter().enumerate() {
            output.push_str(&format!(
                "  {}. [{:.2}] {}\n",
                i + 1,
                item.confidence,
                item.summary
            ));
        }
    }

    if show_body {
        output.push_str("\nBody:\n");
        output.push_str(&document.body);
        output.push('\n');
    }

    output
}
