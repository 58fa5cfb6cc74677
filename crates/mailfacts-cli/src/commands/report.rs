//! Report command - expiring contracts and upcoming bills across messages.

use std::fs;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{info, warn};

use mailfacts_core::{BillsReport, ParsedItem, Pipeline, bills_upcoming, contracts_expiring};

use super::{expand_inputs, load_config, reference_instant};

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    /// Glob pattern matching message files
    #[arg(required = true)]
    input: String,

    /// Window for expiring contracts, in days
    #[arg(long, default_value = "30")]
    contracts_days: i64,

    /// Window for upcoming bills, in days
    #[arg(long, default_value = "30")]
    bills_days: i64,

    /// Report as of this day (YYYY-MM-DD) instead of today
    #[arg(long)]
    reference: Option<NaiveDate>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    contracts_expiring: Vec<ParsedItem>,
    bills_upcoming: BillsReport,
}

pub async fn run(args: ReportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let files = expand_inputs(&args.input)?;
    let now = reference_instant(args.reference);
    let pipeline = Pipeline::from_config(&config);

    let mut items = Vec::new();
    for path in &files {
        match fs::read(path) {
            Ok(raw) => items.extend(pipeline.process_bytes(&raw, Some(now)).result.items),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    info!("Collected {} items from {} files", items.len(), files.len());

    let report = Report {
        contracts_expiring: contracts_expiring(&items, now, args.contracts_days),
        bills_upcoming: bills_upcoming(&items, now, args.bills_days),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} Contracts expiring within {} days: {}",
        style("ℹ").blue(),
        args.contracts_days,
        report.contracts_expiring.len()
    );
    for item in &report.contracts_expiring {
        println!("  - {}", item.summary);
    }

    println!();
    println!(
        "{} Bills due within {} days: {} (estimated total {})",
        style("ℹ").blue(),
        args.bills_days,
        report.bills_upcoming.count,
        report.bills_upcoming.total_estimated
    );
    for item in &report.bills_upcoming.items {
        println!("  - {}", item.summary);
    }

    Ok(())
}
