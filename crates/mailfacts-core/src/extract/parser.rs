//! Text-to-items parser running classification, money and date extraction.

use std::time::Instant;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::config::DateConfig;
use crate::models::document::{DateCandidate, DocumentCategory, MoneyCandidate, ParsedItem};

use super::{DateExtractor, FieldExtractor, MoneyExtractor, classify, synthesize};

/// Result of item extraction over one document's text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Document category.
    pub category: DocumentCategory,
    /// Extracted items, in order.
    pub items: Vec<ParsedItem>,
    /// All money candidates found, plausible or not.
    pub money: Vec<MoneyCandidate>,
    /// All date candidates found.
    pub dates: Vec<DateCandidate>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for text-to-items parsing.
pub trait ItemParser {
    /// Parse items from normalized text, resolving relative dates against
    /// `reference` when given.
    fn parse(&self, text: &str, reference: Option<NaiveDateTime>) -> ExtractionResult;
}

/// Keyword classifier plus regex money and date extraction.
#[derive(Debug, Clone, Default)]
pub struct HeuristicParser {
    date_config: DateConfig,
}

impl HeuristicParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set date extraction configuration.
    pub fn with_date_config(mut self, config: DateConfig) -> Self {
        self.date_config = config;
        self
    }
}

impl ItemParser for HeuristicParser {
    fn parse(&self, text: &str, reference: Option<NaiveDateTime>) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Parsing items from {} characters of text", text.len());

        let category = classify(text);
        let money = MoneyExtractor::new().extract_all(text);

        let mut date_extractor = DateExtractor::new().with_config(self.date_config.clone());
        if let Some(reference) = reference {
            date_extractor = date_extractor.with_reference(reference);
        }
        let dates = date_extractor.extract_all(text);

        if money.iter().all(|m| !m.is_plausible()) {
            warnings.push("No plausible amount found".to_string());
        }
        if dates.is_empty() {
            warnings.push("No date found".to_string());
        }

        let items = synthesize(category, &money, &dates);

        debug!(
            "Classified as {} with {} money and {} date candidates -> {} items",
            category,
            money.len(),
            dates.len(),
            items.len()
        );

        ExtractionResult {
            category,
            items,
            money,
            dates,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}
