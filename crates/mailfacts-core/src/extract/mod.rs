//! Heuristic extraction of invoices, bills and contracts from normalized text.

pub mod classifier;
pub mod dates;
pub mod money;
mod parser;
pub mod patterns;
pub mod synthesizer;

pub use classifier::classify;
pub use dates::{DateExtractor, extract_dates};
pub use money::{MoneyExtractor, extract_money, normalize_amount};
pub use parser::{ExtractionResult, HeuristicParser, ItemParser};
pub use synthesizer::synthesize;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract all occurrences of the field, in text order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}
