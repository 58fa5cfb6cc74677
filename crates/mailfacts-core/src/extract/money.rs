//! Monetary amount extraction.
//!
//! A best-effort scanner: every amount-looking token is reported, including
//! ones that are really pieces of dates or reference numbers. Plausibility is
//! decided later, when items are synthesized.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::trace;

use super::FieldExtractor;
use super::patterns::{COMMA_GROUPED_AMOUNT, MONEY};
use crate::models::document::{Currency, MoneyCandidate};

/// Money field extractor.
pub struct MoneyExtractor;

impl MoneyExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MoneyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for MoneyExtractor {
    type Output = MoneyCandidate;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in MONEY.captures_iter(text) {
            let full_match = caps.get(0).unwrap();
            let amount = caps.name("amount").unwrap();

            let Some(value) = normalize_amount(amount.as_str()) else {
                trace!("Discarding unparseable amount {:?}", amount.as_str());
                continue;
            };

            let currency = caps
                .name("symbol")
                .or_else(|| caps.name("ccy"))
                .and_then(|m| Currency::from_token(m.as_str()));

            results.push(MoneyCandidate {
                value,
                currency,
                raw: full_match.as_str().trim().to_string(),
                span: (full_match.start(), full_match.end()),
                fractional: has_fraction(amount.as_str()),
                embedded: is_embedded(text, amount.start(), amount.end()),
            });
        }

        results
    }
}

/// Extract all money mentions from text, in order of appearance.
pub fn extract_money(text: &str) -> Vec<MoneyCandidate> {
    MoneyExtractor::new().extract_all(text)
}

/// Normalize an amount string with ambiguous separators to a decimal.
///
/// Commas are first read as thousands separators, which only holds when every
/// comma opens a three-digit group and at most one period follows them
/// (`1,234.56`). Otherwise periods followed by exactly three digits are read
/// as thousands separators and commas as the decimal point (`1.234,56`,
/// `120,00`). Anything still unparseable yields `None`.
pub fn normalize_amount(amount: &str) -> Option<Decimal> {
    if COMMA_GROUPED_AMOUNT.is_match(amount) {
        if let Ok(value) = Decimal::from_str(&amount.replace(',', "")) {
            return Some(value);
        }
    }

    let continental = strip_period_groups(amount).replace(',', ".");
    Decimal::from_str(&continental).ok()
}

/// Drop periods that are followed by exactly three digits.
fn strip_period_groups(amount: &str) -> String {
    let chars: Vec<char> = amount.chars().collect();
    let mut out = String::with_capacity(amount.len());

    for (i, &c) in chars.iter().enumerate() {
        if c == '.' {
            let digits = chars[i + 1..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .count();
            if digits == 3 {
                continue;
            }
        }
        out.push(c);
    }

    out
}

fn has_fraction(amount: &str) -> bool {
    let bytes = amount.as_bytes();
    bytes.len() > 3 && matches!(bytes[bytes.len() - 3], b'.' | b',')
}

/// Whether the matched amount is part of a longer numeric token, such as a
/// fragment of `15.03.2024` or `INV2024`.
fn is_embedded(text: &str, start: usize, end: usize) -> bool {
    let before: Vec<char> = text[..start].chars().rev().take(2).collect();
    let after: Vec<char> = text[end..].chars().take(2).collect();

    let glued_before = match before.as_slice() {
        [c, ..] if c.is_alphanumeric() => true,
        [c, d, ..] if is_separator(*c) && d.is_ascii_digit() => true,
        _ => false,
    };
    let glued_after = match after.as_slice() {
        [c, ..] if c.is_ascii_digit() => true,
        [c, d, ..] if is_separator(*c) && d.is_ascii_digit() => true,
        _ => false,
    };

    glued_before || glued_after
}

fn is_separator(c: char) -> bool {
    matches!(c, '.' | ',' | '/' | '-' | ':')
}
