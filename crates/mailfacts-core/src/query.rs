//! Deadline views over extracted items.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::document::{DocumentCategory, ParsedItem};

/// Payable items falling due within a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillsReport {
    /// Number of matching items.
    pub count: usize,
    /// Sum of the amounts present on matching items, regardless of currency.
    /// Saturates at [`Decimal::MAX`].
    #[serde(with = "rust_decimal::serde::float")]
    pub total_estimated: Decimal,
    /// Matching items, in input order.
    pub items: Vec<ParsedItem>,
}

/// Last day of a window of `days` from `now`, clamped to the calendar range.
fn horizon(now: NaiveDateTime, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .map(|end| end.date())
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

fn dated_before<'a>(
    items: &'a [ParsedItem],
    limit: NaiveDate,
    wanted: impl Fn(DocumentCategory) -> bool + 'a,
) -> impl Iterator<Item = &'a ParsedItem> + 'a {
    items
        .iter()
        .filter(move |item| wanted(item.category))
        .filter(move |item| item.date.is_some_and(|d| d <= limit))
}

/// Contract items whose date falls on or before `now + days`.
pub fn contracts_expiring(items: &[ParsedItem], now: NaiveDateTime, days: i64) -> Vec<ParsedItem> {
    dated_before(items, horizon(now, days), |c| c == DocumentCategory::Contract)
        .cloned()
        .collect()
}

/// Invoice and bill items due on or before `now + days`.
pub fn bills_upcoming(items: &[ParsedItem], now: NaiveDateTime, days: i64) -> BillsReport {
    let items: Vec<ParsedItem> = dated_before(items, horizon(now, days), |c| c.is_payable())
        .cloned()
        .collect();
    let total_estimated = items
        .iter()
        .filter_map(|item| item.amount)
        .fold(Decimal::ZERO, |total, amount| {
            total.checked_add(amount).unwrap_or(Decimal::MAX)
        });

    BillsReport {
        count: items.len(),
        total_estimated,
        items,
    }
}
