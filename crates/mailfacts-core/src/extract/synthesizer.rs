//! Item synthesis from a category and its money and date candidates.

use tracing::trace;

use crate::models::document::{DateCandidate, DocumentCategory, MoneyCandidate, ParsedItem};

/// Confidence of money-derived invoice and bill items.
pub const PAYABLE_CONFIDENCE: f32 = 0.8;

/// Confidence of an invoice or bill item that only carries a date.
pub const PAYABLE_DATE_ONLY_CONFIDENCE: f32 = 0.6;

/// Confidence of a contract expiry/term item.
pub const CONTRACT_CONFIDENCE: f32 = 0.85;

/// Confidence of a money mention in an unclassified document.
pub const OTHER_CONFIDENCE: f32 = 0.5;

/// Combine the classification and candidates of one document into items.
///
/// Implausible money candidates are ignored. Money-derived items all share the
/// first date candidate; no pairing by proximity is attempted. The output is a
/// pure function of the inputs.
pub fn synthesize(
    category: DocumentCategory,
    money: &[MoneyCandidate],
    dates: &[DateCandidate],
) -> Vec<ParsedItem> {
    let money: Vec<&MoneyCandidate> = money
        .iter()
        .filter(|m| {
            let plausible = m.is_plausible();
            if !plausible {
                trace!("Ignoring implausible amount {:?}", m.raw);
            }
            plausible
        })
        .collect();
    let first_date = dates.first();

    match category {
        DocumentCategory::Invoice | DocumentCategory::Bill => {
            if money.is_empty() {
                return first_date
                    .map(|d| ParsedItem {
                        category,
                        subtype: None,
                        amount: None,
                        currency: None,
                        date: Some(d.date()),
                        confidence: PAYABLE_DATE_ONLY_CONFIDENCE,
                        summary: format!("{} detected, date {}", category, d.raw),
                    })
                    .into_iter()
                    .collect();
            }

            money
                .into_iter()
                .map(|m| {
                    let mut summary = format!("{} detected: {}", category, m.raw);
                    if let Some(d) = first_date {
                        summary.push_str(&format!("; date: {}", d.date()));
                    }
                    money_item(category, m, first_date, PAYABLE_CONFIDENCE, summary)
                })
                .collect()
        }
        DocumentCategory::Contract => dates
            .iter()
            .map(|d| d.datetime)
            .max()
            .map(|latest| ParsedItem {
                category,
                subtype: None,
                amount: None,
                currency: None,
                date: Some(latest.date()),
                confidence: CONTRACT_CONFIDENCE,
                summary: format!("Contract expiry/term date: {}", latest.date()),
            })
            .into_iter()
            .collect(),
        DocumentCategory::Other => money
            .into_iter()
            .map(|m| {
                let summary = format!("Money mention: {}", m.raw);
                money_item(category, m, first_date, OTHER_CONFIDENCE, summary)
            })
            .collect(),
    }
}

fn money_item(
    category: DocumentCategory,
    money: &MoneyCandidate,
    date: Option<&DateCandidate>,
    confidence: f32,
    summary: String,
) -> ParsedItem {
    ParsedItem {
        category,
        subtype: None,
        amount: Some(money.value),
        currency: money.currency,
        date: date.map(DateCandidate::date),
        confidence,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::Currency;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn money(value: i64, scale: u32, currency: Option<Currency>, raw: &str) -> MoneyCandidate {
        MoneyCandidate {
            value: Decimal::new(value, scale),
            currency,
            raw: raw.to_string(),
            span: (0, raw.len()),
            fractional: scale == 2,
            embedded: false,
        }
    }

    fn date(y: i32, m: u32, d: u32, raw: &str) -> DateCandidate {
        DateCandidate {
            datetime: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            raw: raw.to_string(),
        }
    }

    #[test]
    fn test_invoice_items_share_first_date() {
        let monies = vec![
            money(12000, 2, Some(Currency::Usd), "$120.00"),
            money(500, 2, None, "5.00"),
        ];
        let dates = vec![
            date(2024, 5, 1, "due date 2024-05-01"),
            date(2024, 6, 1, "next 2024-06-01"),
        ];

        let items = synthesize(DocumentCategory::Invoice, &monies, &dates);
        assert_eq!(items.len(), 2);
        for item in &items {
            assert_eq!(item.date, NaiveDate::from_ymd_opt(2024, 5, 1));
            assert_eq!(item.confidence, PAYABLE_CONFIDENCE);
        }
        assert_eq!(items[0].summary, "invoice detected: $120.00; date: 2024-05-01");
        assert_eq!(items[0].currency, Some(Currency::Usd));
        assert_eq!(items[1].amount, Some(Decimal::new(500, 2)));
    }

    #[test]
    fn test_bill_without_money_uses_date_line() {
        let dates = vec![date(2024, 4, 1, "Due date: 2024-04-01")];
        let items = synthesize(DocumentCategory::Bill, &[], &dates);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, None);
        assert_eq!(items[0].confidence, PAYABLE_DATE_ONLY_CONFIDENCE);
        assert_eq!(items[0].summary, "bill detected, date Due date: 2024-04-01");
    }

    #[test]
    fn test_implausible_money_is_ignored() {
        let monies = vec![money(552, 0, None, "552")];
        let items = synthesize(DocumentCategory::Invoice, &monies, &[]);
        assert!(items.is_empty());
    }

    #[test]
    fn test_contract_uses_latest_date() {
        let dates = vec![
            date(2024, 1, 1, "Effective 2024-01-01"),
            date(2026, 12, 31, "Expires 2026-12-31"),
            date(2025, 6, 30, "Renewal 2025-06-30"),
        ];
        let monies = vec![money(10000, 2, Some(Currency::Gbp), "£100.00")];

        let items = synthesize(DocumentCategory::Contract, &monies, &dates);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].date, NaiveDate::from_ymd_opt(2026, 12, 31));
        assert_eq!(items[0].amount, None);
        assert_eq!(items[0].confidence, CONTRACT_CONFIDENCE);
        assert_eq!(items[0].summary, "Contract expiry/term date: 2026-12-31");
    }

    #[test]
    fn test_contract_without_dates_is_empty() {
        assert!(synthesize(DocumentCategory::Contract, &[], &[]).is_empty());
    }

    #[test]
    fn test_other_needs_money() {
        let dates = vec![date(2024, 1, 1, "2024-01-01")];
        assert!(synthesize(DocumentCategory::Other, &[], &dates).is_empty());

        let monies = vec![money(999, 2, Some(Currency::Eur), "€9.99")];
        let items = synthesize(DocumentCategory::Other, &monies, &dates);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].confidence, OTHER_CONFIDENCE);
        assert_eq!(items[0].summary, "Money mention: €9.99");
        assert_eq!(items[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_repeated_invocations_are_identical() {
        let monies = vec![money(12000, 2, Some(Currency::Usd), "$120.00")];
        let dates = vec![date(2024, 5, 1, "due 2024-05-01")];

        let run = || serde_json::to_string(&synthesize(DocumentCategory::Bill, &monies, &dates));
        assert_eq!(run().unwrap(), run().unwrap());
    }
}
