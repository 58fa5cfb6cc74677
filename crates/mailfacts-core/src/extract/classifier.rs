//! Keyword classification of normalized text.

use crate::models::document::DocumentCategory;

/// One classification rule: a case-insensitive predicate over lowercased text.
struct Rule {
    category: DocumentCategory,
    matches: fn(&str) -> bool,
}

/// Evaluated in order, first match wins. A text carrying both invoice and
/// contract keywords is an invoice.
const RULES: &[Rule] = &[
    Rule {
        category: DocumentCategory::Invoice,
        matches: |t| contains_any(t, &["invoice", "amount due", "invoice number"]),
    },
    Rule {
        category: DocumentCategory::Contract,
        matches: |t| contains_any(t, &["contract", "agreement", "expires", "expiration"]),
    },
    Rule {
        category: DocumentCategory::Bill,
        matches: |t| t.contains("due date") && contains_any(t, &["utility", "bill"]),
    },
];

/// Classify normalized body text into exactly one category.
pub fn classify(text: &str) -> DocumentCategory {
    let lower = text.to_lowercase();
    RULES
        .iter()
        .find(|rule| (rule.matches)(&lower))
        .map(|rule| rule.category)
        .unwrap_or(DocumentCategory::Other)
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invoice_keywords() {
        assert_eq!(classify("Your INVOICE is attached"), DocumentCategory::Invoice);
        assert_eq!(classify("Amount Due: $5.00"), DocumentCategory::Invoice);
    }

    #[test]
    fn test_invoice_beats_contract() {
        let text = "Invoice for the services under our contract agreement";
        assert_eq!(classify(text), DocumentCategory::Invoice);
    }

    #[test]
    fn test_contract_keywords() {
        assert_eq!(classify("This Agreement expires soon"), DocumentCategory::Contract);
        assert_eq!(classify("Expiration: 2025-01-01"), DocumentCategory::Contract);
    }

    #[test]
    fn test_bill_requires_due_date_and_bill_word() {
        assert_eq!(
            classify("Your utility statement, due date 2024-04-01"),
            DocumentCategory::Bill
        );
        assert_eq!(classify("Water bill\nDue Date: 1 May 2024"), DocumentCategory::Bill);
        assert_eq!(classify("Your bill is ready"), DocumentCategory::Other);
        assert_eq!(classify("due date 2024-04-01"), DocumentCategory::Other);
    }

    #[test]
    fn test_empty_is_other() {
        assert_eq!(classify(""), DocumentCategory::Other);
    }
}
