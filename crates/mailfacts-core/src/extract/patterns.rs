//! Common regex patterns for money and date extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Month names and their common abbreviations, captured as one group.
const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b\.?";

/// Keywords marking a line as likely to carry a relevant date.
pub const DATE_SIGNAL_KEYWORDS: &[&str] = &[
    "due",
    "expires",
    "expiry",
    "effective",
    "end date",
    "renewal",
    "term",
    "period",
    "invoice date",
];

lazy_static! {
    // Money: optional leading symbol, grouped or plain integer part, optional
    // two-digit fraction, optional trailing symbol or code
    pub static ref MONEY: Regex = Regex::new(
        r"(?i)(?P<symbol>£|\$|€)?\s?(?P<amount>(?:[0-9]{1,3}(?:[.,][0-9]{3})+|[0-9]+)(?:[.,][0-9]{2})?)\s?(?P<ccy>GBP|USD|EUR|£|\$|€)?"
    ).unwrap();

    // Amount with commas as thousands separators and an optional period decimal
    pub static ref COMMA_GROUPED_AMOUNT: Regex = Regex::new(
        r"^(?:[0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(?:\.[0-9]+)?$"
    ).unwrap();

    // Loose numeric date: two or three numeric groups
    pub static ref LOOSE_NUMERIC_DATE: Regex = Regex::new(
        r"\b\d{1,4}[/\-. ]\d{1,2}(?:[/\-. ]\d{2,4})?\b"
    ).unwrap();

    // 2024-03-15, 2024/03/15, 2024.03.15
    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // 15/03/2024 or 03/15/2024, two-digit years allowed
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    // 15 March 2024, 15th of March, 2024
    pub static ref DATE_DAY_MONTH_YEAR: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?(?:\s+of)?[\s\-]+{MONTH},?[\s\-]+(\d{{4}})\b"
    )).unwrap();

    // March 15, 2024
    pub static ref DATE_MONTH_DAY_YEAR: Regex = Regex::new(&format!(
        r"(?i)\b{MONTH}\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"
    )).unwrap();

    // March 2024
    pub static ref DATE_MONTH_YEAR: Regex = Regex::new(&format!(
        r"(?i)\b{MONTH},?\s+(\d{{4}})\b"
    )).unwrap();

    // 15 March (year taken from the reference instant)
    pub static ref DATE_DAY_MONTH: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?(?:\s+of)?\s+{MONTH}"
    )).unwrap();

    // March 15 (year taken from the reference instant)
    pub static ref DATE_MONTH_DAY: Regex = Regex::new(&format!(
        r"(?i)\b{MONTH}\s+(\d{{1,2}})(?:st|nd|rd|th)?\b"
    )).unwrap();

    // today, tomorrow, yesterday
    pub static ref RELATIVE_DAY: Regex = Regex::new(
        r"(?i)\b(today|tomorrow|yesterday)\b"
    ).unwrap();

    // in 30 days, within two weeks
    pub static ref RELATIVE_IN: Regex = Regex::new(
        r"(?i)\b(?:in|within)\s+(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|twelve)\s+(day|week|month|year)s?\b"
    ).unwrap();

    // 3 days ago
    pub static ref RELATIVE_AGO: Regex = Regex::new(
        r"(?i)\b(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|twelve)\s+(day|week|month|year)s?\s+ago\b"
    ).unwrap();

    // next week, next month, next year
    pub static ref RELATIVE_NEXT: Regex = Regex::new(
        r"(?i)\bnext\s+(week|month|year)\b"
    ).unwrap();

    // Naive HTML tag
    pub static ref HTML_TAG: Regex = Regex::new(r"<[^<]+?>").unwrap();
}
