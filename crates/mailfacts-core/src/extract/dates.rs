//! Date extraction from date-bearing lines.
//!
//! Lines carrying a date-signal keyword or a numeric date shape are resolved
//! first. Only when none of them resolves are the leading lines of the
//! document tried unconditionally. One date is resolved per line: the
//! earliest date expression on it.

use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Captures;
use tracing::{debug, trace};

use super::FieldExtractor;
use super::patterns::{
    DATE_DAY_MONTH, DATE_DAY_MONTH_YEAR, DATE_MONTH_DAY, DATE_MONTH_DAY_YEAR, DATE_MONTH_YEAR,
    DATE_NUMERIC, DATE_SIGNAL_KEYWORDS, DATE_YMD, LOOSE_NUMERIC_DATE, RELATIVE_AGO, RELATIVE_DAY,
    RELATIVE_IN, RELATIVE_NEXT,
};
use crate::models::config::{DateConfig, DateOrder};
use crate::models::document::DateCandidate;

/// Years outside this range are treated as noise.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2199;

/// Date field extractor.
#[derive(Debug, Clone, Default)]
pub struct DateExtractor {
    /// Instant relative phrases and yearless dates are resolved against.
    reference: Option<NaiveDateTime>,
    config: DateConfig,
}

impl DateExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative phrases ("in 30 days") against this instant.
    pub fn with_reference(mut self, reference: NaiveDateTime) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Set date extraction configuration.
    pub fn with_config(mut self, config: DateConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve the earliest date expression on a single line.
    pub fn resolve_line(&self, line: &str) -> Option<NaiveDateTime> {
        let mut best: Option<(usize, NaiveDateTime)> = None;
        let mut consider = |start: usize, resolved: Option<NaiveDateTime>| {
            if let Some(dt) = resolved {
                if best.is_none_or(|(s, _)| start < s) {
                    best = Some((start, dt));
                }
            }
        };

        // Most specific shapes first: on equal start positions the first wins
        for caps in DATE_YMD.captures_iter(line) {
            consider(start_of(&caps), ymd(num(&caps[1]), num(&caps[2]), num(&caps[3])));
        }
        for caps in DATE_NUMERIC.captures_iter(line) {
            consider(start_of(&caps), self.numeric(&caps));
        }
        for caps in DATE_DAY_MONTH_YEAR.captures_iter(line) {
            consider(
                start_of(&caps),
                month_number(&caps[2]).and_then(|m| ymd(num(&caps[3]), m, num(&caps[1]))),
            );
        }
        for caps in DATE_MONTH_DAY_YEAR.captures_iter(line) {
            consider(
                start_of(&caps),
                month_number(&caps[1]).and_then(|m| ymd(num(&caps[3]), m, num(&caps[2]))),
            );
        }
        for caps in DATE_MONTH_YEAR.captures_iter(line) {
            // A missing day resolves to the first of the month
            consider(
                start_of(&caps),
                month_number(&caps[1]).and_then(|m| ymd(num(&caps[2]), m, 1)),
            );
        }

        if let Some(reference) = self.reference {
            for caps in DATE_DAY_MONTH.captures_iter(line) {
                consider(
                    start_of(&caps),
                    month_number(&caps[2]).and_then(|m| ymd(reference.year(), m, num(&caps[1]))),
                );
            }
            for caps in DATE_MONTH_DAY.captures_iter(line) {
                consider(
                    start_of(&caps),
                    month_number(&caps[1]).and_then(|m| ymd(reference.year(), m, num(&caps[2]))),
                );
            }
            for caps in RELATIVE_DAY.captures_iter(line) {
                let resolved = match caps[1].to_lowercase().as_str() {
                    "today" => Some(reference),
                    "tomorrow" => reference.checked_add_days(Days::new(1)),
                    _ => reference.checked_sub_days(Days::new(1)),
                };
                consider(start_of(&caps), resolved);
            }
            for caps in RELATIVE_IN.captures_iter(line) {
                consider(
                    start_of(&caps),
                    count_word(&caps[1]).and_then(|n| shift(reference, n, &caps[2], true)),
                );
            }
            for caps in RELATIVE_AGO.captures_iter(line) {
                consider(
                    start_of(&caps),
                    count_word(&caps[1]).and_then(|n| shift(reference, n, &caps[2], false)),
                );
            }
            for caps in RELATIVE_NEXT.captures_iter(line) {
                consider(start_of(&caps), shift(reference, 1, &caps[1], true));
            }
        }

        best.map(|(_, dt)| dt)
    }

    fn numeric(&self, caps: &Captures) -> Option<NaiveDateTime> {
        let first: u32 = num(&caps[1]);
        let second: u32 = num(&caps[2]);
        let year = parse_year(&caps[3]);

        let (month, day) = if first > 12 {
            (second, first)
        } else if second > 12 {
            (first, second)
        } else {
            match self.config.date_order {
                DateOrder::MonthFirst => (first, second),
                DateOrder::DayFirst => (second, first),
            }
        };

        ymd(year, month, day)
    }

    fn collect(&self, lines: &[&str], filter: impl Fn(&str) -> bool) -> Vec<DateCandidate> {
        lines
            .iter()
            .copied()
            .filter(|&line| filter(line))
            .filter_map(|line| match self.resolve_line(line) {
                Some(datetime) => Some(DateCandidate {
                    datetime,
                    raw: line.to_string(),
                }),
                None => {
                    trace!("No date resolved from line {:?}", line);
                    None
                }
            })
            .collect()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = DateCandidate;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let signalled = self.collect(&lines, is_date_signal_line);
        if !signalled.is_empty() {
            return signalled;
        }

        let limit = self.config.fallback_line_limit.min(lines.len());
        let fallback = self.collect(&lines[..limit], |_| true);
        debug!(
            "No date-signal line resolved, fallback over {} lines found {}",
            limit,
            fallback.len()
        );
        fallback
    }
}

/// Extract date candidates from text without a reference instant.
pub fn extract_dates(text: &str) -> Vec<DateCandidate> {
    DateExtractor::new().extract_all(text)
}

/// Whether a line mentions a date-signal keyword or looks like it holds a
/// numeric date.
pub fn is_date_signal_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    DATE_SIGNAL_KEYWORDS.iter().any(|k| lower.contains(k)) || LOOSE_NUMERIC_DATE.is_match(line)
}

fn start_of(caps: &Captures) -> usize {
    caps.get(0).map(|m| m.start()).unwrap_or(0)
}

fn num<T: std::str::FromStr + Default>(s: &str) -> T {
    s.parse().unwrap_or_default()
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDateTime> {
    if !YEAR_RANGE.contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = num(s);
    if s.len() <= 2 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

fn month_number(month: &str) -> Option<u32> {
    let lower = month.to_lowercase();
    let number = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}

fn count_word(word: &str) -> Option<u32> {
    let n = match word.to_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "twelve" => 12,
        digits => digits.parse().ok()?,
    };
    Some(n)
}

fn shift(reference: NaiveDateTime, n: u32, unit: &str, forward: bool) -> Option<NaiveDateTime> {
    match unit.to_lowercase().as_str() {
        "day" | "week" => {
            let days = if unit.eq_ignore_ascii_case("week") { n as i64 * 7 } else { n as i64 };
            let delta = Duration::try_days(days)?;
            if forward {
                reference.checked_add_signed(delta)
            } else {
                reference.checked_sub_signed(delta)
            }
        }
        "month" | "year" => {
            let months = if unit.eq_ignore_ascii_case("year") { n.checked_mul(12)? } else { n };
            if forward {
                reference.checked_add_months(Months::new(months))
            } else {
                reference.checked_sub_months(Months::new(months))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reference() -> NaiveDateTime {
        date(2024, 1, 10).and_hms_opt(9, 30, 0).unwrap()
    }

    #[test]
    fn test_payment_due_iso() {
        let dates = extract_dates("Payment due 2024-03-15");
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].date(), date(2024, 3, 15));
        assert_eq!(dates[0].raw, "Payment due 2024-03-15");
    }

    #[test]
    fn test_month_name_forms() {
        let extractor = DateExtractor::new();
        let resolve = |line: &str| extractor.resolve_line(line).map(|dt| dt.date());

        assert_eq!(resolve("Expires 15 March 2024"), Some(date(2024, 3, 15)));
        assert_eq!(resolve("effective March 15th, 2024"), Some(date(2024, 3, 15)));
        assert_eq!(resolve("the 1st of Feb 2025"), Some(date(2025, 2, 1)));
        assert_eq!(resolve("renewal in June 2025"), Some(date(2025, 6, 1)));
    }

    #[test]
    fn test_numeric_order() {
        let month_first = DateExtractor::new();
        let day_first = DateExtractor::new().with_config(DateConfig {
            date_order: DateOrder::DayFirst,
            ..DateConfig::default()
        });

        assert_eq!(
            month_first.resolve_line("due 03/04/2024").map(|d| d.date()),
            Some(date(2024, 3, 4))
        );
        assert_eq!(
            day_first.resolve_line("due 03/04/2024").map(|d| d.date()),
            Some(date(2024, 4, 3))
        );
        // Unambiguous regardless of order
        assert_eq!(
            month_first.resolve_line("due 25/12/24").map(|d| d.date()),
            Some(date(2024, 12, 25))
        );
    }

    #[test]
    fn test_earliest_expression_wins() {
        let extractor = DateExtractor::new();
        let resolved = extractor.resolve_line("from 2024-01-01 until 2024-12-31");
        assert_eq!(resolved.map(|d| d.date()), Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_relative_phrases_need_reference() {
        assert!(DateExtractor::new().resolve_line("Payment due in 30 days").is_none());

        let extractor = DateExtractor::new().with_reference(reference());
        assert_eq!(
            extractor.resolve_line("Payment due in 30 days"),
            Some(date(2024, 2, 9).and_hms_opt(9, 30, 0).unwrap())
        );
        assert_eq!(
            extractor.resolve_line("term ends in two months").map(|d| d.date()),
            Some(date(2024, 3, 10))
        );
        assert_eq!(
            extractor.resolve_line("due tomorrow").map(|d| d.date()),
            Some(date(2024, 1, 11))
        );
        assert_eq!(
            extractor.resolve_line("issued 3 days ago").map(|d| d.date()),
            Some(date(2024, 1, 7))
        );
        assert_eq!(
            extractor.resolve_line("renewal next year").map(|d| d.date()),
            Some(date(2025, 1, 10))
        );
        assert_eq!(
            extractor.resolve_line("due March 5").map(|d| d.date()),
            Some(date(2024, 3, 5))
        );
    }

    #[test]
    fn test_signal_lines_take_precedence() {
        let text = "Hello 2023-01-01 there\nNothing\nContract term ends 2026-06-30";
        // Both lines are signal lines (numeric shape or keyword)
        let dates = extract_dates(text);
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[1].date(), date(2026, 6, 30));
    }

    #[test]
    fn test_fallback_scans_leading_lines() {
        let text = "Thanks for your order\nShipped on March 3, 2024\nRegards";
        let dates = extract_dates(text);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].date(), date(2024, 3, 3));
        assert_eq!(dates[0].raw, "Shipped on March 3, 2024");
    }

    #[test]
    fn test_fallback_respects_line_limit() {
        let mut text = "filler\n".repeat(5);
        text.push_str("Shipped on March 3, 2024");

        let limited = DateExtractor::new().with_config(DateConfig {
            fallback_line_limit: 5,
            ..DateConfig::default()
        });
        assert!(limited.extract_all(&text).is_empty());
        assert_eq!(DateExtractor::new().extract_all(&text).len(), 1);
    }

    #[test]
    fn test_no_dates_anywhere() {
        assert!(extract_dates("").is_empty());
        assert!(extract_dates("just some words\nand more words").is_empty());
        assert!(extract_dates("due soon, amount 120.00").is_empty());
    }

    #[test]
    fn test_invalid_calendar_dates_are_skipped() {
        assert!(extract_dates("due 2024-02-30").is_empty());
        assert!(extract_dates("due 0552-01-01").is_empty());
    }
}
