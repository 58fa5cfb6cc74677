//! Document and extraction output models.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical normalized form of one source message plus its attachments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Decoded `Subject:` header.
    pub subject: String,

    /// Decoded `From:` header.
    pub sender: String,

    /// Decoded `To:` header.
    pub recipient: String,

    /// Parsed `Date:` header.
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// Body text with attachment extracts appended behind marker lines.
    /// Empty when nothing could be extracted.
    pub body: String,
}

impl Document {
    /// Build a document that only carries body text.
    pub fn from_text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }
}

/// Coarse classification of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    Invoice,
    Contract,
    Bill,
    Other,
}

impl DocumentCategory {
    /// Get the lowercase label of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Contract => "contract",
            Self::Bill => "bill",
            Self::Other => "other",
        }
    }

    /// Whether items of this category represent a payable amount.
    pub fn is_payable(&self) -> bool {
        matches!(self, Self::Invoice | Self::Bill)
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currencies recognized by the money extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Gbp,
    Usd,
    Eur,
}

impl Currency {
    /// Map a currency symbol or ISO code to a currency.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "£" | "GBP" => Some(Self::Gbp),
            "$" | "USD" => Some(Self::Usd),
            "€" | "EUR" => Some(Self::Eur),
            _ => None,
        }
    }

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Gbp => "GBP",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A monetary amount mention found in text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyCandidate {
    /// Normalized amount.
    pub value: Decimal,

    /// Currency, if a known symbol or code was attached.
    pub currency: Option<Currency>,

    /// Matched substring, trimmed.
    pub raw: String,

    /// Byte span of the match in the source text.
    pub span: (usize, usize),

    /// The amount ended with a two-digit fractional part.
    pub fractional: bool,

    /// The match is glued to a longer numeric token (e.g. a piece of a date).
    pub embedded: bool,
}

impl MoneyCandidate {
    /// Whether this candidate looks like an actual amount of money.
    ///
    /// A currency marker is enough; otherwise the amount must carry cents and
    /// stand on its own.
    pub fn is_plausible(&self) -> bool {
        self.currency.is_some() || (self.fractional && !self.embedded)
    }
}

/// A date resolved from one line of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCandidate {
    /// Resolved date and time.
    pub datetime: NaiveDateTime,

    /// Source line the date was resolved from, trimmed.
    pub raw: String,
}

impl DateCandidate {
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }
}

/// Final structured output unit of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedItem {
    /// Category of the document the item came from.
    pub category: DocumentCategory,

    /// Free-form refinement. No rule sets it yet.
    pub subtype: Option<String>,

    /// Amount, when the item is money-derived. Serialized as a JSON number.
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub amount: Option<Decimal>,

    /// Currency of `amount`.
    pub currency: Option<Currency>,

    /// Due, expiry or term date.
    pub date: Option<NaiveDate>,

    /// Fixed heuristic trust score in [0, 1].
    pub confidence: f32,

    /// Human-readable summary.
    pub summary: String,
}
