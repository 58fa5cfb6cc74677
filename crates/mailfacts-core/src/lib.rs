//! Core library for extracting invoices, bills and contracts from email.
//!
//! This crate provides:
//! - MIME normalization into a single text body, including PDF text layers
//!   and OCR of image attachments
//! - Keyword classification into invoice / contract / bill / other
//! - Money and date extraction with separator and natural-language handling
//! - Item synthesis with fixed confidence scores, plus deadline queries

pub mod error;
pub mod extract;
pub mod message;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod query;

pub use error::{MailfactsError, OcrError, PdfError, Result};
pub use extract::{
    ExtractionResult, HeuristicParser, ItemParser, classify, extract_dates, extract_money,
    synthesize,
};
pub use message::ContentNormalizer;
pub use models::config::MailfactsConfig;
pub use models::document::{
    Currency, DateCandidate, Document, DocumentCategory, MoneyCandidate, ParsedItem,
};
pub use ocr::{ImageOcr, OcrResult, TextBox};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pipeline::{Pipeline, ProcessedMessage};
pub use query::{BillsReport, bills_upcoming, contracts_expiring};
