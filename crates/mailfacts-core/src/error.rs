//! Error types for the mailfacts-core library.
//!
//! None of these escape the extraction pipeline for message content: the
//! normalizer folds attachment failures into placeholder text. They surface
//! only from configuration loading and from direct use of the PDF and OCR
//! components.

use thiserror::Error;

/// Main error type for the mailfacts library.
#[derive(Error, Debug)]
pub enum MailfactsError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attachment exceeds the configured size limit.
    #[error("attachment of {size} bytes exceeds limit of {limit} bytes")]
    AttachmentTooLarge { size: usize, limit: usize },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF data.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from the PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// No OCR engine was configured for this run.
    #[error("no OCR engine configured")]
    NotConfigured,

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for the mailfacts library.
pub type Result<T> = std::result::Result<T, MailfactsError>;
