//! PDF text layer extraction.

mod extractor;

pub use extractor::{PdfExtractor, extract_pdf_text};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Extract the embedded text of the entire PDF.
    fn extract_text(&self) -> Result<String>;
}
