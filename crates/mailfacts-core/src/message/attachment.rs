//! Attachment kind detection.
//!
//! Content sniffing is authoritative; the filename extension only decides
//! when the bytes are inconclusive.

use std::fmt;

/// How far into the data a PDF header may appear.
const PDF_HEADER_WINDOW: usize = 1024;

/// Attachment kinds the normalizer can extract text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// PDF document, text layer extracted.
    Pdf,
    /// Raster image, text recognized by OCR.
    Image,
    /// Anything else; contributes no text.
    Unrecognized,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the attachment kind from its bytes, falling back to the filename.
pub fn sniff_kind(data: &[u8], filename: &str, image_extensions: &[String]) -> AttachmentKind {
    if is_pdf(data) {
        return AttachmentKind::Pdf;
    }
    if image::guess_format(data).is_ok() {
        return AttachmentKind::Image;
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if extension == "pdf" {
        AttachmentKind::Pdf
    } else if image_extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension)) {
        AttachmentKind::Image
    } else {
        AttachmentKind::Unrecognized
    }
}

fn is_pdf(data: &[u8]) -> bool {
    let window = &data[..data.len().min(PDF_HEADER_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}
