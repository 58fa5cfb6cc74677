//! MIME message normalization.
//!
//! Turns a raw RFC 5322 message into a [`Document`]: decoded headers plus one
//! body string built from the readable text parts and the text extracted from
//! PDF and image attachments. Attachment failures never abort normalization;
//! they leave a placeholder line in the body instead.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::DateTime;
use mail_parser::{Address, Message, MessageParser, MessagePart, MimeHeaders, PartType};
use tracing::{debug, warn};

use super::attachment::{AttachmentKind, sniff_kind};
use super::html::strip_html;
use crate::error::{MailfactsError, OcrError, PdfError, Result};
use crate::models::config::NormalizerConfig;
use crate::models::document::Document;
use crate::ocr::ImageOcr;
use crate::pdf::extract_pdf_text;

/// Separator placed between body segments.
const SEGMENT_SEPARATOR: &str = "\n\n";

/// Converts raw messages into normalized documents.
pub struct ContentNormalizer {
    config: NormalizerConfig,
    ocr: Option<Arc<dyn ImageOcr>>,
}

/// Body segments collected while walking the MIME tree.
#[derive(Default)]
struct BodyBuilder {
    segments: Vec<String>,
    has_plain: bool,
}

impl BodyBuilder {
    fn push_plain(&mut self, text: &str) {
        self.has_plain = true;
        self.segments.push(text.to_string());
    }

    fn push(&mut self, text: String) {
        self.segments.push(text);
    }

    fn finish(self) -> String {
        self.segments.join(SEGMENT_SEPARATOR)
    }
}

impl ContentNormalizer {
    /// Create a normalizer with default settings and no OCR engine.
    pub fn new() -> Self {
        Self {
            config: NormalizerConfig::default(),
            ocr: None,
        }
    }

    /// Use the given normalization settings.
    pub fn with_config(mut self, config: NormalizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an OCR engine for image attachments.
    pub fn with_ocr(mut self, ocr: Arc<dyn ImageOcr>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Whether an OCR engine is attached.
    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Parse and normalize a raw message.
    ///
    /// Bytes that do not parse as a message yield an empty document.
    pub fn normalize_bytes(&self, raw: &[u8]) -> Document {
        match MessageParser::default().parse(raw) {
            Some(message) => self.normalize_message(&message),
            None => {
                warn!("Input of {} bytes is not a parseable message", raw.len());
                Document::default()
            }
        }
    }

    /// Normalize an already parsed message.
    pub fn normalize_message(&self, message: &Message<'_>) -> Document {
        let mut body = BodyBuilder::default();
        self.walk(&message.parts, &mut body);

        let document = Document {
            subject: message.subject().unwrap_or_default().to_string(),
            sender: message.from().map(render_address).unwrap_or_default(),
            recipient: message.to().map(render_address).unwrap_or_default(),
            timestamp: message
                .date()
                .and_then(|d| DateTime::parse_from_rfc3339(&d.to_rfc3339()).ok()),
            body: body.finish(),
        };

        debug!(
            "Normalized message {:?}: {} body chars",
            document.subject,
            document.body.len()
        );

        document
    }

    fn walk(&self, parts: &[MessagePart<'_>], body: &mut BodyBuilder) {
        for part in parts {
            match &part.body {
                PartType::Multipart(_) => continue,
                PartType::Message(nested) => {
                    self.walk(&nested.parts, body);
                    continue;
                }
                _ => {}
            }

            let mime = mime_type(part);
            let filename = MimeHeaders::attachment_name(part);
            let attachment_disposition = MimeHeaders::content_disposition(part)
                .is_some_and(|d| d.ctype().eq_ignore_ascii_case("attachment"));

            // Body text is decided by disposition alone; a `name=` parameter on
            // an inline text part does not make it an attachment.
            if !attachment_disposition && mime == "text/plain" {
                body.push_plain(part.text_contents().unwrap_or_default());
            } else if !attachment_disposition && mime == "text/html" {
                if body.has_plain {
                    continue;
                }
                if let Some(html) = part.text_contents() {
                    body.push(strip_html(html));
                }
            } else if let Some(name) = filename {
                if let Some(text) = self.attachment_text(name, part.contents()) {
                    body.push(text);
                }
            }
        }
    }

    /// Text contributed by one attachment, or `None` when it is skipped.
    fn attachment_text(&self, name: &str, data: &[u8]) -> Option<String> {
        let kind = sniff_kind(data, name, &self.config.image_extensions);
        debug!("Attachment {:?}: {} ({} bytes)", name, kind, data.len());

        let extracted = match kind {
            AttachmentKind::Pdf if self.config.extract_pdf_text => self.pdf_text(data),
            AttachmentKind::Image if self.config.ocr_images => self.image_text(data),
            _ => return None,
        };

        Some(match extracted {
            Ok(text) => format!("[attachment {}: {}]\n{}", kind, name, text),
            Err(e) => {
                warn!("Attachment {:?} unreadable: {}", name, e);
                format!("[attachment {} {} unreadable: {}]", kind, name, e)
            }
        })
    }

    fn pdf_text(&self, data: &[u8]) -> Result<String> {
        self.check_size(data)?;
        // pdf-extract panics on some malformed inputs
        panic::catch_unwind(|| extract_pdf_text(data))
            .unwrap_or_else(|_| {
                Err(PdfError::TextExtraction("PDF parser panicked".to_string()))
            })
            .map_err(MailfactsError::from)
    }

    fn image_text(&self, data: &[u8]) -> Result<String> {
        let ocr = self.ocr.as_ref().ok_or(OcrError::NotConfigured)?;
        self.check_size(data)?;

        let image = image::load_from_memory(data)?;
        let text = panic::catch_unwind(AssertUnwindSafe(|| ocr.recognize(&image)))
            .unwrap_or_else(|_| Err(OcrError::Recognition("OCR engine panicked".to_string())))?;
        Ok(text)
    }

    fn check_size(&self, data: &[u8]) -> Result<()> {
        let limit = self.config.max_attachment_bytes;
        if data.len() > limit {
            return Err(MailfactsError::AttachmentTooLarge {
                size: data.len(),
                limit,
            });
        }
        Ok(())
    }
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase `type/subtype` of a part, inferred from the body when the
/// header is missing.
fn mime_type(part: &MessagePart<'_>) -> String {
    match MimeHeaders::content_type(part) {
        Some(ct) => match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub).to_lowercase(),
            None => ct.ctype().to_lowercase(),
        },
        None => match part.body {
            PartType::Text(_) => "text/plain".to_string(),
            PartType::Html(_) => "text/html".to_string(),
            _ => "application/octet-stream".to_string(),
        },
    }
}

/// Render an address header as `Name <addr>` entries joined by commas.
fn render_address(address: &Address<'_>) -> String {
    address
        .iter()
        .filter_map(|addr| match (addr.name(), addr.address()) {
            (Some(name), Some(email)) => Some(format!("{} <{}>", name, email)),
            (None, Some(email)) => Some(email.to_string()),
            (Some(name), None) => Some(name.to_string()),
            (None, None) => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    struct FixedOcr(&'static str);

    impl ImageOcr for FixedOcr {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn with_attachment(content_type: &str, filename: &str, data: &[u8]) -> String {
        format!(
            "From: billing@acme.test\r\n\
             Subject: Your bill\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/mixed; boundary=\"XX\"\r\n\
             \r\n\
             --XX\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             See attached.\r\n\
             --XX\r\n\
             Content-Type: {ct}; name=\"{name}\"\r\n\
             Content-Disposition: attachment; filename=\"{name}\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             {data}\r\n\
             --XX--\r\n",
            ct = content_type,
            name = filename,
            data = STANDARD.encode(data),
        )
    }

    #[test]
    fn test_headers_are_decoded() {
        let raw = "From: Acme Billing <billing@acme.test>\r\n\
                   To: you@example.test\r\n\
                   Subject: =?utf-8?q?Invoice_552?=\r\n\
                   Date: Wed, 01 May 2024 10:00:00 +0000\r\n\
                   \r\n\
                   Amount Due $120.00\r\n";
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert_eq!(doc.subject, "Invoice 552");
        assert_eq!(doc.sender, "Acme Billing <billing@acme.test>");
        assert_eq!(doc.recipient, "you@example.test");
        assert_eq!(
            doc.timestamp.map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:00:00+00:00".to_string())
        );
        assert!(doc.body.contains("Amount Due $120.00"));
    }

    #[test]
    fn test_missing_headers_are_empty() {
        let doc = ContentNormalizer::new().normalize_bytes(b"Subject: hi\r\n\r\nbody\r\n");
        assert_eq!(doc.sender, "");
        assert_eq!(doc.recipient, "");
        assert!(doc.timestamp.is_none());
    }

    #[test]
    fn test_plain_text_preferred_over_html() {
        let raw = "Subject: alt\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/alternative; boundary=\"B\"\r\n\
                   \r\n\
                   --B\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   plain version\r\n\
                   --B\r\n\
                   Content-Type: text/html\r\n\
                   \r\n\
                   <p>html version</p>\r\n\
                   --B--\r\n";
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert!(doc.body.contains("plain version"));
        assert!(!doc.body.contains("html version"));
    }

    #[test]
    fn test_html_used_without_plain_text() {
        let raw = "Subject: html\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: text/html\r\n\
                   \r\n\
                   <p>Amount due: <b>$12.00</b></p>\r\n";
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert!(doc.body.contains("Amount due: $12.00"));
        assert!(!doc.body.contains('<'));
    }

    #[test]
    fn test_broken_pdf_leaves_placeholder() {
        let raw = with_attachment("application/pdf", "bill.pdf", b"%PDF-1.4 truncated");
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert!(doc.body.starts_with("See attached."));
        assert!(doc.body.contains("[attachment pdf bill.pdf unreadable: "));
    }

    #[test]
    fn test_image_without_ocr_leaves_placeholder() {
        let raw = with_attachment("image/png", "scan.png", &png_bytes());
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert!(doc
            .body
            .contains("[attachment image scan.png unreadable: OCR error: no OCR engine configured]"));
    }

    #[test]
    fn test_image_text_from_ocr() {
        let raw = with_attachment("image/png", "scan.png", &png_bytes());
        let normalizer =
            ContentNormalizer::new().with_ocr(Arc::new(FixedOcr("Total due $45.00")));
        let doc = normalizer.normalize_bytes(raw.as_bytes());

        assert!(doc.body.contains("[attachment image: scan.png]\nTotal due $45.00"));
    }

    #[test]
    fn test_undecodable_image_leaves_placeholder() {
        let mut data = png_bytes();
        data.truncate(12);
        let raw = with_attachment("image/png", "scan.png", &data);
        let normalizer = ContentNormalizer::new().with_ocr(Arc::new(FixedOcr("unused")));
        let doc = normalizer.normalize_bytes(raw.as_bytes());

        assert!(doc.body.contains("[attachment image scan.png unreadable: image error: "));
        assert!(!doc.body.contains("unused"));
    }

    #[test]
    fn test_ocr_disabled_skips_images() {
        let raw = with_attachment("image/png", "scan.png", &png_bytes());
        let config = NormalizerConfig {
            ocr_images: false,
            ..NormalizerConfig::default()
        };
        let doc = ContentNormalizer::new()
            .with_config(config)
            .with_ocr(Arc::new(FixedOcr("hidden")))
            .normalize_bytes(raw.as_bytes());

        assert!(!doc.body.contains("attachment"));
    }

    #[test]
    fn test_oversized_attachment_leaves_placeholder() {
        let raw = with_attachment("image/png", "scan.png", &png_bytes());
        let config = NormalizerConfig {
            max_attachment_bytes: 8,
            ..NormalizerConfig::default()
        };
        let doc = ContentNormalizer::new()
            .with_config(config)
            .with_ocr(Arc::new(FixedOcr("hidden")))
            .normalize_bytes(raw.as_bytes());

        assert!(doc.body.contains("exceeds limit of 8 bytes"));
    }

    #[test]
    fn test_unrecognized_attachment_is_skipped() {
        let raw = with_attachment("text/csv", "data.csv", b"a,b,c\n1,2,3\n");
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert_eq!(doc.body.trim(), "See attached.");
    }

    #[test]
    fn test_named_inline_plain_part_is_body() {
        let raw = "Subject: named\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/mixed; boundary=\"N\"\r\n\
                   \r\n\
                   --N\r\n\
                   Content-Type: text/plain; charset=utf-8; name=\"body.txt\"\r\n\
                   \r\n\
                   Amount Due $120.00\r\n\
                   --N--\r\n";
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert_eq!(doc.body.trim(), "Amount Due $120.00");
    }

    #[test]
    fn test_named_plain_attachment_is_not_body() {
        let raw = with_attachment("text/plain", "notes.txt", b"Amount Due $9.00");
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert_eq!(doc.body.trim(), "See attached.");
    }

    #[test]
    fn test_embedded_message_is_walked() {
        let raw = "From: forwarder@example.test\r\n\
                   Subject: Fwd: your bill\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/mixed; boundary=\"F\"\r\n\
                   \r\n\
                   --F\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   Forwarding this.\r\n\
                   --F\r\n\
                   Content-Type: message/rfc822\r\n\
                   \r\n\
                   From: billing@acme.test\r\n\
                   Subject: Your bill\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   Total due $64.10\r\n\
                   --F--\r\n";
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert_eq!(doc.subject, "Fwd: your bill");
        assert!(doc.body.contains("Forwarding this."));
        assert!(doc.body.contains("Total due $64.10"));
    }

    #[test]
    fn test_latin1_body_is_decoded() {
        let mut raw = b"Subject: facture\r\n\
                        MIME-Version: 1.0\r\n\
                        Content-Type: text/plain; charset=iso-8859-1\r\n\
                        \r\n\
                        Caf"
            .to_vec();
        raw.push(0xE9);
        raw.extend_from_slice(b" total \xA35.00\r\n");
        let doc = ContentNormalizer::new().normalize_bytes(&raw);

        assert!(doc.body.contains("Café total £5.00"));
    }

    #[test]
    fn test_undecodable_bytes_are_dropped() {
        let mut raw = b"Subject: bytes\r\n\
                        Content-Type: text/plain; charset=utf-8\r\n\
                        \r\n\
                        Amount Due "
            .to_vec();
        raw.extend_from_slice(&[0xFF, 0xFE]);
        raw.extend_from_slice(b" $12.00\r\n");
        let doc = ContentNormalizer::new().normalize_bytes(&raw);

        assert!(doc.body.starts_with("Amount Due "));
        assert!(doc.body.contains("$12.00"));
    }

    #[test]
    fn test_malformed_encoded_word_subject() {
        let raw = "Subject: =?utf-8?q?Invoice_552 overdue\r\n\
                   From: =?bogus?x?Acme?= <billing@acme.test>\r\n\
                   \r\n\
                   Amount Due $120.00\r\n";
        let doc = ContentNormalizer::new().normalize_bytes(raw.as_bytes());

        assert!(doc.subject.contains("Invoice"));
        assert!(doc.sender.contains("billing@acme.test"));
        assert!(doc.body.contains("Amount Due $120.00"));
    }

    #[test]
    fn test_empty_input_gives_empty_document() {
        let doc = ContentNormalizer::new().normalize_bytes(b"");
        assert_eq!(doc, Document::default());
    }
}
