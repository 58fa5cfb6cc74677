//! End-to-end message processing.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extract::{ExtractionResult, HeuristicParser, ItemParser};
use crate::message::ContentNormalizer;
use crate::models::config::MailfactsConfig;
use crate::models::document::Document;
use crate::ocr::ImageOcr;

/// A normalized message together with what was extracted from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedMessage {
    pub document: Document,
    pub result: ExtractionResult,
}

/// Normalizer and item parser wired together.
///
/// Holds no mutable state, so one instance can serve many threads.
pub struct Pipeline {
    normalizer: ContentNormalizer,
    parser: HeuristicParser,
}

impl Pipeline {
    /// Create a pipeline with default settings and no OCR engine.
    pub fn new() -> Self {
        Self {
            normalizer: ContentNormalizer::new(),
            parser: HeuristicParser::new(),
        }
    }

    /// Build a pipeline from configuration.
    ///
    /// With the `native` feature the OCR engine is loaded when its model files
    /// are present. Image attachments otherwise degrade to placeholders.
    pub fn from_config(config: &MailfactsConfig) -> Self {
        let normalizer = ContentNormalizer::new().with_config(config.normalizer.clone());

        #[cfg(feature = "native")]
        let normalizer = if config.normalizer.ocr_images && config.ocr.models_present() {
            match crate::ocr::PureOcrEngine::from_config(&config.ocr) {
                Ok(engine) => normalizer.with_ocr(Arc::new(engine)),
                Err(e) => {
                    tracing::warn!("OCR disabled: {}", e);
                    normalizer
                }
            }
        } else {
            normalizer
        };

        if config.normalizer.ocr_images && !normalizer.has_ocr() {
            info!(
                "No OCR models in {}, image attachments will not be read",
                config.ocr.model_dir.display()
            );
        }

        Self {
            normalizer,
            parser: HeuristicParser::new().with_date_config(config.dates.clone()),
        }
    }

    /// Use the given OCR engine for image attachments.
    pub fn with_ocr(mut self, ocr: Arc<dyn ImageOcr>) -> Self {
        self.normalizer = self.normalizer.with_ocr(ocr);
        self
    }

    /// Normalize a raw message and extract its items.
    pub fn process_bytes(&self, raw: &[u8], reference: Option<NaiveDateTime>) -> ProcessedMessage {
        let document = self.normalizer.normalize_bytes(raw);
        self.process_document(document, reference)
    }

    /// Extract items from an already normalized document.
    pub fn process_document(
        &self,
        document: Document,
        reference: Option<NaiveDateTime>,
    ) -> ProcessedMessage {
        let result = self.parser.parse(&document.body, reference);
        info!(
            "{:?}: {} with {} items",
            document.subject,
            result.category,
            result.items.len()
        );
        ProcessedMessage { document, result }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
