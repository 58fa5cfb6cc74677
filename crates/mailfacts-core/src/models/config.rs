//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MailfactsError, Result};

/// Main configuration for the mailfacts pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailfactsConfig {
    /// Message normalization configuration.
    pub normalizer: NormalizerConfig,

    /// Date extraction configuration.
    pub dates: DateConfig,

    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// Message normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Run OCR over image attachments.
    pub ocr_images: bool,

    /// Extract the text layer of PDF attachments.
    pub extract_pdf_text: bool,

    /// File extensions treated as images when content sniffing is inconclusive.
    pub image_extensions: Vec<String>,

    /// Attachments larger than this are not decoded.
    pub max_attachment_bytes: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            ocr_images: true,
            extract_pdf_text: true,
            image_extensions: ["png", "jpg", "jpeg", "tiff"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_attachment_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Interpretation of all-numeric dates such as `03/04/2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `MM/DD/YYYY`.
    #[default]
    MonthFirst,
    /// `DD/MM/YYYY`.
    DayFirst,
}

/// Date extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// Lines scanned unconditionally when no date-signal line resolves.
    pub fallback_line_limit: usize,

    /// Field order for ambiguous numeric dates.
    pub date_order: DateOrder,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            fallback_line_limit: 100,
            date_order: DateOrder::MonthFirst,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Whether the detection and recognition models exist on disk.
    pub fn models_present(&self) -> bool {
        self.model_dir.join(&self.detection_model).exists()
            && self.model_dir.join(&self.recognition_model).exists()
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of messages processed in parallel.
    pub jobs: usize,

    /// Per-message timeout covering attachment extraction.
    pub attachment_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            attachment_timeout_secs: 60,
        }
    }
}

impl MailfactsConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| MailfactsError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| MailfactsError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MailfactsConfig =
            serde_json::from_str(r#"{"dates": {"date_order": "day_first"}}"#).unwrap();

        assert_eq!(config.dates.date_order, DateOrder::DayFirst);
        assert_eq!(config.dates.fallback_line_limit, 100);
        assert!(config.normalizer.ocr_images);
        assert_eq!(config.batch.jobs, 4);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = MailfactsConfig::default();
        config.batch.attachment_timeout_secs = 5;
        config.save(&path).unwrap();

        let loaded = MailfactsConfig::from_file(&path).unwrap();
        assert_eq!(loaded.batch.attachment_timeout_secs, 5);
        assert_eq!(loaded.ocr.detection_model, "det.onnx");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = MailfactsConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, MailfactsError::Config(_)));
        assert!(err.to_string().starts_with("configuration error: "));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MailfactsConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, MailfactsError::Io(_)));
    }
}
