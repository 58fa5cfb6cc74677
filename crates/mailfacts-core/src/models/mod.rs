//! Data models for documents, extraction output and configuration.

pub mod config;
pub mod document;
