//! Processing configuration passed into every tool call

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, LoadError, Result};
use crate::pdf::SerializeOptions;

/// Default upload limit: 100 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Settings that apply to every operation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Inputs larger than this are rejected before parsing
    pub max_file_size_bytes: u64,
    /// Pack objects into object streams when saving (smaller, less compatible)
    pub compact_object_streams: bool,
    /// Producer string written by metadata stamping
    pub producer: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
            compact_object_streams: false,
            producer: "pdf-pages".to_string(),
        }
    }
}

impl ProcessingConfig {
    /// Load configuration from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Serialization settings for transform output
    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            compact_object_streams: self.compact_object_streams,
            ..SerializeOptions::default()
        }
    }

    /// Reject inputs above the size limit
    pub fn check_size(&self, bytes: &[u8]) -> std::result::Result<(), LoadError> {
        let size = bytes.len() as u64;
        if size > self.max_file_size_bytes {
            return Err(LoadError::TooLarge { size, limit: self.max_file_size_bytes });
        }
        Ok(())
    }
}
