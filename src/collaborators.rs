//! External engines the transforms delegate to
//!
//! OCR and office-document conversion are not implemented here. Hosts plug
//! their own engines in through [`TextRecognizer`] and [`OfficeConverter`],
//! and receive one [`ProcessingEvent`] per tool run through [`ProcessingLog`].

use serde::Serialize;
use tracing::info;

/// Error type returned by external engines
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one tool run, reported after the fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingEvent {
    pub tool_name: String,
    pub success: bool,
    /// Total size of the inputs
    pub file_size_bytes: u64,
}

/// Sink for processing events
///
/// Recording is fire-and-forget: implementations swallow their own failures.
pub trait ProcessingLog {
    fn record(&self, event: &ProcessingEvent);
}

/// Writes events to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl ProcessingLog for TracingLog {
    fn record(&self, event: &ProcessingEvent) {
        info!(
            tool = %event.tool_name,
            success = event.success,
            bytes = event.file_size_bytes,
            "processing event"
        );
    }
}

/// Per-page report from a text recognizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognitionProgress {
    /// 0-based page being recognized
    pub page: usize,
    /// Engine confidence for the page, 0 to 100
    pub confidence: f32,
    /// Overall progress, 0 to 100
    pub percent: u8,
}

/// OCR engine: document or image bytes plus a language code in, plain text out
pub trait TextRecognizer {
    fn recognize(
        &self,
        input: &[u8],
        language: &str,
        on_progress: &mut dyn FnMut(RecognitionProgress),
    ) -> Result<String, CollaboratorError>;
}

/// Office document to PDF converter, treated as a black box
pub trait OfficeConverter {
    fn convert(&self, input: &[u8], filename: &str) -> Result<Vec<u8>, CollaboratorError>;
}
