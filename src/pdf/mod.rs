//! PDF document adapter and the per-tool transformations built on it

pub mod compress;
pub mod document;
pub mod geometry;
pub mod images;
pub mod merge;
pub mod metadata;
pub mod overlay;
pub mod security;
pub mod select;
pub mod stamp;

// Re-export commonly used items
pub use compress::{compress, CompressionLevel, CompressionReport};
pub use document::{
    DocumentInfo, EncryptOptions, ImageRef, LoadOptions, PageHandle, PdfDocument,
    SerializeOptions,
};
pub use geometry::{crop, rotate, RotateMode};
pub use images::{images_to_pdf, EmbeddedImage};
pub use merge::merge;
pub use metadata::{document_summary, stamp_pdfa, DocumentSummary, PageSummary};
pub use overlay::TextDraw;
pub use security::{protect, unlock};
pub use select::{organize, remove_pages, split};
pub use stamp::{edit, page_numbers, redact, sign, watermark, OverlayEntry, TextEdit, WatermarkSpec};

use crate::config::ProcessingConfig;
use crate::error::Result;
use crate::progress::Progress;

/// Size-check and parse an input for a transform
pub(crate) fn open(bytes: &[u8], config: &ProcessingConfig) -> Result<PdfDocument> {
    config.check_size(bytes)?;
    Ok(PdfDocument::load(bytes, &LoadOptions::default())?)
}

/// Serialize a transform's result and report completion
pub(crate) fn write(
    mut document: PdfDocument,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    let bytes = document.serialize(&config.serialize_options())?;
    progress.finish();
    Ok(bytes)
}
