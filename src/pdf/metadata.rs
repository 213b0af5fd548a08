//! Document metadata: PDF/A-style stamping and summaries

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ProcessingConfig;
use crate::error::Result;
use crate::pdf::document::pdf_date;
use crate::pdf::{open, write, DocumentInfo, LoadOptions, PdfDocument};
use crate::progress::Progress;

/// Title written when neither the caller nor the document provides one
pub const UNTITLED: &str = "Untitled";

/// Creator written by [`stamp_pdfa`]
pub const CREATOR: &str = "pdf-pages";

/// Stamp archival metadata into the information dictionary
///
/// Sets title, creator, producer and modification date (and the creation date
/// when it is missing). This only touches metadata: fonts are not embedded,
/// no XMP packet or output intent is added, and transparency is left as is.
/// The result is **not** a conforming PDF/A file.
pub fn stamp_pdfa(
    input: &[u8],
    title: Option<&str>,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    let mut document = open(input, config)?;
    progress.checkpoint()?;

    let existing = document.info();
    let now = pdf_date(Utc::now());
    let title = title
        .filter(|title| !title.trim().is_empty())
        .map(str::to_string)
        .or(existing.title)
        .unwrap_or_else(|| UNTITLED.to_string());
    debug!(%title, "stamping metadata");

    document.set_info(&DocumentInfo {
        title: Some(title),
        creator: Some(CREATOR.to_string()),
        producer: Some(config.producer.clone()),
        creation_date: existing.creation_date.or_else(|| Some(now.clone())),
        mod_date: Some(now),
        ..DocumentInfo::default()
    });
    progress.advance(1, 1);

    info!(pages = document.page_count(), "pdfa stamp complete");
    write(document, config, progress)
}

/// Size and rotation of one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub width: f32,
    pub height: f32,
    pub rotation: i64,
}

/// What the `info` tool reports about a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub version: String,
    pub encrypted: bool,
    pub page_count: usize,
    pub pages: Vec<PageSummary>,
    pub info: DocumentInfo,
}

/// Describe a document without modifying it
///
/// Encrypted documents are accepted; without the password only the version
/// and the encryption flag are known, so pages and metadata come back empty.
pub fn document_summary(input: &[u8], config: &ProcessingConfig) -> Result<DocumentSummary> {
    config.check_size(input)?;
    let options = LoadOptions { password: None, ignore_encryption: true };
    let document = PdfDocument::load(input, &options)?;
    Ok(summarize(&document))
}

fn summarize(document: &PdfDocument) -> DocumentSummary {
    let lopdf = document.lopdf();
    let encrypted = document.is_encrypted();
    if encrypted {
        return DocumentSummary {
            version: lopdf.version.clone(),
            encrypted,
            page_count: 0,
            pages: Vec::new(),
            info: DocumentInfo::default(),
        };
    }

    let pages = (0..document.page_count())
        .filter_map(|index| {
            let size = document.page_size(index).ok()?;
            Some(PageSummary {
                width: size.width,
                height: size.height,
                rotation: document.rotation(index).unwrap_or(0),
            })
        })
        .collect::<Vec<_>>();

    DocumentSummary {
        version: lopdf.version.clone(),
        encrypted,
        page_count: pages.len(),
        pages,
        info: document.info(),
    }
}
