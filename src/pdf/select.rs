//! Page selection: split, organize and remove

use tracing::{info, warn};

use crate::config::ProcessingConfig;
use crate::error::{Result, TransformError};
use crate::pdf::{open, write, PdfDocument};
use crate::progress::Progress;
use crate::range;

/// Copy `indices` of `source` into a new document, in that order
fn extract(
    source: &PdfDocument,
    indices: &[usize],
    progress: &mut Progress<'_>,
) -> Result<PdfDocument> {
    let mut output = PdfDocument::new();
    let handles = output.copy_pages(source, indices)?;
    let total = handles.len();

    for (done, handle) in handles.into_iter().enumerate() {
        progress.checkpoint()?;
        output.add_page(handle)?;
        progress.advance(done + 1, total);
    }
    Ok(output)
}

/// Extract the pages named by a range expression such as `"1,3-5"`
///
/// Pages are emitted in expression order, repeats included. Page numbers past
/// the end of the document are dropped with a warning, so `"7"` on a 5-page
/// document yields an empty document rather than an error.
pub fn split(
    input: &[u8],
    ranges: &str,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    let source = open(input, config)?;
    let page_count = source.page_count();

    let requested = range::parse(ranges, page_count)?;
    let indices = range::in_bounds(&requested, page_count);
    if indices.len() < requested.len() {
        warn!(
            dropped = requested.len() - indices.len(),
            page_count, "ignoring out-of-range pages"
        );
    }

    let output = extract(&source, &indices, progress)?;
    info!(pages = indices.len(), "split complete");
    write(output, config, progress)
}

/// Rebuild the document in an explicit 1-based page order
///
/// Entries that do not address a page (`<= 0` or beyond the page count) are
/// skipped; a page listed twice appears twice.
pub fn organize(
    input: &[u8],
    order: &[i64],
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    let source = open(input, config)?;
    let page_count = source.page_count();

    let indices = range::from_page_numbers(order, page_count);
    if indices.len() < order.len() {
        warn!(skipped = order.len() - indices.len(), page_count, "ignoring invalid page numbers");
    }

    let output = extract(&source, &indices, progress)?;
    info!(pages = indices.len(), "organize complete");
    write(output, config, progress)
}

/// Delete the pages named by a range expression
///
/// Unlike [`split`], every page number must exist. Removing every page is
/// refused because the result would not be a usable document.
pub fn remove_pages(
    input: &[u8],
    ranges: &str,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    let mut document = open(input, config)?;
    let page_count = document.page_count();

    let mut indices = range::parse_strict(ranges, page_count)?;
    indices.sort_unstable();
    indices.dedup();

    if indices.len() == page_count {
        return Err(TransformError::InvalidParameter {
            name: "pages",
            reason: "cannot remove every page of the document".to_string(),
        }
        .into());
    }

    // Back to front so earlier indices stay valid
    let total = indices.len();
    for (done, &index) in indices.iter().rev().enumerate() {
        progress.checkpoint()?;
        document.remove_page(index)?;
        progress.advance(done + 1, total);
    }

    info!(removed = total, remaining = document.page_count(), "remove pages complete");
    write(document, config, progress)
}
