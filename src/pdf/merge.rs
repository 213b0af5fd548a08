//! PDF merging

use tracing::{debug, info};

use crate::config::ProcessingConfig;
use crate::error::{Result, TransformError};
use crate::pdf::{open, write, PdfDocument};
use crate::progress::Progress;

/// Concatenate the pages of every input, in the order given
///
/// Pages are imported into a fresh document, so nothing but the page
/// subgraphs of the inputs (content, resources, annotations) is carried
/// over. A single input yields a document with the same pages; the
/// two-file minimum of the merge tool is enforced by the dispatcher.
///
/// Progress advances once per input file.
///
/// # Example
///
/// ```no_run
/// use pdf_pages::config::ProcessingConfig;
/// use pdf_pages::pdf::merge;
/// use pdf_pages::progress::Progress;
///
/// let first = std::fs::read("1. intro.pdf").unwrap();
/// let second = std::fs::read("2. advanced.pdf").unwrap();
/// let merged = merge(&[first, second], &ProcessingConfig::default(), &mut Progress::none())
///     .expect("Failed to merge");
/// std::fs::write("merged.pdf", merged).unwrap();
/// ```
pub fn merge<B: AsRef<[u8]>>(
    inputs: &[B],
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    if inputs.is_empty() {
        return Err(TransformError::NotEnoughInputs { tool: "merge", required: 1, given: 0 }.into());
    }

    let mut merged = PdfDocument::new();

    for (file_index, input) in inputs.iter().enumerate() {
        progress.checkpoint()?;

        let source = open(input.as_ref(), config)?;
        let all_pages: Vec<usize> = (0..source.page_count()).collect();
        for handle in merged.copy_pages(&source, &all_pages)? {
            merged.add_page(handle)?;
        }
        debug!(file = file_index + 1, pages = all_pages.len(), "merged input");

        progress.advance(file_index + 1, inputs.len());
    }

    info!(files = inputs.len(), pages = merged.page_count(), "merge complete");
    write(merged, config, progress)
}
