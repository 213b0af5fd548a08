//! Structural compression
//!
//! Every level works on the object graph only. Image data is never decoded or
//! re-encoded, so scanned documents shrink little; [`CompressionReport`]
//! carries both sizes so callers can show what was actually gained.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ProcessingConfig;
use crate::error::Result;
use crate::pdf::{open, write, SerializeOptions};
use crate::progress::Progress;

/// How much restructuring to apply
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Flate-compress streams that have no filter
    Low,
    /// Also drop unreachable objects and empty streams
    #[default]
    Medium,
    /// Also renumber objects and pack them into object streams
    High,
}

/// Output of [`compress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionReport {
    pub bytes: Vec<u8>,
    pub original_size: usize,
    pub compressed_size: usize,
}

impl CompressionReport {
    /// Bytes saved; zero when the output grew
    pub fn saved(&self) -> usize {
        self.original_size.saturating_sub(self.compressed_size)
    }
}

pub fn compress(
    input: &[u8],
    level: CompressionLevel,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<CompressionReport> {
    let mut document = open(input, config)?;
    let lopdf = document.lopdf_mut();

    if level >= CompressionLevel::Medium {
        progress.checkpoint()?;
        let pruned = lopdf.prune_objects();
        let emptied = lopdf.delete_zero_length_streams();
        debug!(pruned = pruned.len(), emptied = emptied.len(), "removed dead objects");
    }
    progress.advance(1, 3);

    progress.checkpoint()?;
    lopdf.compress();
    progress.advance(2, 3);

    let bytes = if level == CompressionLevel::High {
        progress.checkpoint()?;
        lopdf.renumber_objects();
        let options = SerializeOptions { compact_object_streams: true, compression_level: 9 };
        let bytes = document.serialize(&options)?;
        progress.finish();
        bytes
    } else {
        write(document, config, progress)?
    };

    let report = CompressionReport {
        original_size: input.len(),
        compressed_size: bytes.len(),
        bytes,
    };
    info!(
        ?level,
        original = report.original_size,
        compressed = report.compressed_size,
        "compress complete"
    );
    Ok(report)
}
