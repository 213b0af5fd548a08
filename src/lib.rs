//! PDF Pages Library
//!
//! Page-level transformations over PDF documents, built on `lopdf`.
//! This library provides functionality to:
//! - Merge, split, reorder and remove pages
//! - Rotate and crop pages
//! - Overlay watermarks, page numbers, text edits, redaction boxes and signatures
//! - Protect documents with a password and unlock them again
//! - Stamp metadata, compress, and build documents from images
//!
//! Every operation takes input bytes and returns output bytes; nothing is
//! written to disk and no partial output is returned on failure.
//!
//! # Example
//!
//! ```no_run
//! use pdf_pages::pdf::split;
//! use pdf_pages::{Progress, ProcessingConfig};
//!
//! let input = std::fs::read("input.pdf")?;
//! let output = split(&input, "1,3-5", &ProcessingConfig::default(), &mut Progress::none())?;
//! std::fs::write("split.pdf", output)?;
//! # Ok::<(), pdf_pages::Error>(())
//! ```

pub mod collaborators;
pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod progress;
pub mod range;
pub mod tools;

// Re-export commonly used items
pub use config::ProcessingConfig;
pub use error::{Error, Result};
pub use progress::{CancelToken, Progress};
pub use tools::{dispatch, ToolContext, ToolOutput, ToolRequest};
