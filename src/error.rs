//! Error types for the page-transformation core
//!
//! Each failure family gets its own enum so callers can match on the family
//! they care about; [`Error`] wraps all of them for the dispatch layer.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to turn input bytes into a document
#[derive(Error, Debug)]
pub enum LoadError {
    /// The bytes are not a parsable PDF
    #[error("PDF is corrupt or unreadable: {0}")]
    Corrupt(String),

    /// The document is encrypted and no password (or a wrong one) was supplied
    #[error("PDF is password protected; a correct password is required")]
    PasswordRequired,

    /// Input exceeds the configured size limit
    #[error("file is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}

/// Failure to parse a page range expression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Empty or non-numeric token
    #[error("malformed page range {token:?}")]
    Malformed { token: String },

    /// A hyphenated range whose start is after its end, such as "5-3"
    #[error("page range {start}-{end} runs backwards")]
    InvalidRange { start: usize, end: usize },

    /// A page number that cannot address any page
    #[error("page {page} is outside the document (1-{page_count})")]
    OutOfBounds { page: usize, page_count: usize },
}

/// Operation-specific precondition failure
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("{tool} needs at least {required} input files, got {given}")]
    NotEnoughInputs {
        tool: &'static str,
        required: usize,
        given: usize,
    },

    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i64),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("page index {index} is out of range for a {page_count}-page document")]
    PageOutOfRange { index: usize, page_count: usize },

    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("no {0} is configured")]
    CollaboratorUnavailable(&'static str),

    /// An external engine (OCR, office conversion) reported an error
    #[error("{name} failed: {message}")]
    CollaboratorFailed { name: &'static str, message: String },

    #[error("operation cancelled")]
    Cancelled,

    /// The codec rejected a structural mutation
    #[error("PDF structure error: {0}")]
    Codec(#[from] lopdf::Error),
}

/// Failure to re-encode a document
#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("failed to write PDF: {0}")]
    Codec(#[from] lopdf::Error),

    #[error("IO error while writing PDF: {0}")]
    Io(#[from] std::io::Error),
}

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// A configuration file that is not valid JSON for [`ProcessingConfig`]
    ///
    /// [`ProcessingConfig`]: crate::config::ProcessingConfig
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable kind, suitable for API responses
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Load(LoadError::Corrupt(_)) => "load.corrupt",
            Error::Load(LoadError::PasswordRequired) => "load.password_required",
            Error::Load(LoadError::TooLarge { .. }) => "load.too_large",
            Error::Range(RangeError::Malformed { .. }) => "range.malformed",
            Error::Range(RangeError::InvalidRange { .. }) => "range.invalid_range",
            Error::Range(RangeError::OutOfBounds { .. }) => "range.out_of_bounds",
            Error::Transform(TransformError::Cancelled) => "transform.cancelled",
            Error::Transform(TransformError::CollaboratorUnavailable(_)) => "transform.unavailable",
            Error::Transform(_) => "transform",
            Error::Serialize(_) => "serialize",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}
