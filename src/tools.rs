//! Dispatch table mapping tool names to transforms
//!
//! A [`ToolRequest`] is the JSON form of one tool invocation, as it would
//! arrive in an HTTP body: file payloads are base64 strings and the `tool`
//! field selects the variant.
//!
//! ```
//! use pdf_pages::tools::ToolRequest;
//!
//! let request: ToolRequest =
//!     serde_json::from_str(r#"{"tool": "split", "file": "JVBERg==", "ranges": "1-3"}"#).unwrap();
//! assert_eq!(request.name(), "split");
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collaborators::{
    OfficeConverter, ProcessingEvent, ProcessingLog, RecognitionProgress, TextRecognizer, TracingLog,
};
use crate::config::ProcessingConfig;
use crate::error::{Result, TransformError};
use crate::layout::Rect;
use crate::pdf::{
    self, CompressionLevel, OverlayEntry, RotateMode, TextEdit, WatermarkSpec,
};
use crate::progress::Progress;

/// Static description of one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    /// Suggested filename for the output
    pub output_name: &'static str,
    pub description: &'static str,
}

pub const TOOLS: &[ToolSpec] = &[
    ToolSpec { name: "merge", output_name: "merged.pdf", description: "Concatenate documents in order" },
    ToolSpec { name: "split", output_name: "split.pdf", description: "Extract pages by range expression" },
    ToolSpec { name: "organize", output_name: "organized.pdf", description: "Reorder pages by an explicit list" },
    ToolSpec { name: "rotate", output_name: "rotated.pdf", description: "Rotate every page" },
    ToolSpec { name: "watermark", output_name: "watermarked.pdf", description: "Stamp diagonal text on every page" },
    ToolSpec { name: "page-numbers", output_name: "numbered.pdf", description: "Number pages bottom right" },
    ToolSpec { name: "crop", output_name: "cropped.pdf", description: "Set one crop box on every page" },
    ToolSpec { name: "protect", output_name: "protected.pdf", description: "Encrypt with a password" },
    ToolSpec { name: "unlock", output_name: "unlocked.pdf", description: "Remove password encryption" },
    ToolSpec { name: "edit", output_name: "edited.pdf", description: "Overlay text at page positions" },
    ToolSpec { name: "redact", output_name: "redacted.pdf", description: "Cover areas with black boxes (visual only)" },
    ToolSpec { name: "sign", output_name: "signed.pdf", description: "Place a signature image" },
    ToolSpec { name: "pdfa", output_name: "pdfa.pdf", description: "Stamp archival metadata (not a conformance conversion)" },
    ToolSpec { name: "compress", output_name: "compressed.pdf", description: "Restructure and compress streams" },
    ToolSpec { name: "images-to-pdf", output_name: "images.pdf", description: "One page per JPEG or PNG image" },
    ToolSpec { name: "remove-pages", output_name: "pages-removed.pdf", description: "Delete pages by range expression" },
    ToolSpec { name: "info", output_name: "info.json", description: "Describe pages, encryption and metadata" },
    ToolSpec { name: "ocr", output_name: "ocr.txt", description: "Recognize text with the configured OCR engine" },
    ToolSpec { name: "office-to-pdf", output_name: "converted.pdf", description: "Convert an office document with the configured converter" },
];

/// Look up a tool by name
pub fn tool_spec(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|spec| spec.name == name)
}

fn default_language() -> String {
    "eng".to_string()
}

/// One tool invocation with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "kebab-case")]
pub enum ToolRequest {
    Merge {
        #[serde(with = "payload::list")]
        files: Vec<Vec<u8>>,
    },
    Split {
        #[serde(with = "payload")]
        file: Vec<u8>,
        ranges: String,
    },
    Organize {
        #[serde(with = "payload")]
        file: Vec<u8>,
        /// 1-based page numbers in the new order
        order: Vec<i64>,
    },
    Rotate {
        #[serde(with = "payload")]
        file: Vec<u8>,
        degrees: i64,
        #[serde(default)]
        mode: RotateMode,
    },
    Watermark {
        #[serde(with = "payload")]
        file: Vec<u8>,
        #[serde(flatten)]
        spec: WatermarkSpec,
    },
    PageNumbers {
        #[serde(with = "payload")]
        file: Vec<u8>,
    },
    Crop {
        #[serde(with = "payload")]
        file: Vec<u8>,
        rect: Rect,
    },
    Protect {
        #[serde(with = "payload")]
        file: Vec<u8>,
        password: String,
    },
    Unlock {
        #[serde(with = "payload")]
        file: Vec<u8>,
        password: String,
    },
    Edit {
        #[serde(with = "payload")]
        file: Vec<u8>,
        edits: Vec<TextEdit>,
    },
    Redact {
        #[serde(with = "payload")]
        file: Vec<u8>,
        entries: Vec<OverlayEntry>,
    },
    Sign {
        #[serde(with = "payload")]
        file: Vec<u8>,
        #[serde(with = "payload")]
        signature: Vec<u8>,
        placements: Vec<OverlayEntry>,
    },
    Pdfa {
        #[serde(with = "payload")]
        file: Vec<u8>,
        #[serde(default)]
        title: Option<String>,
    },
    Compress {
        #[serde(with = "payload")]
        file: Vec<u8>,
        #[serde(default)]
        level: CompressionLevel,
    },
    ImagesToPdf {
        #[serde(with = "payload::list")]
        images: Vec<Vec<u8>>,
    },
    RemovePages {
        #[serde(with = "payload")]
        file: Vec<u8>,
        pages: String,
    },
    Info {
        #[serde(with = "payload")]
        file: Vec<u8>,
    },
    Ocr {
        #[serde(with = "payload")]
        file: Vec<u8>,
        #[serde(default = "default_language")]
        language: String,
    },
    OfficeToPdf {
        #[serde(with = "payload")]
        file: Vec<u8>,
        filename: String,
    },
}

impl ToolRequest {
    /// The tool name, as used in the `tool` field and in [`TOOLS`]
    pub fn name(&self) -> &'static str {
        match self {
            ToolRequest::Merge { .. } => "merge",
            ToolRequest::Split { .. } => "split",
            ToolRequest::Organize { .. } => "organize",
            ToolRequest::Rotate { .. } => "rotate",
            ToolRequest::Watermark { .. } => "watermark",
            ToolRequest::PageNumbers { .. } => "page-numbers",
            ToolRequest::Crop { .. } => "crop",
            ToolRequest::Protect { .. } => "protect",
            ToolRequest::Unlock { .. } => "unlock",
            ToolRequest::Edit { .. } => "edit",
            ToolRequest::Redact { .. } => "redact",
            ToolRequest::Sign { .. } => "sign",
            ToolRequest::Pdfa { .. } => "pdfa",
            ToolRequest::Compress { .. } => "compress",
            ToolRequest::ImagesToPdf { .. } => "images-to-pdf",
            ToolRequest::RemovePages { .. } => "remove-pages",
            ToolRequest::Info { .. } => "info",
            ToolRequest::Ocr { .. } => "ocr",
            ToolRequest::OfficeToPdf { .. } => "office-to-pdf",
        }
    }

    /// Every file payload carried by the request
    pub fn inputs(&self) -> Vec<&[u8]> {
        match self {
            ToolRequest::Merge { files } => files.iter().map(Vec::as_slice).collect(),
            ToolRequest::ImagesToPdf { images } => images.iter().map(Vec::as_slice).collect(),
            ToolRequest::Sign { file, signature, .. } => vec![file.as_slice(), signature.as_slice()],
            ToolRequest::Split { file, .. }
            | ToolRequest::Organize { file, .. }
            | ToolRequest::Rotate { file, .. }
            | ToolRequest::Watermark { file, .. }
            | ToolRequest::PageNumbers { file }
            | ToolRequest::Crop { file, .. }
            | ToolRequest::Protect { file, .. }
            | ToolRequest::Unlock { file, .. }
            | ToolRequest::Edit { file, .. }
            | ToolRequest::Redact { file, .. }
            | ToolRequest::Pdfa { file, .. }
            | ToolRequest::Compress { file, .. }
            | ToolRequest::RemovePages { file, .. }
            | ToolRequest::Info { file }
            | ToolRequest::Ocr { file, .. }
            | ToolRequest::OfficeToPdf { file, .. } => vec![file.as_slice()],
        }
    }
}

/// Result of a dispatched tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub bytes: Vec<u8>,
    /// Suggested filename, from [`ToolSpec::output_name`]
    pub filename: String,
}

/// Everything a tool run needs besides its request
pub struct ToolContext<'a> {
    pub config: ProcessingConfig,
    pub progress: Progress<'a>,
    pub log: &'a dyn ProcessingLog,
    pub recognizer: Option<&'a dyn TextRecognizer>,
    pub converter: Option<&'a dyn OfficeConverter>,
}

impl<'a> ToolContext<'a> {
    /// No progress reporting, events go to `tracing`, no external engines
    pub fn new(config: ProcessingConfig) -> Self {
        Self {
            config,
            progress: Progress::none(),
            log: &TracingLog,
            recognizer: None,
            converter: None,
        }
    }

    pub fn with_progress(mut self, progress: Progress<'a>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_log(mut self, log: &'a dyn ProcessingLog) -> Self {
        self.log = log;
        self
    }

    pub fn with_recognizer(mut self, recognizer: &'a dyn TextRecognizer) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_converter(mut self, converter: &'a dyn OfficeConverter) -> Self {
        self.converter = Some(converter);
        self
    }
}

/// Run one tool and record a [`ProcessingEvent`] for it
///
/// Size limits are checked for every payload before any parsing starts.
pub fn dispatch(request: ToolRequest, context: &mut ToolContext<'_>) -> Result<ToolOutput> {
    let name = request.name();
    let file_size_bytes: u64 = request.inputs().iter().map(|input| input.len() as u64).sum();

    let result = run(request, context);

    match &result {
        Ok(output) => debug!(tool = name, bytes = output.bytes.len(), "tool succeeded"),
        Err(e) => warn!(tool = name, kind = e.kind(), error = %e, "tool failed"),
    }
    context.log.record(&ProcessingEvent {
        tool_name: name.to_string(),
        success: result.is_ok(),
        file_size_bytes,
    });
    result
}

fn run(request: ToolRequest, context: &mut ToolContext<'_>) -> Result<ToolOutput> {
    let name = request.name();
    for input in request.inputs() {
        context.config.check_size(input)?;
    }

    let ToolContext { config, progress, recognizer, converter, .. } = context;
    let config = &*config;

    let bytes = match request {
        ToolRequest::Merge { files } => {
            if files.len() < 2 {
                return Err(TransformError::NotEnoughInputs {
                    tool: "merge",
                    required: 2,
                    given: files.len(),
                }
                .into());
            }
            pdf::merge(&files, config, progress)?
        }
        ToolRequest::Split { file, ranges } => pdf::split(&file, &ranges, config, progress)?,
        ToolRequest::Organize { file, order } => pdf::organize(&file, &order, config, progress)?,
        ToolRequest::Rotate { file, degrees, mode } => pdf::rotate(&file, degrees, mode, config, progress)?,
        ToolRequest::Watermark { file, spec } => pdf::watermark(&file, &spec, config, progress)?,
        ToolRequest::PageNumbers { file } => pdf::page_numbers(&file, config, progress)?,
        ToolRequest::Crop { file, rect } => pdf::crop(&file, rect, config, progress)?,
        ToolRequest::Protect { file, password } => pdf::protect(&file, &password, config, progress)?,
        ToolRequest::Unlock { file, password } => pdf::unlock(&file, &password, config, progress)?,
        ToolRequest::Edit { file, edits } => pdf::edit(&file, &edits, config, progress)?,
        ToolRequest::Redact { file, entries } => pdf::redact(&file, &entries, config, progress)?,
        ToolRequest::Sign { file, signature, placements } => {
            pdf::sign(&file, &signature, &placements, config, progress)?
        }
        ToolRequest::Pdfa { file, title } => pdf::stamp_pdfa(&file, title.as_deref(), config, progress)?,
        ToolRequest::Compress { file, level } => pdf::compress(&file, level, config, progress)?.bytes,
        ToolRequest::ImagesToPdf { images } => pdf::images_to_pdf(&images, config, progress)?,
        ToolRequest::RemovePages { file, pages } => pdf::remove_pages(&file, &pages, config, progress)?,
        ToolRequest::Info { file } => {
            let summary = pdf::document_summary(&file, config)?;
            progress.finish();
            serde_json::to_vec_pretty(&summary).map_err(std::io::Error::from)?
        }
        ToolRequest::Ocr { file, language } => {
            let recognizer = (*recognizer).ok_or(TransformError::CollaboratorUnavailable("text recognizer"))?;
            progress.checkpoint()?;
            let text = recognizer
                .recognize(&file, &language, &mut |event: RecognitionProgress| progress.advance(event.percent.into(), 100))
                .map_err(|e| TransformError::CollaboratorFailed {
                    name: "text recognizer",
                    message: e.to_string(),
                })?;
            progress.finish();
            text.into_bytes()
        }
        ToolRequest::OfficeToPdf { file, filename } => {
            let converter = (*converter).ok_or(TransformError::CollaboratorUnavailable("office converter"))?;
            progress.checkpoint()?;
            let converted = converter.convert(&file, &filename).map_err(|e| {
                TransformError::CollaboratorFailed { name: "office converter", message: e.to_string() }
            })?;
            progress.finish();
            converted
        }
    };

    let filename = tool_spec(name).map_or("output.pdf", |spec| spec.output_name).to_string();
    Ok(ToolOutput { bytes, filename })
}

/// Base64 (standard alphabet) encoding for file payloads
mod payload {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.trim()).map_err(serde::de::Error::custom)
    }

    pub mod list {
        use super::STANDARD;
        use base64::Engine;
        use serde::ser::SerializeSeq;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(files: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(files.len()))?;
            for file in files {
                seq.serialize_element(&STANDARD.encode(file))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
            Vec::<String>::deserialize(deserializer)?
                .iter()
                .map(|text| STANDARD.decode(text.trim()).map_err(serde::de::Error::custom))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollaboratorError;
    use crate::error::{Error, LoadError};
    use crate::pdf::document::tests::{sample_bytes, widths};
    use crate::pdf::{LoadOptions, PdfDocument};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryLog(RefCell<Vec<ProcessingEvent>>);

    impl ProcessingLog for MemoryLog {
        fn record(&self, event: &ProcessingEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    struct FixedText;

    impl TextRecognizer for FixedText {
        fn recognize(
            &self,
            _input: &[u8],
            language: &str,
            on_progress: &mut dyn FnMut(RecognitionProgress),
        ) -> std::result::Result<String, CollaboratorError> {
            on_progress(RecognitionProgress { page: 0, confidence: 91.0, percent: 50 });
            Ok(format!("hello ({language})"))
        }
    }

    struct FailingConverter;

    impl OfficeConverter for FailingConverter {
        fn convert(&self, _input: &[u8], _filename: &str) -> std::result::Result<Vec<u8>, CollaboratorError> {
            Err("converter crashed".into())
        }
    }

    fn load(bytes: &[u8]) -> PdfDocument {
        PdfDocument::load(bytes, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_every_request_is_listed() {
        let file = sample_bytes(&[100.0]);
        let requests = [
            ToolRequest::Merge { files: vec![file.clone()] },
            ToolRequest::PageNumbers { file: file.clone() },
            ToolRequest::ImagesToPdf { images: vec![] },
            ToolRequest::RemovePages { file: file.clone(), pages: "1".to_string() },
            ToolRequest::OfficeToPdf { file, filename: "a.docx".to_string() },
        ];
        for request in &requests {
            let spec = tool_spec(request.name()).unwrap();
            let json = serde_json::to_value(request).unwrap();
            assert_eq!(json["tool"], spec.name);
        }
        assert_eq!(TOOLS.len(), 19);
    }

    #[test]
    fn test_json_request_round_trip() {
        let file = sample_bytes(&[100.0, 200.0, 300.0]);
        let json = format!(
            r#"{{"tool": "split", "file": "{}", "ranges": "1,3"}}"#,
            STANDARD.encode(&file)
        );
        let request: ToolRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, ToolRequest::Split { file, ranges: "1,3".to_string() });

        let output = dispatch(request, &mut ToolContext::new(ProcessingConfig::default())).unwrap();
        assert_eq!(output.filename, "split.pdf");
        assert_eq!(widths(&load(&output.bytes)), vec![100.0, 300.0]);
    }

    #[test]
    fn test_watermark_request_flattens_spec() {
        let json = r#"{"tool": "watermark", "file": "JVBERg==", "text": "DRAFT"}"#;
        let request: ToolRequest = serde_json::from_str(json).unwrap();
        match request {
            ToolRequest::Watermark { spec, .. } => {
                assert_eq!(spec.text, "DRAFT");
                assert_eq!(spec.opacity, 0.3);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let json = r#"{"tool": "info", "file": "not base64!"}"#;
        assert!(serde_json::from_str::<ToolRequest>(json).is_err());
    }

    #[test]
    fn test_merge_needs_two_files() {
        let log = MemoryLog::default();
        let mut context = ToolContext::new(ProcessingConfig::default()).with_log(&log);
        let request = ToolRequest::Merge { files: vec![sample_bytes(&[100.0])] };

        let result = dispatch(request, &mut context);
        assert!(matches!(
            result,
            Err(Error::Transform(TransformError::NotEnoughInputs { required: 2, given: 1, .. }))
        ));
        let events = log.0.borrow();
        assert_eq!(events.len(), 1);
        assert!(!events[0].success);
    }

    #[test]
    fn test_one_event_per_successful_call() {
        let log = MemoryLog::default();
        let mut context = ToolContext::new(ProcessingConfig::default()).with_log(&log);
        let a = sample_bytes(&[100.0]);
        let b = sample_bytes(&[200.0]);
        let total = (a.len() + b.len()) as u64;

        let output = dispatch(ToolRequest::Merge { files: vec![a, b] }, &mut context).unwrap();
        assert_eq!(output.filename, "merged.pdf");
        assert_eq!(
            log.0.borrow().as_slice(),
            &[ProcessingEvent { tool_name: "merge".to_string(), success: true, file_size_bytes: total }]
        );
    }

    #[test]
    fn test_size_limit_checked_before_parsing() {
        let config = ProcessingConfig { max_file_size_bytes: 10, ..Default::default() };
        let request = ToolRequest::Info { file: vec![0; 11] };
        let result = dispatch(request, &mut ToolContext::new(config));
        assert!(matches!(result, Err(Error::Load(LoadError::TooLarge { size: 11, limit: 10 }))));
    }

    #[test]
    fn test_info_returns_json() {
        let request = ToolRequest::Info { file: sample_bytes(&[100.0, 200.0]) };
        let output = dispatch(request, &mut ToolContext::new(ProcessingConfig::default())).unwrap();
        assert_eq!(output.filename, "info.json");
        let json: serde_json::Value = serde_json::from_slice(&output.bytes).unwrap();
        assert_eq!(json["page_count"], 2);
    }

    #[test]
    fn test_ocr_without_engine_is_unavailable() {
        let request = ToolRequest::Ocr { file: vec![1, 2, 3], language: "eng".to_string() };
        let result = dispatch(request, &mut ToolContext::new(ProcessingConfig::default()));
        assert!(matches!(
            result,
            Err(Error::Transform(TransformError::CollaboratorUnavailable(_)))
        ));
    }

    #[test]
    fn test_ocr_delegates_to_engine() {
        let mut seen = Vec::new();
        let output = {
            let mut context = ToolContext::new(ProcessingConfig::default())
                .with_recognizer(&FixedText)
                .with_progress(Progress::new(|percent| seen.push(percent)));
            let request = ToolRequest::Ocr { file: vec![1, 2, 3], language: "deu".to_string() };
            dispatch(request, &mut context).unwrap()
        };
        assert_eq!(output.bytes, b"hello (deu)");
        assert_eq!(output.filename, "ocr.txt");
        assert_eq!(seen, vec![50, 100]);
    }

    #[test]
    fn test_converter_failure_is_reported() {
        let mut context = ToolContext::new(ProcessingConfig::default()).with_converter(&FailingConverter);
        let request = ToolRequest::OfficeToPdf { file: vec![1], filename: "a.docx".to_string() };
        match dispatch(request, &mut context) {
            Err(Error::Transform(TransformError::CollaboratorFailed { message, .. })) => {
                assert_eq!(message, "converter crashed");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
