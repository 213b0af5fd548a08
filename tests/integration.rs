//! Integration tests for the PDF pages library

use pdf_pages::layout::PageSize;
use pdf_pages::pdf::{
    merge, organize, protect, rotate, split, unlock, watermark, LoadOptions, PdfDocument,
    RotateMode, SerializeOptions, TextDraw, WatermarkSpec,
};
use pdf_pages::range;
use pdf_pages::tools::tool_spec;
use pdf_pages::error::TransformError;
use pdf_pages::{dispatch, CancelToken, Error, ProcessingConfig, Progress, ToolContext, ToolRequest};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::TempDir;

/// Build a document with one labelled page per size
fn build_pdf(sizes: &[(f32, f32)]) -> Vec<u8> {
    let mut document = PdfDocument::new();
    for (number, &(width, height)) in sizes.iter().enumerate() {
        let index = document.add_blank_page(PageSize::new(width, height)).unwrap();
        let label = format!("source page {}", number + 1);
        document.draw_text(index, &TextDraw::new(label, 72.0, 72.0, 12.0)).unwrap();
    }
    document.serialize(&SerializeOptions::default()).unwrap()
}

fn open(bytes: &[u8]) -> PdfDocument {
    PdfDocument::load(bytes, &LoadOptions::default()).unwrap()
}

fn sizes(bytes: &[u8]) -> Vec<(f32, f32)> {
    let document = open(bytes);
    (0..document.page_count())
        .map(|index| {
            let size = document.page_size(index).unwrap();
            (size.width, size.height)
        })
        .collect()
}

/// Which source page each output page came from, by its label
fn labels(bytes: &[u8]) -> Vec<String> {
    let document = open(bytes);
    (0..document.page_count())
        .map(|index| {
            let content = String::from_utf8_lossy(&document.page_content(index).unwrap()).into_owned();
            let start = content.find("(source page ").unwrap() + 1;
            let end = start + content[start..].find(')').unwrap();
            content[start..end].to_string()
        })
        .collect()
}

fn five_pages() -> Vec<u8> {
    build_pdf(&[(100.0, 792.0), (200.0, 792.0), (300.0, 792.0), (400.0, 792.0), (500.0, 792.0)])
}

fn config() -> ProcessingConfig {
    ProcessingConfig::default()
}

proptest! {
    #[test]
    fn prop_range_yields_sequential_indices(a in 1usize..60, len in 0usize..60) {
        let b = a + len;
        let indices = range::parse(&format!("{}-{}", a, b), b).unwrap();
        let expected: Vec<usize> = (a - 1..b).collect();
        prop_assert_eq!(indices, expected);
    }
}

#[test]
fn test_merge_singleton_is_identity() {
    let input = build_pdf(&[(612.0, 792.0), (595.0, 842.0)]);
    let output = merge(&[&input], &config(), &mut Progress::none()).unwrap();
    assert_eq!(sizes(&output), sizes(&input));
    assert_eq!(labels(&output), labels(&input));
}

#[test]
fn test_merge_two_letter_documents() {
    let a = build_pdf(&[(612.0, 792.0)]);
    let b = build_pdf(&[(612.0, 792.0)]);
    let output = merge(&[a, b], &config(), &mut Progress::none()).unwrap();

    assert_eq!(sizes(&output), vec![(612.0, 792.0), (612.0, 792.0)]);
    assert_eq!(open(&output).page_count(), 2);
}

#[test]
fn test_merge_preserves_input_order() {
    let a = build_pdf(&[(300.0, 300.0)]);
    let b = build_pdf(&[(100.0, 100.0), (200.0, 200.0)]);
    let output = merge(&[b, a], &config(), &mut Progress::none()).unwrap();
    assert_eq!(sizes(&output), vec![(100.0, 100.0), (200.0, 200.0), (300.0, 300.0)]);
}

#[test]
fn test_full_range_split_is_identity() {
    let input = five_pages();
    let output = split(&input, "1-5", &config(), &mut Progress::none()).unwrap();
    assert_eq!(sizes(&output), sizes(&input));
    assert_eq!(labels(&output), labels(&input));
}

#[test]
fn test_split_selected_pages() {
    let output = split(&five_pages(), "1,3-5", &config(), &mut Progress::none()).unwrap();
    assert_eq!(
        labels(&output),
        vec!["source page 1", "source page 3", "source page 4", "source page 5"]
    );
}

#[test]
fn test_split_out_of_bounds_yields_empty_document() {
    let output = split(&five_pages(), "7", &config(), &mut Progress::none()).unwrap();
    assert_eq!(open(&output).page_count(), 0);
}

#[test]
fn test_four_quarter_turns_restore_rotation() {
    let input = five_pages();
    let mut current = input.clone();
    for _ in 0..4 {
        current = rotate(&current, 90, RotateMode::Relative, &config(), &mut Progress::none()).unwrap();
    }
    let document = open(&current);
    for index in 0..document.page_count() {
        assert_eq!(document.rotation(index).unwrap(), 0);
    }
    assert_eq!(sizes(&current), sizes(&input));
}

#[test]
fn test_organize_identity_order() {
    let input = five_pages();
    let output = organize(&input, &[1, 2, 3, 4, 5], &config(), &mut Progress::none()).unwrap();
    assert_eq!(labels(&output), labels(&input));
}

#[test]
fn test_organize_reorders_and_duplicates() {
    let output = organize(&five_pages(), &[5, 0, 1, 9, 1], &config(), &mut Progress::none()).unwrap();
    assert_eq!(labels(&output), vec!["source page 5", "source page 1", "source page 1"]);
}

#[test]
fn test_protect_unlock_round_trip() {
    let input = five_pages();
    let protected = protect(&input, "pw", &config(), &mut Progress::none()).unwrap();
    assert!(matches!(
        PdfDocument::load(&protected, &LoadOptions::default()),
        Err(pdf_pages::error::LoadError::PasswordRequired)
    ));

    let unlocked = unlock(&protected, "pw", &config(), &mut Progress::none()).unwrap();
    let document = open(&unlocked);
    assert!(!document.is_encrypted());
    assert_eq!(document.page_count(), 5);
    assert_eq!(labels(&unlocked), labels(&input));
}

#[test]
fn test_watermark_draws_once_per_page() {
    let input = build_pdf(&[(612.0, 792.0), (612.0, 792.0)]);
    let spec = WatermarkSpec { text: "DRAFT".to_string(), opacity: 0.4 };
    let output = watermark(&input, &spec, &config(), &mut Progress::none()).unwrap();

    let document = open(&output);
    assert_eq!(document.page_count(), 2);
    for index in 0..2 {
        let content = String::from_utf8_lossy(&document.page_content(index).unwrap()).into_owned();
        // The label plus exactly one watermark
        assert_eq!(content.matches(" Tj").count(), 2);
        assert_eq!(content.matches("(DRAFT) Tj").count(), 1);
        assert_eq!(content.matches("/PPGs40 gs").count(), 1);
        assert!(content.contains("0.7071 -0.7071 0.7071 0.7071"));
    }
}

#[test]
fn test_malformed_input_is_fatal() {
    let result = split(b"not a pdf", "1", &config(), &mut Progress::none());
    assert!(matches!(result, Err(Error::Load(_))));
}

#[test]
fn test_dispatch_from_json_file() {
    let dir = TempDir::new().unwrap();
    let request_path = dir.path().join("request.json");
    let request = ToolRequest::RemovePages { file: five_pages(), pages: "2-4".to_string() };
    std::fs::write(&request_path, serde_json::to_string(&request).unwrap()).unwrap();

    let text = std::fs::read_to_string(&request_path).unwrap();
    let request: ToolRequest = serde_json::from_str(&text).unwrap();
    let output = dispatch(request, &mut ToolContext::new(config())).unwrap();

    assert_eq!(output.filename, tool_spec("remove-pages").unwrap().output_name);
    let output_path = dir.path().join(&output.filename);
    std::fs::write(&output_path, &output.bytes).unwrap();

    let written = std::fs::read(&output_path).unwrap();
    assert_eq!(labels(&written), vec!["source page 1", "source page 5"]);
}

#[test]
fn test_dispatch_reports_progress_to_completion() {
    let mut seen = Vec::new();
    {
        let mut context =
            ToolContext::new(config()).with_progress(Progress::new(|percent| seen.push(percent)));
        let request = ToolRequest::Split { file: five_pages(), ranges: "1-4".to_string() };
        dispatch(request, &mut context).unwrap();
    }
    assert_eq!(seen, vec![25, 50, 75, 100]);
}

#[test]
fn test_rotate_cancelled_after_first_page_returns_nothing() {
    let token = CancelToken::new();
    let trigger = token.clone();
    let mut reports = 0;
    let result = {
        let progress = Progress::new(|_| {
            reports += 1;
            trigger.cancel();
        })
        .with_cancel(token);
        let mut context = ToolContext::new(config()).with_progress(progress);
        let request = ToolRequest::Rotate { file: five_pages(), degrees: 90, mode: RotateMode::Relative };
        dispatch(request, &mut context)
    };

    assert!(matches!(result, Err(Error::Transform(TransformError::Cancelled))));
    assert_eq!(reports, 1);
}
