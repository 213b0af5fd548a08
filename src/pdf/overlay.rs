//! Content-stream snippets drawn on top of existing page content
//!
//! Overlays never rewrite a page's original streams. New streams are appended
//! to `/Contents`, and the original content is bracketed by a `q`/`Q` pair so
//! any transformation it leaves behind cannot leak into what we draw.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::layout::Rect;

/// Resource name of the overlay font in page `/Font` dictionaries
pub const FONT_RESOURCE: &str = "PPHelv";

/// A single run of text to draw on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDraw {
    pub text: String,
    /// Baseline origin, page-local, bottom-left origin
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    /// 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f32,
    /// Counter-clockwise angle of the baseline in degrees
    pub angle: f32,
    /// Fill gray level, 0.0 black to 1.0 white
    pub gray: f32,
}

impl TextDraw {
    /// Opaque black horizontal text
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size,
            opacity: 1.0,
            angle: 0.0,
            gray: 0.0,
        }
    }
}

/// Resource name of the graphics state carrying a given opacity
pub fn opacity_resource(opacity: f32) -> String {
    format!("PPGs{}", (opacity.clamp(0.0, 1.0) * 100.0).round() as u32)
}

/// `ExtGState` dictionary applying the same alpha to strokes and fills
pub fn opacity_state(opacity: f32) -> Dictionary {
    let alpha = opacity.clamp(0.0, 1.0);
    let mut state = Dictionary::new();
    state.set("Type", Object::Name(b"ExtGState".to_vec()));
    state.set("CA", Object::Real(alpha));
    state.set("ca", Object::Real(alpha));
    state
}

/// Standard Helvetica with WinAnsiEncoding (one of the 14 base fonts, never embedded)
pub fn helvetica_font() -> Dictionary {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font
}

/// Content stream drawing one text run
pub fn text_content(draw: &TextDraw) -> String {
    let (sin, cos) = draw.angle.to_radians().sin_cos();
    let mut content = String::from("q\n");

    if draw.opacity < 1.0 {
        content.push_str(&format!("/{} gs\n", opacity_resource(draw.opacity)));
    }
    content.push_str(&format!("{} g\n", fmt_num(draw.gray.clamp(0.0, 1.0))));
    content.push_str("BT\n");
    content.push_str(&format!("/{} {} Tf\n", FONT_RESOURCE, fmt_num(draw.font_size)));
    content.push_str(&format!(
        "{} {} {} {} {} {} Tm\n",
        fmt_num(cos),
        fmt_num(sin),
        fmt_num(-sin),
        fmt_num(cos),
        fmt_num(draw.x),
        fmt_num(draw.y)
    ));
    content.push_str(&format!("({}) Tj\n", escape_pdf_string(&draw.text)));
    content.push_str("ET\nQ\n");
    content
}

/// Content stream filling a rectangle with a gray level
pub fn rect_content(rect: &Rect, gray: f32) -> String {
    format!(
        "q\n{} g\n{} {} {} {} re\nf\nQ\n",
        fmt_num(gray.clamp(0.0, 1.0)),
        fmt_num(rect.x),
        fmt_num(rect.y),
        fmt_num(rect.width),
        fmt_num(rect.height)
    )
}

/// Content stream painting an image XObject into a rectangle
pub fn image_content(name: &str, rect: &Rect) -> String {
    format!(
        "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
        fmt_num(rect.width),
        fmt_num(rect.height),
        fmt_num(rect.x),
        fmt_num(rect.y),
        name
    )
}

/// Escape text for a PDF literal string in WinAnsiEncoding
///
/// Characters outside Latin-1 have no WinAnsi code and become `?`.
/// Non-printable bytes are written as octal escapes.
pub fn escape_pdf_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        let byte = match u32::from(ch) {
            code @ 0..=0xFF => code as u8,
            _ => b'?',
        };
        match byte {
            b'\\' => escaped.push_str("\\\\"),
            b'(' => escaped.push_str("\\("),
            b')' => escaped.push_str("\\)"),
            0x20..=0x7E => escaped.push(byte as char),
            _ => escaped.push_str(&format!("\\{:03o}", byte)),
        }
    }
    escaped
}

/// Format a number without exponent notation and without trailing zeros
fn fmt_num(value: f32) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Append a content stream to a page's Contents
///
/// The new stream runs after the original content so it is drawn on top.
pub fn append_content_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    new_content_id: ObjectId,
) -> Result<(), TransformError> {
    let page_dict = doc.get_dictionary_mut(page_id)?;
    let existing_content = page_dict.get(b"Contents").ok().cloned();

    match existing_content {
        Some(Object::Reference(content_id)) => {
            page_dict.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(content_id),
                    Object::Reference(new_content_id),
                ]),
            );
        }
        Some(Object::Array(mut content_array)) => {
            content_array.push(Object::Reference(new_content_id));
            page_dict.set("Contents", Object::Array(content_array));
        }
        _ => {
            page_dict.set("Contents", Object::Array(vec![Object::Reference(new_content_id)]));
        }
    }

    Ok(())
}

/// Prepend a content stream to a page's Contents
fn prepend_content_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    new_content_id: ObjectId,
) -> Result<(), TransformError> {
    let page_dict = doc.get_dictionary_mut(page_id)?;
    let existing_content = page_dict.get(b"Contents").ok().cloned();

    match existing_content {
        Some(Object::Reference(content_id)) => {
            page_dict.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(new_content_id),
                    Object::Reference(content_id),
                ]),
            );
        }
        Some(Object::Array(mut content_array)) => {
            content_array.insert(0, Object::Reference(new_content_id));
            page_dict.set("Contents", Object::Array(content_array));
        }
        _ => {
            page_dict.set("Contents", Object::Array(vec![Object::Reference(new_content_id)]));
        }
    }

    Ok(())
}

/// Bracket the page's existing content with `q` ... `Q`
///
/// Pages without content get nothing. Returns whether brackets were added.
pub fn isolate_existing_content(doc: &mut Document, page_id: ObjectId) -> Result<bool, TransformError> {
    let has_content = doc
        .get_dictionary(page_id)?
        .get(b"Contents")
        .map(|contents| match contents {
            Object::Array(items) => !items.is_empty(),
            Object::Reference(_) => true,
            _ => false,
        })
        .unwrap_or(false);
    if !has_content {
        return Ok(false);
    }

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let close_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    prepend_content_to_page(doc, page_id, open_id)?;
    append_content_to_page(doc, page_id, close_id)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_pdf_string("café"), "caf\\351");
        assert_eq!(escape_pdf_string("日本"), "??");
        assert_eq!(escape_pdf_string("line\nbreak"), "line\\012break");
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(1.0), "1");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(-0.00001), "0");
        assert_eq!(fmt_num(-0.7071068), "-0.7071");
    }

    #[test]
    fn test_text_content_rotated_with_opacity() {
        let draw = TextDraw {
            opacity: 0.3,
            angle: -45.0,
            ..TextDraw::new("DRAFT", 100.0, 200.0, 48.0)
        };
        let content = text_content(&draw);
        assert!(content.contains("/PPGs30 gs"));
        assert!(content.contains("/PPHelv 48 Tf"));
        assert!(content.contains("0.7071 -0.7071 0.7071 0.7071 100 200 Tm"));
        assert!(content.contains("(DRAFT) Tj"));
        assert!(content.starts_with("q\n") && content.ends_with("Q\n"));
    }

    #[test]
    fn test_opaque_text_has_no_graphics_state() {
        let content = text_content(&TextDraw::new("1", 10.0, 10.0, 12.0));
        assert!(!content.contains(" gs"));
        assert!(content.contains("1 0 0 1 10 10 Tm"));
    }

    #[test]
    fn test_rect_content() {
        let content = rect_content(&Rect::new(10.0, 20.0, 30.0, 40.0), 0.0);
        assert_eq!(content, "q\n0 g\n10 20 30 40 re\nf\nQ\n");
    }

    #[test]
    fn test_append_to_single_reference() {
        let mut doc = Document::with_version("1.7");
        let original = doc.add_object(Stream::new(Dictionary::new(), b"BT ET".to_vec()));
        let mut page = Dictionary::new();
        page.set("Contents", Object::Reference(original));
        let page_id = doc.add_object(page);
        let overlay = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));

        append_content_to_page(&mut doc, page_id, overlay).unwrap();

        let contents = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap().clone();
        assert_eq!(
            contents,
            Object::Array(vec![Object::Reference(original), Object::Reference(overlay)])
        );
    }

    #[test]
    fn test_isolate_brackets_existing_content() {
        let mut doc = Document::with_version("1.7");
        let original = doc.add_object(Stream::new(Dictionary::new(), b"1 0 0 1 5 5 cm".to_vec()));
        let mut page = Dictionary::new();
        page.set("Contents", Object::Reference(original));
        let page_id = doc.add_object(page);

        assert!(isolate_existing_content(&mut doc, page_id).unwrap());

        let contents = doc.get_page_contents(page_id);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1], original);
    }
}
