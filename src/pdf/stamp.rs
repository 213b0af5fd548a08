//! Overlays stamped onto existing pages: watermark, page numbers, text edits,
//! redaction boxes and signatures
//!
//! Everything here is drawn on top of the page. Original content streams are
//! left intact.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ProcessingConfig;
use crate::error::{Result, TransformError};
use crate::layout::{centered_text_origin, estimate_text_width, Rect, PAGE_NUMBER_MARGIN};
use crate::pdf::{open, write, EmbeddedImage, PdfDocument, TextDraw};
use crate::progress::Progress;
use crate::range;

/// Baseline angle of watermark text
pub const WATERMARK_ANGLE: f32 = -45.0;

/// Watermark font size; long text is not scaled down to fit
pub const WATERMARK_FONT_SIZE: f32 = 48.0;

/// Gray level of watermark text
const WATERMARK_GRAY: f32 = 0.5;

pub const PAGE_NUMBER_FONT_SIZE: f32 = 12.0;

pub const EDIT_FONT_SIZE: f32 = 12.0;

fn default_opacity() -> f32 {
    0.3
}

/// Text stamped diagonally across the center of every page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSpec {
    pub text: String,
    /// 0.0 (invisible) to 1.0 (opaque)
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl WatermarkSpec {
    fn validate(&self) -> std::result::Result<(), TransformError> {
        if self.text.trim().is_empty() {
            return Err(TransformError::MissingParameter("text"));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(TransformError::InvalidParameter {
                name: "opacity",
                reason: format!("must be between 0 and 1, got {}", self.opacity),
            });
        }
        Ok(())
    }
}

/// A text item placed by the edit tool
///
/// `page` is 1-based, as typed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEdit {
    pub page: i64,
    pub text: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

impl TextEdit {
    fn validate(&self) -> std::result::Result<(), TransformError> {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(TransformError::InvalidParameter {
                name: "edits",
                reason: format!("position on page {} must be finite, got ({}, {})", self.page, self.x, self.y),
            });
        }
        if let Some(size) = self.font_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(TransformError::InvalidParameter {
                    name: "edits",
                    reason: format!("font size on page {} must be positive, got {}", self.page, size),
                });
            }
        }
        Ok(())
    }
}

/// A rectangle on one page, used by redact and sign
///
/// `page` is 0-based. Front ends that collect 1-based page numbers convert
/// with [`OverlayEntry::from_page_number`] on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl OverlayEntry {
    /// Build an entry from a 1-based page number; `None` for page 0
    pub fn from_page_number(page_number: usize, x: f32, y: f32, width: f32, height: f32) -> Option<Self> {
        let page = page_number.checked_sub(1)?;
        Some(Self { page, x, y, width, height })
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    fn validate(&self) -> std::result::Result<(), TransformError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(TransformError::InvalidParameter {
                name: "entries",
                reason: format!(
                    "rectangle on page index {} must have a positive size, got {}x{}",
                    self.page, self.width, self.height
                ),
            });
        }
        if !self.rect().is_finite() {
            return Err(TransformError::InvalidParameter {
                name: "entries",
                reason: format!("rectangle on page index {} must have finite coordinates", self.page),
            });
        }
        Ok(())
    }
}

/// Draw a watermark centered on every page's visible area
///
/// One text draw per page at [`WATERMARK_ANGLE`] and [`WATERMARK_FONT_SIZE`].
pub fn watermark(
    input: &[u8],
    spec: &WatermarkSpec,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    spec.validate()?;

    let mut document = open(input, config)?;
    let page_count = document.page_count();
    let text_width = estimate_text_width(&spec.text, WATERMARK_FONT_SIZE);

    for index in 0..page_count {
        progress.checkpoint()?;

        let visible = document.crop_box(index)?;
        let center = (visible.x + visible.width / 2.0, visible.y + visible.height / 2.0);
        let (x, y) = centered_text_origin(center, text_width, WATERMARK_FONT_SIZE, WATERMARK_ANGLE);

        document.draw_text(
            index,
            &TextDraw {
                opacity: spec.opacity,
                angle: WATERMARK_ANGLE,
                gray: WATERMARK_GRAY,
                ..TextDraw::new(spec.text.clone(), x, y, WATERMARK_FONT_SIZE)
            },
        )?;
        progress.advance(index + 1, page_count);
    }

    info!(pages = page_count, opacity = spec.opacity, "watermark complete");
    write(document, config, progress)
}

/// Number every page (`1`, `2`, ...) near its bottom-right corner
pub fn page_numbers(
    input: &[u8],
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    let mut document = open(input, config)?;
    let page_count = document.page_count();
    let (margin_x, margin_y) = PAGE_NUMBER_MARGIN;

    for index in 0..page_count {
        progress.checkpoint()?;

        let visible = document.crop_box(index)?;
        let x = visible.x + visible.width - margin_x;
        let y = visible.y + margin_y;
        document.draw_text(
            index,
            &TextDraw::new((index + 1).to_string(), x, y, PAGE_NUMBER_FONT_SIZE),
        )?;
        progress.advance(index + 1, page_count);
    }

    info!(pages = page_count, "page numbers complete");
    write(document, config, progress)
}

/// Draw user-placed text items
///
/// Items on pages that do not exist are skipped with a warning.
pub fn edit(
    input: &[u8],
    edits: &[TextEdit],
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    for item in edits {
        item.validate()?;
    }

    let mut document = open(input, config)?;
    let page_count = document.page_count();
    let mut applied = 0;

    for (done, item) in edits.iter().enumerate() {
        progress.checkpoint()?;

        match range::from_page_numbers(&[item.page], page_count).first() {
            Some(&index) => {
                let font_size = item.font_size.unwrap_or(EDIT_FONT_SIZE);
                document.draw_text(index, &TextDraw::new(item.text.clone(), item.x, item.y, font_size))?;
                applied += 1;
            }
            None => warn!(page = item.page, page_count, "skipping edit on a page that does not exist"),
        }
        progress.advance(done + 1, edits.len());
    }

    info!(applied, skipped = edits.len() - applied, "edit complete");
    write(document, config, progress)
}

/// Apply `draw` to every entry whose page exists, warning about the rest
fn for_each_entry(
    document: &mut PdfDocument,
    entries: &[OverlayEntry],
    progress: &mut Progress<'_>,
    mut draw: impl FnMut(&mut PdfDocument, &OverlayEntry) -> std::result::Result<(), TransformError>,
) -> Result<usize> {
    for entry in entries {
        entry.validate()?;
    }

    let page_count = document.page_count();
    let mut applied = 0;
    for (done, entry) in entries.iter().enumerate() {
        progress.checkpoint()?;
        if entry.page < page_count {
            draw(document, entry)?;
            applied += 1;
        } else {
            warn!(page_index = entry.page, page_count, "skipping entry on a page that does not exist");
        }
        progress.advance(done + 1, entries.len());
    }
    Ok(applied)
}

/// Cover rectangles with opaque black boxes
///
/// This is a visual redaction only: the text and images underneath remain in
/// the content streams and can still be extracted.
pub fn redact(
    input: &[u8],
    entries: &[OverlayEntry],
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    let mut document = open(input, config)?;
    let applied = for_each_entry(&mut document, entries, progress, |document, entry| {
        document.draw_rect(entry.page, entry.rect(), 0.0)
    })?;

    info!(boxes = applied, "redact complete");
    write(document, config, progress)
}

/// Place a signature image (JPEG or PNG) into each entry's rectangle
pub fn sign(
    input: &[u8],
    signature: &[u8],
    placements: &[OverlayEntry],
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    if placements.is_empty() {
        return Err(TransformError::MissingParameter("placements").into());
    }
    let image = EmbeddedImage::from_bytes(signature)?;

    let mut document = open(input, config)?;
    let image = document.add_image(&image);
    let applied = for_each_entry(&mut document, placements, progress, |document, entry| {
        document.draw_image(entry.page, image, entry.rect())
    })?;

    info!(placements = applied, "sign complete");
    write(document, config, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pdf::document::tests::sample_bytes;
    use crate::pdf::images::tests::png_bytes;
    use crate::pdf::LoadOptions;
    use pretty_assertions::assert_eq;

    fn load(bytes: &[u8]) -> PdfDocument {
        PdfDocument::load(bytes, &LoadOptions::default()).unwrap()
    }

    fn content(document: &PdfDocument, index: usize) -> String {
        String::from_utf8_lossy(&document.page_content(index).unwrap()).into_owned()
    }

    #[test]
    fn test_watermark_one_draw_per_page() {
        let spec = WatermarkSpec { text: "CONFIDENTIAL".to_string(), opacity: 0.25 };
        let output = watermark(&sample_bytes(&[612.0, 612.0]), &spec, &ProcessingConfig::default(), &mut Progress::none()).unwrap();
        let document = load(&output);

        for index in 0..2 {
            let text = content(&document, index);
            assert_eq!(text.matches("(CONFIDENTIAL) Tj").count(), 1);
            assert!(text.contains("/PPGs25 gs"));
            // cos(-45°), sin(-45°) in the text matrix
            assert!(text.contains("0.7071 -0.7071 0.7071 0.7071"));
            assert!(text.contains("/PPHelv 48 Tf"));
        }
    }

    #[test]
    fn test_watermark_validates_input() {
        let config = ProcessingConfig::default();
        let input = sample_bytes(&[612.0]);

        let blank = WatermarkSpec { text: "  ".to_string(), opacity: 0.5 };
        assert!(matches!(
            watermark(&input, &blank, &config, &mut Progress::none()),
            Err(Error::Transform(TransformError::MissingParameter("text")))
        ));

        let too_opaque = WatermarkSpec { text: "X".to_string(), opacity: 1.5 };
        assert!(matches!(
            watermark(&input, &too_opaque, &config, &mut Progress::none()),
            Err(Error::Transform(TransformError::InvalidParameter { name: "opacity", .. }))
        ));
    }

    #[test]
    fn test_page_numbers_bottom_right() {
        let output = page_numbers(&sample_bytes(&[612.0, 300.0]), &ProcessingConfig::default(), &mut Progress::none()).unwrap();
        let document = load(&output);
        assert!(content(&document, 0).contains("1 0 0 1 562 30 Tm\n(1) Tj"));
        assert!(content(&document, 1).contains("1 0 0 1 250 30 Tm\n(2) Tj"));
    }

    #[test]
    fn test_edit_skips_missing_pages() {
        let edits = vec![
            TextEdit { page: 2, text: "second".to_string(), x: 10.0, y: 20.0, font_size: None },
            TextEdit { page: 3, text: "ghost".to_string(), x: 10.0, y: 20.0, font_size: None },
            TextEdit { page: 0, text: "zero".to_string(), x: 10.0, y: 20.0, font_size: Some(20.0) },
        ];
        let output = edit(&sample_bytes(&[612.0, 612.0]), &edits, &ProcessingConfig::default(), &mut Progress::none()).unwrap();
        let document = load(&output);
        assert!(!content(&document, 0).contains("(second)"));
        assert!(content(&document, 1).contains("1 0 0 1 10 20 Tm\n(second) Tj"));
        assert!(!content(&document, 0).contains("(zero)"));
    }

    #[test]
    fn test_redact_draws_black_boxes() {
        let entries = vec![
            OverlayEntry { page: 0, x: 10.0, y: 10.0, width: 50.0, height: 20.0 },
            OverlayEntry { page: 5, x: 10.0, y: 10.0, width: 50.0, height: 20.0 },
        ];
        let output = redact(&sample_bytes(&[612.0]), &entries, &ProcessingConfig::default(), &mut Progress::none()).unwrap();
        let text = content(&load(&output), 0);
        assert!(text.contains("0 g\n10 10 50 20 re\nf"));
        // Original text is still there underneath
        assert!(text.contains("(page 1) Tj"));
    }

    #[test]
    fn test_redact_rejects_empty_rect() {
        let entries = vec![OverlayEntry { page: 0, x: 0.0, y: 0.0, width: -5.0, height: 20.0 }];
        let result = redact(&sample_bytes(&[612.0]), &entries, &ProcessingConfig::default(), &mut Progress::none());
        assert!(matches!(result, Err(Error::Transform(TransformError::InvalidParameter { .. }))));
    }

    #[test]
    fn test_edit_rejects_non_finite_position() {
        let edits = vec![TextEdit { page: 1, text: "far".to_string(), x: f32::INFINITY, y: 20.0, font_size: None }];
        let result = edit(&sample_bytes(&[612.0]), &edits, &ProcessingConfig::default(), &mut Progress::none());
        assert!(matches!(result, Err(Error::Transform(TransformError::InvalidParameter { name: "edits", .. }))));

        let edits = vec![TextEdit { page: 1, text: "nan".to_string(), x: 10.0, y: f32::NAN, font_size: None }];
        let result = edit(&sample_bytes(&[612.0]), &edits, &ProcessingConfig::default(), &mut Progress::none());
        assert!(matches!(result, Err(Error::Transform(TransformError::InvalidParameter { .. }))));
    }

    #[test]
    fn test_redact_rejects_infinite_rect() {
        let entry: OverlayEntry =
            serde_json::from_str(r#"{"page":0,"x":0,"y":0,"width":1e39,"height":20}"#).unwrap();
        let result = redact(&sample_bytes(&[612.0]), &[entry], &ProcessingConfig::default(), &mut Progress::none());
        assert!(matches!(result, Err(Error::Transform(TransformError::InvalidParameter { name: "entries", .. }))));
    }

    #[test]
    fn test_sign_rejects_non_finite_placement() {
        let placements = vec![OverlayEntry { page: 0, x: f32::NEG_INFINITY, y: 0.0, width: 10.0, height: 10.0 }];
        let result = sign(
            &sample_bytes(&[612.0]),
            &png_bytes(2, 2, false),
            &placements,
            &ProcessingConfig::default(),
            &mut Progress::none(),
        );
        assert!(matches!(result, Err(Error::Transform(TransformError::InvalidParameter { name: "entries", .. }))));
    }

    #[test]
    fn test_overlay_entry_from_page_number() {
        assert_eq!(OverlayEntry::from_page_number(1, 0.0, 0.0, 1.0, 1.0).unwrap().page, 0);
        assert!(OverlayEntry::from_page_number(0, 0.0, 0.0, 1.0, 1.0).is_none());
    }

    #[test]
    fn test_sign_places_image_once_per_entry() {
        let placements = vec![
            OverlayEntry { page: 0, x: 400.0, y: 50.0, width: 120.0, height: 40.0 },
            OverlayEntry { page: 1, x: 400.0, y: 50.0, width: 120.0, height: 40.0 },
        ];
        let output = sign(
            &sample_bytes(&[612.0, 612.0]),
            &png_bytes(12, 4, true),
            &placements,
            &ProcessingConfig::default(),
            &mut Progress::none(),
        )
        .unwrap();
        let document = load(&output);
        for index in 0..2 {
            let text = content(&document, index);
            assert!(text.contains("120 0 0 40 400 50 cm"));
            assert_eq!(text.matches(" Do").count(), 1);
        }
    }

    #[test]
    fn test_sign_requires_placements() {
        let result = sign(&sample_bytes(&[612.0]), &png_bytes(2, 2, false), &[], &ProcessingConfig::default(), &mut Progress::none());
        assert!(matches!(result, Err(Error::Transform(TransformError::MissingParameter("placements")))));
    }
}
