//! Page geometry in PDF user space
//!
//! All values are in points (1/72 inch) with the origin at the bottom-left
//! corner of the page and y growing upward, as in PDF itself.

use lopdf::Object;
use serde::{Deserialize, Serialize};

/// Width and height of a page in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self::new(595.28, 841.89)
    }

    /// Center point of the page
    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Axis-aligned rectangle: lower-left corner plus extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole page of the given size
    pub fn from_size(size: PageSize) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Read a PDF rectangle array `[llx lly urx ury]`
    ///
    /// PDF allows the corners in either order, so they are normalized.
    pub fn from_pdf_array(array: &[Object]) -> Option<Self> {
        if array.len() != 4 {
            return None;
        }
        let mut values = [0.0f32; 4];
        for (slot, object) in values.iter_mut().zip(array) {
            *slot = object.as_float().ok()?;
        }
        let [x1, y1, x2, y2] = values;
        Some(Self::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs()))
    }

    /// Encode as a PDF rectangle array `[llx lly urx ury]`
    pub fn to_pdf_array(&self) -> Object {
        Object::Array(vec![
            Object::Real(self.x),
            Object::Real(self.y),
            Object::Real(self.x + self.width),
            Object::Real(self.y + self.height),
        ])
    }

    /// All four corners are finite numbers PDF can write
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.x + self.width, self.y + self.height]
            .iter()
            .all(|value| value.is_finite())
    }

    pub fn size(&self) -> PageSize {
        PageSize::new(self.width, self.height)
    }
}

/// Normalize a rotation in degrees into `0..360`
///
/// Returns `None` when the angle is not a multiple of 90, which PDF page
/// rotation cannot express.
pub fn normalize_rotation(degrees: i64) -> Option<i64> {
    if degrees % 90 != 0 {
        return None;
    }
    Some(degrees.rem_euclid(360))
}

/// Offset of page numbers from the bottom-right corner
pub const PAGE_NUMBER_MARGIN: (f32, f32) = (50.0, 30.0);

/// Estimate the rendered width of Helvetica text
///
/// Uses an average glyph width of 0.5 em; good enough for centering, not for
/// line breaking.
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}

/// Origin for a text run centered on `center` after rotating by `angle_deg`
///
/// The returned point is where the baseline starts so that the midpoint of the
/// rotated run lands on `center`.
pub fn centered_text_origin(
    center: (f32, f32),
    text_width: f32,
    font_size: f32,
    angle_deg: f32,
) -> (f32, f32) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    // Half the run along the baseline, plus a third of the em height across it
    let dx = text_width / 2.0;
    let dy = font_size / 3.0;
    (
        center.0 - (dx * cos - dy * sin),
        center.1 - (dx * sin + dy * cos),
    )
}
