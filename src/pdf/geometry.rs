//! Page geometry: rotation and crop box

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ProcessingConfig;
use crate::error::{Result, TransformError};
use crate::layout::{normalize_rotation, Rect};
use crate::pdf::{open, write};
use crate::progress::Progress;

/// How a rotation angle is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RotateMode {
    /// Every page ends up at exactly this rotation
    #[default]
    Absolute,
    /// Added to each page's current rotation
    Relative,
}

/// Rotate every page
///
/// Any multiple of 90 is accepted (`-90` and `450` normalize to `270` and
/// `90`); other angles fail with [`TransformError::InvalidRotation`].
pub fn rotate(
    input: &[u8],
    degrees: i64,
    mode: RotateMode,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    if normalize_rotation(degrees).is_none() {
        return Err(TransformError::InvalidRotation(degrees).into());
    }

    let mut document = open(input, config)?;
    let page_count = document.page_count();

    for index in 0..page_count {
        progress.checkpoint()?;
        match mode {
            RotateMode::Absolute => document.set_rotation(index, degrees)?,
            RotateMode::Relative => document.rotate_by(index, degrees)?,
        }
        progress.advance(index + 1, page_count);
    }

    info!(pages = page_count, degrees, ?mode, "rotate complete");
    write(document, config, progress)
}

/// Set the same crop box on every page
///
/// The rectangle is written as given, even when it extends past the media
/// box; viewers clip it to the media box themselves.
pub fn crop(
    input: &[u8],
    rect: Rect,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    if !(rect.width > 0.0 && rect.height > 0.0) {
        return Err(TransformError::InvalidParameter {
            name: "rect",
            reason: format!("width and height must be positive, got {}x{}", rect.width, rect.height),
        }
        .into());
    }
    if !rect.is_finite() {
        return Err(TransformError::InvalidParameter {
            name: "rect",
            reason: format!("coordinates must be finite, got {:?}", rect),
        }
        .into());
    }

    let mut document = open(input, config)?;
    let page_count = document.page_count();

    for index in 0..page_count {
        progress.checkpoint()?;
        document.set_crop_box(index, rect)?;
        progress.advance(index + 1, page_count);
    }

    info!(pages = page_count, "crop complete");
    write(document, config, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pdf::document::tests::sample_bytes;
    use crate::pdf::{LoadOptions, PdfDocument};

    fn rotations(bytes: &[u8]) -> Vec<i64> {
        let document = PdfDocument::load(bytes, &LoadOptions::default()).unwrap();
        (0..document.page_count()).map(|index| document.rotation(index).unwrap()).collect()
    }

    fn run_rotate(input: &[u8], degrees: i64, mode: RotateMode) -> Result<Vec<u8>> {
        rotate(input, degrees, mode, &ProcessingConfig::default(), &mut Progress::none())
    }

    #[test]
    fn test_absolute_rotation_is_not_additive() {
        let once = run_rotate(&sample_bytes(&[100.0, 200.0]), 90, RotateMode::Absolute).unwrap();
        let twice = run_rotate(&once, 90, RotateMode::Absolute).unwrap();
        assert_eq!(rotations(&twice), vec![90, 90]);
    }

    #[test]
    fn test_relative_rotation_accumulates() {
        let once = run_rotate(&sample_bytes(&[100.0]), 90, RotateMode::Relative).unwrap();
        let twice = run_rotate(&once, 90, RotateMode::Relative).unwrap();
        assert_eq!(rotations(&twice), vec![180]);
    }

    #[test]
    fn test_negative_rotation_normalized() {
        let output = run_rotate(&sample_bytes(&[100.0]), -90, RotateMode::Absolute).unwrap();
        assert_eq!(rotations(&output), vec![270]);
    }

    #[test]
    fn test_relative_rotation_by_huge_multiple() {
        let turned = run_rotate(&sample_bytes(&[100.0]), 270, RotateMode::Absolute).unwrap();
        let output = run_rotate(&turned, (i64::MAX / 90) * 90, RotateMode::Relative).unwrap();
        // i64::MAX / 90 * 90 is itself a multiple of 360
        assert_eq!(rotations(&output), vec![270]);
    }

    #[test]
    fn test_non_right_angle_rejected() {
        assert!(matches!(
            run_rotate(&sample_bytes(&[100.0]), 45, RotateMode::Absolute),
            Err(Error::Transform(TransformError::InvalidRotation(45)))
        ));
    }

    #[test]
    fn test_crop_applies_to_every_page_even_past_bounds() {
        let rect = Rect::new(10.0, 20.0, 1000.0, 300.0);
        let output = crop(
            &sample_bytes(&[100.0, 200.0]),
            rect,
            &ProcessingConfig::default(),
            &mut Progress::none(),
        )
        .unwrap();

        let document = PdfDocument::load(&output, &LoadOptions::default()).unwrap();
        assert_eq!(document.crop_box(0).unwrap(), rect);
        assert_eq!(document.crop_box(1).unwrap(), rect);
        // Media box is untouched
        assert_eq!(document.page_size(1).unwrap().width, 200.0);
    }

    #[test]
    fn test_crop_rejects_infinite_rect() {
        // 1e39 does not fit in an f32 and parses as infinity
        let rect: Rect = serde_json::from_str(r#"{"x":0,"y":0,"width":1e39,"height":100}"#).unwrap();
        let result = crop(&sample_bytes(&[100.0]), rect, &ProcessingConfig::default(), &mut Progress::none());
        assert!(matches!(
            result,
            Err(Error::Transform(TransformError::InvalidParameter { name: "rect", .. }))
        ));

        let overflowing = Rect::new(f32::MAX, 0.0, f32::MAX, 10.0);
        let result = crop(&sample_bytes(&[100.0]), overflowing, &ProcessingConfig::default(), &mut Progress::none());
        assert!(matches!(result, Err(Error::Transform(TransformError::InvalidParameter { .. }))));
    }

    #[test]
    fn test_crop_rejects_empty_rect() {
        let result = crop(
            &sample_bytes(&[100.0]),
            Rect::new(0.0, 0.0, 0.0, 10.0),
            &ProcessingConfig::default(),
            &mut Progress::none(),
        );
        assert!(matches!(result, Err(Error::Transform(TransformError::InvalidParameter { .. }))));
    }
}
