//! Raster images prepared as PDF image XObjects
//!
//! JPEG data is embedded untouched behind `DCTDecode`; the header is only
//! scanned for dimensions and component count. PNG is decoded to 8-bit RGB,
//! with any alpha channel split into a soft mask, and Flate-compressed.

use image::{DynamicImage, GenericImageView, ImageFormat};
use lopdf::{Dictionary, Object, Stream};
use tracing::info;

use crate::config::ProcessingConfig;
use crate::error::{Result, TransformError};
use crate::layout::{PageSize, Rect};
use crate::pdf::{write, PdfDocument};
use crate::progress::Progress;

/// Build a document with one page per image, each page sized to its image
/// at 72 dpi
///
/// Progress advances once per image.
pub fn images_to_pdf<B: AsRef<[u8]>>(
    images: &[B],
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(TransformError::NotEnoughInputs { tool: "images-to-pdf", required: 1, given: 0 }.into());
    }

    let mut document = PdfDocument::new();
    for (done, bytes) in images.iter().enumerate() {
        progress.checkpoint()?;

        let bytes = bytes.as_ref();
        config.check_size(bytes)?;
        let image = EmbeddedImage::from_bytes(bytes)?;
        let size = image.page_size();

        let index = document.add_blank_page(size)?;
        let stored = document.add_image(&image);
        document.draw_image(index, stored, Rect::from_size(size))?;

        progress.advance(done + 1, images.len());
    }

    info!(pages = images.len(), "images to pdf complete");
    write(document, config, progress)
}

/// An image ready to be placed on a page
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    /// Image XObject stream, without the `/SMask` reference
    pub(crate) stream: Stream,
    /// Alpha channel as a DeviceGray image stream
    pub(crate) soft_mask: Option<Stream>,
}

impl EmbeddedImage {
    /// Prepare JPEG or PNG bytes for embedding
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, TransformError> {
        let format = image::guess_format(bytes)
            .map_err(|e| TransformError::UnsupportedImage(e.to_string()))?;

        match format {
            ImageFormat::Jpeg => Self::from_jpeg(bytes),
            ImageFormat::Png => Self::from_png(bytes),
            other => Err(TransformError::UnsupportedImage(format!(
                "{other:?} images are not supported; use JPEG or PNG"
            ))),
        }
    }

    /// Natural page size for the image at 72 dpi (one pixel per point)
    pub fn page_size(&self) -> PageSize {
        PageSize::new(self.width as f32, self.height as f32)
    }

    fn from_jpeg(bytes: &[u8]) -> std::result::Result<Self, TransformError> {
        let header = JpegHeader::scan(bytes)?;
        let color_space = match header.components {
            1 => "DeviceGray",
            3 => "DeviceRGB",
            4 => "DeviceCMYK",
            n => {
                return Err(TransformError::UnsupportedImage(format!(
                    "JPEG with {n} color components"
                )))
            }
        };

        let mut dict = image_dict(header.width, header.height, color_space, header.precision);
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        // Adobe CMYK JPEGs store inverted ink values
        if header.components == 4 && header.adobe {
            dict.set(
                "Decode",
                Object::Array([1, 0, 1, 0, 1, 0, 1, 0].into_iter().map(Object::Integer).collect()),
            );
        }

        let stream = Stream::new(dict, bytes.to_vec()).with_compression(false);

        Ok(Self {
            width: header.width,
            height: header.height,
            stream,
            soft_mask: None,
        })
    }

    fn from_png(bytes: &[u8]) -> std::result::Result<Self, TransformError> {
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| TransformError::UnsupportedImage(e.to_string()))?;
        let (width, height) = decoded.dimensions();

        let soft_mask = if decoded.color().has_alpha() {
            let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|pixel| pixel.0[3]).collect();
            Some(flate_stream(image_dict(width, height, "DeviceGray", 8), alpha)?)
        } else {
            None
        };

        let (color_space, samples) = match &decoded {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => {
                ("DeviceGray", decoded.to_luma8().into_raw())
            }
            _ => ("DeviceRGB", decoded.to_rgb8().into_raw()),
        };
        let stream = flate_stream(image_dict(width, height, color_space, 8), samples)?;

        Ok(Self { width, height, stream, soft_mask })
    }
}

fn image_dict(width: u32, height: u32, color_space: &str, bits: u8) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(width)));
    dict.set("Height", Object::Integer(i64::from(height)));
    dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(i64::from(bits)));
    dict
}

fn flate_stream(dict: Dictionary, samples: Vec<u8>) -> std::result::Result<Stream, TransformError> {
    let mut stream = Stream::new(dict, samples);
    stream.compress()?;
    Ok(stream)
}

/// Fields of a JPEG start-of-frame segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegHeader {
    width: u32,
    height: u32,
    precision: u8,
    components: u8,
    /// An Adobe APP14 segment was seen before the frame header
    adobe: bool,
}

impl JpegHeader {
    fn scan(bytes: &[u8]) -> std::result::Result<Self, TransformError> {
        let invalid = |reason: &str| TransformError::UnsupportedImage(format!("invalid JPEG: {reason}"));

        if !bytes.starts_with(&[0xFF, 0xD8]) {
            return Err(invalid("missing start-of-image marker"));
        }

        let mut adobe = false;
        let mut pos = 2;
        while pos + 4 <= bytes.len() {
            if bytes[pos] != 0xFF {
                return Err(invalid("expected a segment marker"));
            }
            let marker = bytes[pos + 1];
            // Fill bytes and standalone markers carry no length
            if marker == 0xFF {
                pos += 1;
                continue;
            }
            if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
                pos += 2;
                continue;
            }

            let length = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
            let segment = bytes
                .get(pos + 4..pos + 2 + length)
                .ok_or_else(|| invalid("truncated segment"))?;

            match marker {
                0xEE if segment.starts_with(b"Adobe") => adobe = true,
                // SOF0..SOF15, minus DHT (C4), JPG (C8) and DAC (CC)
                0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                    if segment.len() < 6 {
                        return Err(invalid("short frame header"));
                    }
                    let height = u32::from(u16::from_be_bytes([segment[1], segment[2]]));
                    let width = u32::from(u16::from_be_bytes([segment[3], segment[4]]));
                    if width == 0 || height == 0 {
                        return Err(invalid("zero image dimension"));
                    }
                    return Ok(Self {
                        width,
                        height,
                        precision: segment[0],
                        components: segment[5],
                        adobe,
                    });
                }
                0xDA => return Err(invalid("scan data before frame header")),
                _ => {}
            }

            pos += 2 + length;
        }

        Err(invalid("no frame header"))
    }
}
