//! Image → PDF converter.
//!
//! DESIGN
//! ======
//! The upload is read fully into memory as a base64 data URL. Rendering
//! decodes the image, re-encodes it as baseline JPEG and embeds it as a
//! `DCTDecode` image XObject on a single A4 portrait page, placed at
//! (10 mm, 10 mm) from the top-left and stretched to 180 × 160 mm.
//!
//! The document itself is assembled with `lopdf`: catalog, page tree, one
//! page, its content stream and the image.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::debug;

use crate::error::UtilityError;

pub const PDF_FILENAME: &str = "converted.pdf";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const IMAGE_X_MM: f32 = 10.0;
const IMAGE_Y_MM: f32 = 10.0;
const IMAGE_WIDTH_MM: f32 = 180.0;
const IMAGE_HEIGHT_MM: f32 = 160.0;
const JPEG_QUALITY: u8 = 90;
const IMAGE_NAME: &str = "Im0";

// =============================================================================
// DATA URL
// =============================================================================

/// An uploaded image held as a `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDataUrl {
    mime: String,
    url: String,
}

impl ImageDataUrl {
    /// Read an upload into a data URL.
    ///
    /// # Errors
    ///
    /// Returns `Validation` unless `mime` is `image/*` and `bytes` is non-empty.
    pub fn from_upload(mime: &str, bytes: &[u8]) -> Result<Self, UtilityError> {
        let mime = mime.trim();
        if !mime.starts_with("image/") || bytes.is_empty() {
            return Err(UtilityError::validation("please select a valid image"));
        }
        let url = format!("data:{mime};base64,{}", BASE64.encode(bytes));
        Ok(Self { mime: mime.to_string(), url })
    }

    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    #[cfg(test)]
    pub(crate) fn as_str(&self) -> &str {
        &self.url
    }

    /// Decode the payload back into bytes.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the payload is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, UtilityError> {
        let payload = self.url.split_once(',').map_or("", |(_, p)| p);
        BASE64
            .decode(payload)
            .map_err(|e| UtilityError::validation(format!("invalid image data: {e}")))
    }
}

// =============================================================================
// RENDERING
// =============================================================================

/// Render the image onto a one-page PDF.
///
/// # Errors
///
/// Returns `Validation` if the image cannot be decoded or re-encoded, and
/// `Internal` if the document cannot be written.
pub fn render_pdf(image: &ImageDataUrl) -> Result<Vec<u8>, UtilityError> {
    let bytes = image.decode()?;
    debug!(mime = image.mime(), bytes = bytes.len(), "rendering image to pdf");
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| UtilityError::validation(format!("unsupported image: {e}")))?
        .to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&decoded)
        .map_err(|e| UtilityError::validation(format!("image encoding failed: {e}")))?;

    write_pdf(jpeg, decoded.width(), decoded.height())
        .map_err(|e| UtilityError::Internal(format!("pdf writing failed: {e}")))
}

fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

fn write_pdf(jpeg: Vec<u8>, width_px: u32, height_px: u32) -> Result<Vec<u8>, lopdf::Error> {
    let img_w = mm_to_pt(IMAGE_WIDTH_MM);
    let img_h = mm_to_pt(IMAGE_HEIGHT_MM);
    let img_x = mm_to_pt(IMAGE_X_MM);
    // PDF space grows upward from the bottom edge.
    let img_y = mm_to_pt(PAGE_HEIGHT_MM - IMAGE_Y_MM - IMAGE_HEIGHT_MM);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width_px),
            "Height" => i64::from(height_px),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
    .with_compression(false);
    let image_id = doc.add_object(image);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![img_w.into(), 0.into(), 0.into(), img_h.into(), img_x.into(), img_y.into()]),
            Operation::new("Do", vec![IMAGE_NAME.into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), mm_to_pt(PAGE_WIDTH_MM).into(), mm_to_pt(PAGE_HEIGHT_MM).into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

#[cfg(test)]
#[path = "pdf_test.rs"]
mod tests;
