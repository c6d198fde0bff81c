//! QR code generator — SVG output plus a ready-to-embed data URL.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use qrcode::QrCode;
use qrcode::render::svg;
use serde::Serialize;

use crate::error::UtilityError;

const MIN_DIMENSION_PX: u32 = 200;

#[derive(Debug, Clone, Serialize)]
pub struct QrImage {
    pub svg: String,
    pub data_url: String,
}

/// Encode `text` as a QR code.
///
/// # Errors
///
/// Returns `Validation` for blank text or text too long for a QR code.
pub fn generate_qr(text: &str) -> Result<QrImage, UtilityError> {
    if text.trim().is_empty() {
        return Err(UtilityError::validation("enter text or a URL first"));
    }

    let code = QrCode::new(text.as_bytes()).map_err(|e| UtilityError::validation(format!("cannot encode QR: {e}")))?;
    let svg = code
        .render::<svg::Color<'_>>()
        .min_dimensions(MIN_DIMENSION_PX, MIN_DIMENSION_PX)
        .build();
    let data_url = format!("data:image/svg+xml;base64,{}", BASE64.encode(svg.as_bytes()));

    Ok(QrImage { svg, data_url })
}
