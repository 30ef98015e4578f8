//! Pairing code rendering
//!
//! The same payload is drawn as compact unicode blocks for the terminal and
//! as a PNG for the HTTP preview page.

use image::{ImageFormat, Luma};
use qrcode::render::unicode;
use qrcode::QrCode;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrError {
    #[error("Cannot encode pairing code: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Cannot encode PNG: {0}")]
    Image(#[from] image::ImageError),
}

/// Half-height unicode rendering, two modules per character row
pub fn render_terminal(code: &str) -> Result<String, QrError> {
    let qr = QrCode::new(code.as_bytes())?;
    Ok(qr
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

/// PNG image bytes
pub fn render_png(code: &str) -> Result<Vec<u8>, QrError> {
    let qr = QrCode::new(code.as_bytes())?;
    let image = qr.render::<Luma<u8>>().min_dimensions(256, 256).build();

    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
