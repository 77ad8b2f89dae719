use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::types::Frame;

/// Encode one captured frame as JPEG for the remote-view feed. The bytes are
/// opaque to the rest of the system.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(
            frame.as_raw(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )
        .context("JPEG encoding failed")?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn produces_a_jpeg_byte_stream() {
        let mut frame = Frame::new(16, 16);
        for pixel in frame.pixels_mut() {
            *pixel = Rgb([200, 120, 40]);
        }

        let bytes = encode_jpeg(&frame, 80).unwrap();
        assert!(!bytes.is_empty());
        // JPEG SOI marker.
        assert_eq!(bytes[0], 0xFF);
        assert_eq!(bytes[1], 0xD8);
    }
}
