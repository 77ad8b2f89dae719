use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate, open};

use crate::types::{ColorBounds, Frame, Mask};

/// Morphological cleanup radii applied to the raw mask. A radius of 0 skips
/// that step. Square (LInf) structuring elements throughout.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MorphConfig {
    pub open_radius: u8,
    pub close_radius: u8,
    pub dilate_radius: u8,
}

impl MorphConfig {
    pub fn none() -> Self {
        Self {
            open_radius: 0,
            close_radius: 0,
            dilate_radius: 0,
        }
    }
}

/// Converts a frame to a target-presence mask for fixed color bounds.
/// Pure function of its inputs, no retained state.
#[derive(Debug, Clone)]
pub struct ColorSegmenter {
    bounds: ColorBounds,
    morph: MorphConfig,
}

impl ColorSegmenter {
    pub fn new(bounds: ColorBounds, morph: MorphConfig) -> Self {
        Self { bounds, morph }
    }

    pub fn mask(&self, frame: &Frame) -> Mask {
        let raw = threshold(frame, &self.bounds);
        cleanup(&raw, &self.morph)
    }
}

/// RGB8 -> HSV with OpenCV ranges: H in 0..=179, S and V in 0..=255.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta * 255.0 / max } else { 0.0 };

    let h_deg = if delta <= 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    [
        (h_deg / 2.0).round().min(179.0) as u8,
        s.round().min(255.0) as u8,
        v.round().min(255.0) as u8,
    ]
}

/// Every mask pixel is 255 iff the frame pixel's HSV value falls within
/// `bounds` inclusive on all three channels.
pub fn threshold(frame: &Frame, bounds: &ColorBounds) -> Mask {
    let mut mask = GrayImage::new(frame.width(), frame.height());
    for (x, y, pixel) in frame.enumerate_pixels() {
        let hsv = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        if bounds.contains(hsv) {
            mask.put_pixel(x, y, image::Luma([255u8]));
        }
    }
    mask
}

/// Open removes small noise specks, close fills small holes, and an optional
/// dilation slightly enlarges surviving regions before contour extraction.
pub fn cleanup(mask: &Mask, morph: &MorphConfig) -> Mask {
    let mut out = mask.clone();
    if morph.open_radius > 0 {
        out = open(&out, Norm::LInf, morph.open_radius);
    }
    if morph.close_radius > 0 {
        out = close(&out, Norm::LInf, morph.close_radius);
    }
    if morph.dilate_radius > 0 {
        out = dilate(&out, Norm::LInf, morph.dilate_radius);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn bounds() -> ColorBounds {
        // Cube bounds: yellow/orange game piece.
        ColorBounds {
            lower: [20, 192, 128],
            upper: [90, 255, 255],
        }
    }

    #[test]
    fn hsv_conversion_matches_opencv_convention() {
        // Pure yellow: H 60 deg -> 30, fully saturated, full value.
        assert_eq!(rgb_to_hsv(255, 255, 0), [30, 255, 255]);
        // Black has no hue or saturation.
        assert_eq!(rgb_to_hsv(0, 0, 0), [0, 0, 0]);
        // Pure blue: 240 deg -> 120.
        assert_eq!(rgb_to_hsv(0, 0, 255), [120, 255, 255]);
    }

    #[test]
    fn threshold_marks_in_bounds_pixels_only() {
        let mut frame = Frame::new(4, 1);
        frame.put_pixel(0, 0, Rgb([255, 255, 0])); // yellow, in bounds
        frame.put_pixel(1, 0, Rgb([0, 0, 255])); // blue, hue out of bounds
        frame.put_pixel(2, 0, Rgb([40, 40, 40])); // dark gray, value too low
        frame.put_pixel(3, 0, Rgb([255, 200, 0])); // orange-yellow, in bounds

        let mask = threshold(&frame, &bounds());
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 0);
        assert_eq!(mask.get_pixel(2, 0)[0], 0);
        assert_eq!(mask.get_pixel(3, 0)[0], 255);
    }

    #[test]
    fn opening_removes_isolated_specks() {
        let mut mask = Mask::new(32, 32);
        // One lone pixel and one solid 10x10 block.
        mask.put_pixel(2, 2, image::Luma([255u8]));
        for y in 12..22 {
            for x in 12..22 {
                mask.put_pixel(x, y, image::Luma([255u8]));
            }
        }

        let cleaned = cleanup(
            &mask,
            &MorphConfig {
                open_radius: 2,
                close_radius: 0,
                dilate_radius: 0,
            },
        );
        assert_eq!(cleaned.get_pixel(2, 2)[0], 0, "speck should be erased");
        assert_eq!(cleaned.get_pixel(16, 16)[0], 255, "block should survive");
    }
}
