use image::{GrayImage, ImageBuffer, Rgb};
use imageproc::point::Point;

/// One captured camera frame, RGB8. Owned by the caller of `process` for the
/// duration of a single call; the pipeline never mutates it.
pub type Frame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Binary image marking target-colored pixels (0 = background, 255 = target).
/// Transient, recomputed for every frame.
pub type Mask = GrayImage;

/// Inclusive lower/upper thresholds in HSV space (OpenCV convention:
/// H in 0..=179, S and V in 0..=255). Fixed per pipeline variant.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ColorBounds {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorBounds {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

/// The contour(s) selected to represent the tracked object this frame.
/// Single-target variants carry one contour, dual-target variants two.
#[derive(Debug, Clone)]
pub struct TargetCandidate {
    pub contours: Vec<Vec<Point<i32>>>,
}

/// Where the target was found along the horizontal axis, or why it wasn't.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// Horizontal pixel coordinate of the target centroid.
    Found(f64),
    /// Too few candidate contours for the active selection policy.
    NoTarget,
    /// A selected contour had zero area, so the centroid ratio is undefined.
    Degenerate,
}

impl Position {
    pub fn is_found(&self) -> bool {
        matches!(self, Position::Found(_))
    }
}
