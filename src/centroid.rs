use imageproc::point::Point;

use crate::types::{Position, TargetCandidate};

// Below this the m10/m00 ratio is numerically meaningless.
const MIN_AREA: f64 = 1e-6;

/// Horizontal centroid of the candidate: the area-weighted moment ratio
/// m10/m00 for a single contour, or the mean of both ratios for a dual
/// candidate. A zero-area contour that slipped past selection yields
/// `Position::Degenerate`, never a division fault.
pub fn horizontal_centroid(candidate: &TargetCandidate) -> Position {
    if candidate.contours.is_empty() {
        return Position::NoTarget;
    }

    let mut sum = 0.0;
    for contour in &candidate.contours {
        match polygon_centroid_x(contour) {
            Some(cx) => sum += cx,
            None => return Position::Degenerate,
        }
    }
    Position::Found(sum / candidate.contours.len() as f64)
}

/// Green's-theorem polygon moments: signed m00 and m10 over the boundary,
/// with the sign cancelling in the ratio. None when the enclosed area is zero.
fn polygon_centroid_x(points: &[Point<i32>]) -> Option<f64> {
    if points.len() < 3 {
        return None;
    }

    let mut m00 = 0.0f64;
    let mut m10 = 0.0f64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        let cross = p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
        m00 += cross;
        m10 += (p.x as f64 + q.x as f64) * cross;
    }
    m00 /= 2.0;
    m10 /= 6.0;

    if m00.abs() < MIN_AREA {
        None
    } else {
        Some(m10 / m00)
    }
}
