use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use crate::types::{Mask, TargetCandidate};

/// How many contours represent the tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SelectionPolicy {
    /// Single blob target: the one largest-area boundary.
    SingleLargest,
    /// Two parallel strips: the two largest-area boundaries.
    TwoLargest,
}

impl SelectionPolicy {
    fn required(&self) -> usize {
        match self {
            SelectionPolicy::SingleLargest => 1,
            SelectionPolicy::TwoLargest => 2,
        }
    }
}

/// Extracts external connected-region boundaries from a mask and applies the
/// variant's selection policy.
#[derive(Debug, Clone)]
pub struct ContourExtractor {
    policy: SelectionPolicy,
    use_hull: bool,
}

impl ContourExtractor {
    pub fn new(policy: SelectionPolicy, use_hull: bool) -> Self {
        Self { policy, use_hull }
    }

    /// Returns the selected candidate, or None when fewer contours exist than
    /// the policy requires. Equal areas tie-break by discovery order (first
    /// encountered wins); exact float ties do not occur in practice.
    pub fn select(&self, mask: &Mask) -> Option<TargetCandidate> {
        let mut contours: Vec<Vec<Point<i32>>> = find_contours::<i32>(mask)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .map(|c| {
                if self.use_hull {
                    // Hull pass reduces concavity noise from partial occlusion.
                    convex_hull(c.points)
                } else {
                    c.points
                }
            })
            .collect();

        let required = self.policy.required();
        if contours.len() < required {
            return None;
        }

        // Stable sort keeps discovery order for equal areas.
        contours.sort_by(|a, b| contour_area(b).total_cmp(&contour_area(a)));
        contours.truncate(required);
        Some(TargetCandidate { contours })
    }
}

/// Enclosed polygon area by the shoelace formula, in square pixels.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0i64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        acc += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (acc.abs() as f64) / 2.0
}
