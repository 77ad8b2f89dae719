use std::collections::VecDeque;

use crate::types::Position;

/// Fixed-capacity FIFO of the most recent raw error samples, pre-filled with
/// zeros. Size never changes after construction; every push evicts the oldest
/// entry. The camera signal is noisy and jumpy, so the published error is the
/// arithmetic mean over this window.
#[derive(Debug, Clone)]
pub struct RunningWindow {
    samples: VecDeque<f64>,
}

impl RunningWindow {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            samples: std::iter::repeat(0.0).take(size).collect(),
        }
    }

    /// Push the newest raw error, evict the oldest, return the window mean.
    pub fn update(&mut self, error: f64) -> f64 {
        self.samples.pop_front();
        self.samples.push_back(error);
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Last-known-position tracker with bounded decay on target loss.
///
/// While the target is visible, tracks it directly. When a frame produces no
/// usable centroid, the held position moves toward the target position by at
/// most `step` pixels: the error neither freezes stale nor snaps instantly to
/// zero, and converges to zero within ceil(|offset| / step) lost frames.
#[derive(Debug, Clone)]
pub struct PositionHold {
    current: f64,
    target: f64,
    step: f64,
}

impl PositionHold {
    pub fn new(target: f64, step: f64) -> Self {
        Self {
            current: target,
            target,
            step: step.abs(),
        }
    }

    /// Fold one frame's detection into the held position and return the raw
    /// instantaneous error (held position minus target).
    pub fn observe(&mut self, position: Position) -> f64 {
        match position {
            Position::Found(x) => self.current = x,
            Position::NoTarget | Position::Degenerate => {
                let offset = self.current - self.target;
                self.current -= offset.clamp(-self.step, self.step);
            }
        }
        self.current - self.target
    }

    pub fn current(&self) -> f64 {
        self.current
    }
}
