use anyhow::Result;

use crate::centroid::horizontal_centroid;
use crate::contour::{ContourExtractor, SelectionPolicy};
use crate::filter::{PositionHold, RunningWindow};
use crate::segment::{ColorSegmenter, MorphConfig};
use crate::types::{ColorBounds, Frame};

/// A target-tracking pipeline: one frame in, one smoothed steering error out.
/// The error is signed pixels along the horizontal axis, zero when the target
/// sits at frame center. Always yields a finite value; target loss is covered
/// by the variant's hold policy, never surfaced to the caller.
pub trait Pipeline: Send {
    fn name(&self) -> String;
    fn process(&mut self, frame: &Frame) -> Result<f64>;
}

/// Static configuration of one tracking variant.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    pub bounds: ColorBounds,
    pub morph: MorphConfig,
    pub policy: SelectionPolicy,
    /// Apply a convex-hull pass before area ranking.
    pub convex_hull: bool,
    /// Smoothing window length in frames.
    pub window_size: usize,
    /// Max pixels per frame the held position moves toward target on loss.
    pub hold_step: f64,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self::cube()
    }
}

impl VariantConfig {
    /// Yellow cube game piece: one solid blob, hull pass to smooth occlusion.
    pub fn cube() -> Self {
        Self {
            bounds: ColorBounds {
                lower: [20, 192, 128],
                upper: [90, 255, 255],
            },
            morph: MorphConfig {
                open_radius: 2,
                close_radius: 2,
                dilate_radius: 0,
            },
            policy: SelectionPolicy::SingleLargest,
            convex_hull: true,
            window_size: 4,
            hold_step: 50.0,
        }
    }

    /// Retroreflective tape: two bright low-saturation strips, tracked at the
    /// midpoint between their centroids.
    pub fn tape() -> Self {
        Self {
            bounds: ColorBounds {
                lower: [90, 0, 224],
                upper: [150, 32, 255],
            },
            morph: MorphConfig {
                open_radius: 2,
                close_radius: 2,
                dilate_radius: 0,
            },
            policy: SelectionPolicy::TwoLargest,
            convex_hull: false,
            window_size: 4,
            hold_step: 50.0,
        }
    }
}

/// Color-segmentation tracking pipeline:
/// threshold -> contours -> centroid -> hold policy -> running average.
pub struct ColorPipeline {
    name: String,
    segmenter: ColorSegmenter,
    extractor: ContourExtractor,
    hold: PositionHold,
    window: RunningWindow,
    verbose: bool,
}

impl ColorPipeline {
    /// `target_position` is the pixel column treated as zero error, normally
    /// frame_width / 2.
    pub fn new(name: &str, config: &VariantConfig, target_position: f64) -> Self {
        Self {
            name: name.to_string(),
            segmenter: ColorSegmenter::new(config.bounds, config.morph),
            extractor: ContourExtractor::new(config.policy, config.convex_hull),
            hold: PositionHold::new(target_position, config.hold_step),
            window: RunningWindow::new(config.window_size),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Pipeline for ColorPipeline {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn process(&mut self, frame: &Frame) -> Result<f64> {
        // 1. Segment the frame into a target-presence mask.
        let mask = self.segmenter.mask(frame);

        // 2. Pick the candidate contour(s) and locate their centroid.
        let position = match self.extractor.select(&mask) {
            Some(candidate) => horizontal_centroid(&candidate),
            None => crate::types::Position::NoTarget,
        };

        // 3. Fold into the held position, then smooth.
        let raw_error = self.hold.observe(position);
        let smoothed = self.window.update(raw_error);

        if self.verbose {
            println!(
                "[{}] position={:.1} raw_error={:.1} smoothed={:.1}",
                self.name,
                self.hold.current(),
                raw_error,
                smoothed
            );
        }

        Ok(smoothed)
    }
}
