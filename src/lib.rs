//! Color-target tracking for a camera-guided robot: segment a frame by color,
//! pick the candidate contour(s), locate their horizontal centroid, smooth the
//! offset from frame center over a running window, and hand the result to the
//! steering publisher over a bounded channel. Capture and processing run on a
//! dedicated worker thread gated by enable/disable commands.

pub mod args;
pub mod camera;
pub mod centroid;
pub mod channel;
pub mod config;
pub mod contour;
pub mod encode;
pub mod filter;
pub mod pipeline;
pub mod publish;
pub mod segment;
pub mod selector;
pub mod types;
pub mod worker;
