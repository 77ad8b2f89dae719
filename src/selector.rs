use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::pipeline::Pipeline;
use crate::types::Frame;

/// Closed set of tracking variants. A closed enum instead of string keys so a
/// bad name is a parse error at the control boundary, not a silent lookup
/// miss mid-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PipelineKind {
    Cube,
    Tape,
}

impl FromStr for PipelineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cube" => Ok(PipelineKind::Cube),
            "tape" => Ok(PipelineKind::Tape),
            other => bail!("unknown pipeline '{other}' (expected cube or tape)"),
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Cube => write!(f, "cube"),
            PipelineKind::Tape => write!(f, "tape"),
        }
    }
}

struct SelectorInner {
    registry: Vec<(PipelineKind, Box<dyn Pipeline>)>,
    active: Option<PipelineKind>,
}

/// Owns the variant registry and the active slot.
///
/// One mutex guards both the active pointer and the variants themselves, held
/// across the whole lookup-and-invoke of `process`: a `select` issued while a
/// frame is in flight blocks until that frame finishes, and the next `process`
/// sees the new variant atomically.
pub struct PipelineSelector {
    inner: Mutex<SelectorInner>,
}

impl PipelineSelector {
    pub fn new(registry: Vec<(PipelineKind, Box<dyn Pipeline>)>, active: Option<PipelineKind>) -> Self {
        Self {
            inner: Mutex::new(SelectorInner { registry, active }),
        }
    }

    /// Swap the active variant; `None` deactivates processing entirely.
    pub fn select(&self, kind: Option<PipelineKind>) -> Result<()> {
        let mut inner = self.inner.lock().expect("selector lock poisoned");
        if let Some(kind) = kind {
            if !inner.registry.iter().any(|(k, _)| *k == kind) {
                bail!("pipeline '{kind}' is not registered");
            }
        }
        inner.active = kind;
        Ok(())
    }

    pub fn active(&self) -> Option<PipelineKind> {
        self.inner.lock().expect("selector lock poisoned").active
    }

    /// Forward the frame to the active variant. `Ok(None)` when no variant is
    /// active; otherwise the variant's smoothed error.
    pub fn process(&self, frame: &Frame) -> Result<Option<f64>> {
        let mut inner = self.inner.lock().expect("selector lock poisoned");
        let Some(kind) = inner.active else {
            return Ok(None);
        };
        let pipeline = inner
            .registry
            .iter_mut()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| p)
            .expect("active pipeline missing from registry");
        pipeline.process(frame).map(Some)
    }
}
