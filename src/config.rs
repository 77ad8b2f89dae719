use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::pipeline::VariantConfig;

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub worker: WorkerConfig,
    pub cube: VariantConfig,
    pub tape: VariantConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Fixed delay between capture iterations, bounding the loop rate.
    pub cadence_ms: u64,
    /// Consumer-side polling interval.
    pub poll_ms: u64,
    /// Bounded channel depths; oldest entries are dropped on overflow.
    pub data_depth: usize,
    pub feed_depth: usize,
    pub jpeg_quality: u8,
    /// Per-frame position trace on stdout.
    pub verbose: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 1920,
            height: 1080,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cadence_ms: 50,
            poll_ms: 20,
            data_depth: 8,
            feed_depth: 2,
            jpeg_quality: 80,
            verbose: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            worker: WorkerConfig::default(),
            cube: VariantConfig::cube(),
            tape: VariantConfig::tape(),
        }
    }
}

impl AppConfig {
    const PATH: &'static str = "config.json";

    /// Load `config.json` from the working directory, falling back to (and
    /// persisting) defaults when it is missing or unreadable. Missing fields
    /// fill in from defaults via `#[serde(default)]`.
    pub fn load() -> Result<Self> {
        let config = if Path::new(Self::PATH).exists() {
            let content = fs::read_to_string(Self::PATH)?;
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(config) => {
                    println!("Loaded configuration from {}", Self::PATH);
                    config
                }
                Err(err) => {
                    eprintln!("Failed to parse {}: {}. Using defaults.", Self::PATH, err);
                    AppConfig::default()
                }
            }
        } else {
            println!("No {} found. Writing defaults.", Self::PATH);
            let config = AppConfig::default();
            config.save()?;
            config
        };
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(Self::PATH, content)?;
        Ok(())
    }
}
