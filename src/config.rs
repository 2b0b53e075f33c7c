// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::AnalyserParams;
use crate::effects::OverSample;
use crate::graph::GraphSettings;
use crate::recorder::DEFAULT_FILE_NAME;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub file_name: String,
    pub analyser: AnalyserParams,
    pub pitch: f32,
    pub distortion: f32,
    pub oversample: OverSample,
    pub canvas_width: usize,
    pub canvas_height: usize,
    pub fps: u32,
    pub ring_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_name: DEFAULT_FILE_NAME.to_string(),
            analyser: AnalyserParams::default(),
            pitch: 1.0,
            distortion: 400.0,
            oversample: OverSample::X4,
            canvas_width: 300,
            canvas_height: 150,
            fps: 30,
            ring_capacity: 192_000,
        }
    }
}

impl AppConfig {
    pub fn load_from_disk(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Graph settings for a new session, with the current slider positions.
    pub fn graph_settings(&self, pitch: f32, distortion: Option<f32>) -> GraphSettings {
        GraphSettings {
            pitch,
            distortion,
            oversample: self.oversample,
            analyser: self.analyser,
            ring_capacity: self.ring_capacity,
        }
    }
}
