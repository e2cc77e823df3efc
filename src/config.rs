// Application settings, loaded from JSON. Every field is optional in the file.

use crate::compositor::DEFAULT_PLACEHOLDER_LABEL;
use crate::error::Result;
use crate::types::PipConfigPatch;
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub pip: PipConfigPatch,
    pub camera: CameraConfig,
    pub window: WindowConfig,
    pub placeholder_label: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pip: PipConfigPatch::default(),
            camera: CameraConfig::default(),
            window: WindowConfig::default(),
            placeholder_label: DEFAULT_PLACEHOLDER_LABEL.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { index: 0, width: 640, height: 480 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowConfig {
    pub title: String,
    pub width: usize,
    pub height: usize,
    pub target_fps: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "PiP Overlay".to_string(), width: 960, height: 540, target_fps: 60 }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let cfg = Self::from_json(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded config");
        Ok(cfg)
    }
}
