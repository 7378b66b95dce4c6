use crate::core::{FrameFormat, FrameRequest};
use crate::core::frame::{FRAME_HEIGHT, FRAME_WIDTH};
use crate::resilience::ErrorPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Camera preview transparency applied when video is enabled
pub const DEFAULT_PREVIEW_GHOST: u8 = 89;

/// Tunables of one extension instance.
///
/// Thresholds, the minimum capture interval and the tone frequency are
/// calibration constants and intentionally live outside this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensingConfig {
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub preview_ghost: u8,
    pub error_policy: ErrorPolicy,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            format: FrameFormat::ImageData,
            preview_ghost: DEFAULT_PREVIEW_GHOST,
            error_policy: ErrorPolicy::LogAndContinue,
        }
    }
}

impl SensingConfig {
    /// Overlay recognised keys of a JSON object on the defaults
    pub fn from_json(config: Value) -> Result<Self> {
        let mut parsed = Self::default();

        if let Some(width) = config["width"].as_u64() {
            parsed.width = u32::try_from(width).context("width out of range")?;
        }
        if let Some(height) = config["height"].as_u64() {
            parsed.height = u32::try_from(height).context("height out of range")?;
        }
        if let Some(ghost) = config["preview_ghost"].as_u64() {
            parsed.preview_ghost = ghost.min(100) as u8;
        }
        if !config["format"].is_null() {
            parsed.format = serde_json::from_value(config["format"].clone())
                .context("Unknown frame format")?;
        }
        if !config["error_policy"].is_null() {
            parsed.error_policy = serde_json::from_value(config["error_policy"].clone())
                .context("Invalid error policy")?;
        }

        Ok(parsed)
    }

    pub fn frame_request(&self) -> FrameRequest {
        FrameRequest {
            format: self.format,
            width: self.width,
            height: self.height,
        }
    }
}
