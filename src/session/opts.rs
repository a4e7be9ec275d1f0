use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{StageError, StageResult};

/// Options of a [`StageSession`](crate::StageSession).
///
/// Every field has a default, so a JSON config only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StageOpts {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Zoom applied when the stage is created.
    pub initial_zoom: f64,
    /// Multiplier of one zoom step.
    pub zoom_factor: f64,
    /// Pan offset applied once a document has finished parsing, forcing a repaint.
    pub end_nudge: [f64; 2],
    /// Background of the viewport, straight RGBA8.
    pub clear_rgba: [u8; 4],
    /// Random draws per identifier before the deterministic sweep.
    pub id_max_retries: u32,
    /// Seed of the identifier stream; the clock when unset.
    pub id_seed: Option<u64>,
    /// Font file used for any family that has no bytes of its own.
    pub default_font: Option<PathBuf>,
    /// Directory the local font service reads `<Family>.ttf` from.
    pub font_dir: Option<PathBuf>,
}

impl Default for StageOpts {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            initial_zoom: 0.5,
            zoom_factor: 1.1,
            end_nudge: [0.1, 0.1],
            clear_rgba: [255, 255, 255, 255],
            id_max_retries: 16,
            id_seed: None,
            default_font: None,
            font_dir: None,
        }
    }
}

impl StageOpts {
    /// Read options from a JSON file.
    pub fn from_path(path: &Path) -> StageResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read stage options '{}'", path.display()))?;
        let opts: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse stage options '{}'", path.display()))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> StageResult<()> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(StageError::validation("viewport width and height must be > 0"));
        }
        if !(self.initial_zoom.is_finite() && self.initial_zoom > 0.0) {
            return Err(StageError::validation("initial_zoom must be a positive number"));
        }
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 1.0) {
            return Err(StageError::validation("zoom_factor must be greater than 1"));
        }
        if !self.end_nudge.iter().all(|v| v.is_finite()) {
            return Err(StageError::validation("end_nudge must be finite"));
        }
        Ok(())
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn with_initial_zoom(mut self, zoom: f64) -> Self {
        self.initial_zoom = zoom;
        self
    }

    pub fn with_clear_rgba(mut self, rgba: [u8; 4]) -> Self {
        self.clear_rgba = rgba;
        self
    }

    pub fn with_id_seed(mut self, seed: u64) -> Self {
        self.id_seed = Some(seed);
        self
    }

    pub fn with_default_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_font = Some(path.into());
        self
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
