//! Waterfall tunables

use serde::{Deserialize, Serialize};

use crate::{WfError, WfResult};

/// Waterfall configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterfallConfig {
    /// Rows kept by the 3D history ring
    pub history_depth: usize,
    /// Rows after a (re)initialization during which the upstream AGC settles
    pub warmup_rows: u32,
    /// Bin count used when the surface has not been laid out yet
    pub fallback_width: u32,
    /// Tilt angle the 3D camera starts with
    pub initial_tilt: f32,
    /// Camera distance the 3D view starts with
    pub initial_zoom: f32,
    /// Tilt change per pixel of vertical drag
    pub tilt_sensitivity: f32,
    /// Camera distance change per wheel notch
    pub zoom_step: f32,
    /// Auto scale: floor relative to the row mean (dB)
    pub auto_floor_offset: f32,
    /// Auto scale: range above the floor (dB)
    pub auto_span: f32,
}

impl Default for WaterfallConfig {
    fn default() -> Self {
        Self {
            history_depth: 120,
            warmup_rows: 5,
            fallback_width: 800,
            initial_tilt: 2.8,
            initial_zoom: 2.0,
            tilt_sensitivity: 0.002,
            zoom_step: 0.15,
            auto_floor_offset: -5.0,
            auto_span: 55.0,
        }
    }
}

impl WaterfallConfig {
    /// Check the values the renderers rely on
    pub fn validate(&self) -> WfResult<()> {
        if self.history_depth < 3 {
            return Err(WfError::InvalidConfig(format!(
                "history_depth must be at least 3, got {}",
                self.history_depth
            )));
        }
        if self.fallback_width <= 2 {
            return Err(WfError::InvalidConfig(format!(
                "fallback_width must exceed 2, got {}",
                self.fallback_width
            )));
        }
        if !(self.tilt_sensitivity > 0.0) {
            return Err(WfError::InvalidConfig("tilt_sensitivity must be positive".into()));
        }
        if !(self.zoom_step > 0.0) {
            return Err(WfError::InvalidConfig("zoom_step must be positive".into()));
        }
        if !(self.auto_span > 0.0) {
            return Err(WfError::InvalidConfig("auto_span must be positive".into()));
        }
        Ok(())
    }
}
