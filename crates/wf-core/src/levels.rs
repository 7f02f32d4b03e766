//! Color-mapping range (dB)

use serde::{Deserialize, Serialize};

/// User display preferences for the color range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayLevels {
    /// Level mapped to the lowest color (dB)
    pub low: f32,
    /// Level mapped to the highest color (dB)
    pub high: f32,
    /// Derive the range from the mean of each row instead (2D raster only)
    pub auto_scale: bool,
}

impl Default for DisplayLevels {
    fn default() -> Self {
        Self {
            low: -100.0,
            high: -40.0,
            auto_scale: false,
        }
    }
}

impl DisplayLevels {
    pub fn new(low: f32, high: f32) -> Self {
        Self {
            low,
            high,
            auto_scale: false,
        }
    }

    /// Range to map `row` with.
    ///
    /// With auto scale the floor sits `floor_offset` dB from the mean of the
    /// row (after `offset_db`), and the range spans `span` dB above it.
    pub fn resolve(&self, row: &[f32], offset_db: f32, floor_offset: f32, span: f32) -> (f32, f32) {
        if !self.auto_scale || row.is_empty() {
            return (self.low, self.high);
        }
        let sum: f32 = row.iter().sum();
        let low = sum / row.len() as f32 + offset_db + floor_offset;
        (low, low + span)
    }
}
