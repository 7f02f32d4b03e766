//! Per-receiver display state handed to the waterfall on every update

use serde::{Deserialize, Serialize};

use crate::{DisplayLevels, GainCalibration, WfError, WfResult};

/// Which renderer a receiver uses. Chosen when the receiver is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaterfallMode {
    /// Flat color-mapped raster, one pixel row per spectrum row
    #[default]
    Raster2D,
    /// Tilted ridge-line surface drawn on the GPU
    Mesh3D,
}

/// Palette selector for the 3D ridge surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Palette {
    #[default]
    Rainbow = 0,
    Ocean = 1,
    Green = 2,
    Gray = 3,
    Hot = 4,
    Cool = 5,
    /// White -> blue -> lilac -> red, driven by distance instead of power
    Plasma = 6,
}

impl Palette {
    pub const ALL: [Palette; 7] = [
        Palette::Rainbow,
        Palette::Ocean,
        Palette::Green,
        Palette::Gray,
        Palette::Hot,
        Palette::Cool,
        Palette::Plasma,
    ];

    /// Look up a palette by the numeric id used in saved settings
    pub fn from_id(id: u8) -> WfResult<Self> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(WfError::UnknownPalette(id))
    }

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Palette {
    type Error = WfError;

    fn try_from(id: u8) -> WfResult<Self> {
        Self::from_id(id)
    }
}

/// The (frequency, pan, zoom, sample rate) combination a history buffer
/// corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TuningTuple {
    /// Center frequency (Hz)
    pub frequency: i64,
    /// Horizontal offset into the captured spectrum (pixels/bins)
    pub pan: i32,
    pub zoom: u32,
    /// Sample rate (Hz)
    pub sample_rate: u32,
}

impl TuningTuple {
    pub fn new(frequency: i64, pan: i32, zoom: u32, sample_rate: u32) -> Self {
        Self {
            frequency,
            pan,
            zoom,
            sample_rate,
        }
    }

    /// Frequency span covered by one display unit when `units` columns
    /// show the whole (zoomed) bandwidth. `None` while any factor is zero.
    pub fn hz_per_unit(&self, units: usize) -> Option<f64> {
        if self.sample_rate == 0 || self.zoom == 0 || units == 0 {
            return None;
        }
        Some(self.sample_rate as f64 / (units as f64 * self.zoom as f64))
    }
}

/// Everything the waterfall reads from a receiver.
///
/// Owned by the host. The spectrum producer refreshes `pixel_samples` and the
/// tuning fields before each `update` call; the waterfall only reads them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiverDisplayState {
    /// Receiver index, used in log messages only
    pub id: usize,
    pub mode: WaterfallMode,
    /// Sample rate (Hz)
    pub sample_rate: u32,
    pub zoom: u32,
    pub pan: i32,
    /// Tuned center frequency (Hz)
    pub frequency: i64,
    pub levels: DisplayLevels,
    pub calibration: GainCalibration,
    pub palette: Palette,
    /// Power spectrum in dB, one value per pixel of the full capture
    pub pixel_samples: Vec<f32>,
}

impl ReceiverDisplayState {
    pub fn new(id: usize, mode: WaterfallMode, sample_rate: u32, pixel_count: usize) -> Self {
        Self {
            id,
            mode,
            sample_rate,
            zoom: 1,
            pixel_samples: vec![crate::SENTINEL_DB; pixel_count],
            ..Default::default()
        }
    }

    /// Snapshot of the live tuning. Reads each field once.
    #[inline]
    pub fn tuning(&self) -> TuningTuple {
        TuningTuple::new(self.frequency, self.pan, self.zoom, self.sample_rate)
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixel_samples.len()
    }

    /// Sample at `index` of the full capture, `None` outside of it
    #[inline]
    pub fn sample_at(&self, index: i64) -> Option<f32> {
        if index < 0 {
            return None;
        }
        self.pixel_samples.get(index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_palette_ids() {
        for (id, palette) in Palette::ALL.iter().enumerate() {
            assert_eq!(palette.id() as usize, id);
            assert_eq!(Palette::from_id(id as u8).unwrap(), *palette);
        }
        assert!(matches!(Palette::try_from(7), Err(WfError::UnknownPalette(7))));
    }

    #[test]
    fn test_hz_per_unit() {
        let tuning = TuningTuple::new(7_074_000, 0, 1, 48_000);
        assert_relative_eq!(tuning.hz_per_unit(800).unwrap(), 60.0);

        let zoomed = TuningTuple { zoom: 4, ..tuning };
        assert_relative_eq!(zoomed.hz_per_unit(800).unwrap(), 15.0);

        assert!(TuningTuple::default().hz_per_unit(800).is_none());
        assert!(tuning.hz_per_unit(0).is_none());
    }

    #[test]
    fn test_sample_at_bounds() {
        let mut rx = ReceiverDisplayState::new(0, WaterfallMode::Mesh3D, 48_000, 4);
        rx.pixel_samples = vec![-80.0, -70.0, -60.0, -50.0];

        assert_eq!(rx.sample_at(0), Some(-80.0));
        assert_eq!(rx.sample_at(3), Some(-50.0));
        assert_eq!(rx.sample_at(-1), None);
        assert_eq!(rx.sample_at(4), None);
    }
}
