//! Color mapping for both waterfall modes
//!
//! - 2D: seven-band heat gradient over the display range, 8-bit RGB
//! - 3D: noise-floor cutoff, quadratic emphasis, and a distance blend
//!   towards the palette color

use wf_core::Palette;

// ═══════════════════════════════════════════════════════════════════════════
// 2D HEAT GRADIENT
// ═══════════════════════════════════════════════════════════════════════════

/// Color for samples at or below the low level (black)
pub const LOW_COLOR: [u8; 3] = [0, 0, 0];
/// Color for samples above the high level (yellow)
pub const HIGH_COLOR: [u8; 3] = [255, 255, 0];

/// Maps dB values onto the raster gradient
///
/// black -> blue -> cyan -> green -> yellow -> red -> magenta -> pink-white
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatGradient {
    low: f32,
    high: f32,
    range_inv: f32,
}

impl HeatGradient {
    pub fn new(low: f32, high: f32) -> Self {
        Self {
            low,
            high,
            range_inv: 1.0 / (high - low),
        }
    }

    #[inline]
    pub fn low(&self) -> f32 {
        self.low
    }

    #[inline]
    pub fn high(&self) -> f32 {
        self.high
    }

    /// Color for one sample (dB, offset already applied)
    #[inline]
    pub fn map(&self, sample: f32) -> [u8; 3] {
        if sample < self.low {
            LOW_COLOR
        } else if sample > self.high {
            HIGH_COLOR
        } else {
            Self::interior((sample - self.low) * self.range_inv)
        }
    }

    /// Colorize a whole row into packed RGB
    pub fn map_row(&self, samples: impl Iterator<Item = Option<f32>>, out: &mut [u8]) {
        for (pixel, sample) in out.chunks_exact_mut(3).zip(samples) {
            let rgb = match sample {
                Some(s) => self.map(s),
                None => LOW_COLOR,
            };
            pixel.copy_from_slice(&rgb);
        }
    }

    fn interior(percent: f32) -> [u8; 3] {
        let [low_r, low_g, low_b] = LOW_COLOR.map(|c| c as f32);

        if percent < 0.222222 {
            let lp = percent * 4.5;
            [
                ((1.0 - lp) * low_r) as u8,
                ((1.0 - lp) * low_g) as u8,
                (low_b + lp * (255.0 - low_b)) as u8,
            ]
        } else if percent < 0.333333 {
            let lp = (percent - 0.222222) * 9.0;
            [0, (lp * 255.0) as u8, 255]
        } else if percent < 0.444444 {
            // this band has always been evaluated in double precision
            let lp = (percent as f64 - 0.333333) * 9.0;
            [0, 255, ((1.0 - lp) * 255.0) as u8]
        } else if percent < 0.555555 {
            let lp = (percent - 0.444444) * 9.0;
            [(lp * 255.0) as u8, 255, 0]
        } else if percent < 0.777777 {
            let lp = (percent - 0.555555) * 4.5;
            [255, ((1.0 - lp) * 255.0) as u8, 0]
        } else if percent < 0.888888 {
            let lp = (percent - 0.777777) * 9.0;
            [255, 0, (lp * 255.0) as u8]
        } else {
            let lp = (percent - 0.888888) * 9.0;
            [
                ((0.75 + 0.25 * (1.0 - lp)) * 255.0) as u8,
                (lp * 255.0 * 0.5) as u8,
                255,
            ]
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 3D PALETTES
// ═══════════════════════════════════════════════════════════════════════════

/// Fraction of the display range treated as noise floor (black, flat)
pub const NOISE_FLOOR: f32 = 0.35;
/// Height gain applied to the emphasized signal before clamping
pub const HEIGHT_GAIN: f32 = 1.8;

/// Sample a palette ramp at `p` (0.0-1.0), RGB in 0.0-1.0
pub fn palette_ramp(palette: Palette, p: f32) -> [f32; 3] {
    let p = p.clamp(0.0, 1.0);

    match palette {
        Palette::Rainbow => {
            if p < 0.25 {
                let t = p / 0.25;
                [0.0, t, 1.0]
            } else if p < 0.5 {
                let t = (p - 0.25) / 0.25;
                [0.0, 1.0, 1.0 - t]
            } else if p < 0.75 {
                let t = (p - 0.5) / 0.25;
                [t, 1.0, 0.0]
            } else {
                let t = (p - 0.75) / 0.25;
                [1.0, 1.0 - t * 0.5, 0.0]
            }
        }
        Palette::Ocean => [p * 0.3, 0.5 + p * 0.5, 0.7 + p * 0.3],
        Palette::Green => [p * 0.2, 0.3 + p * 0.7, p * 0.1],
        Palette::Gray => [p, p, p],
        Palette::Hot => {
            // black -> red -> yellow -> white
            if p < 0.33 {
                [p / 0.33, 0.0, 0.0]
            } else if p < 0.66 {
                [1.0, (p - 0.33) / 0.33, 0.0]
            } else {
                [1.0, 1.0, (p - 0.66) / 0.34]
            }
        }
        Palette::Cool => [p, 1.0 - p * 0.5, 1.0 - p * 0.5],
        Palette::Plasma => {
            // white -> blue -> lilac -> red
            if p < 0.33 {
                let t = p / 0.33;
                [1.0 - t * 0.8, 1.0 - t * 0.6, 1.0]
            } else if p < 0.66 {
                let t = (p - 0.33) / 0.33;
                [0.2 + t * 0.5, 0.4 + t * 0.1, 1.0]
            } else {
                let t = (p - 0.66) / 0.34;
                [0.7 + t * 0.3, 0.5 - t * 0.5, 1.0 - t]
            }
        }
    }
}

/// Color and height of one ridge vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgeSample {
    /// RGBA, 0.0-1.0
    pub color: [f32; 4],
    /// Normalized height (0.0-1.0)
    pub height: f32,
}

impl RidgeSample {
    pub const FLOOR: Self = Self {
        color: [0.0, 0.0, 0.0, 1.0],
        height: 0.0,
    };
}

/// Map a dB value to ridge color and height.
///
/// `dist01` is 0.0 for the newest row and 1.0 for the oldest. Power picks the
/// height and brightness, distance picks the hue.
pub fn ridge_sample(sample_db: f32, low: f32, high: f32, dist01: f32, palette: Palette) -> RidgeSample {
    let p = (sample_db - low) / (high - low);
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };

    if p < NOISE_FLOOR {
        return RidgeSample::FLOOR;
    }

    let signal = (p - NOISE_FLOOR) / (1.0 - NOISE_FLOOR);
    let signal = signal * signal;
    let height = (signal * HEIGHT_GAIN).clamp(0.0, 1.0);

    let [r, g, b] = match palette {
        Palette::Plasma => palette_ramp(Palette::Plasma, dist01),
        other => {
            let [tr, tg, tb] = palette_ramp(other, 1.0);
            [
                1.0 + dist01 * (tr - 1.0),
                1.0 + dist01 * (tg - 1.0),
                1.0 + dist01 * (tb - 1.0),
            ]
        }
    };

    RidgeSample {
        color: [r * signal, g * signal, b * signal, 1.0],
        height,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════
