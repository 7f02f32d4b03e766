//! Gain/attenuation corrections folded into the dB scale before color mapping

use serde::{Deserialize, Serialize};

/// Filter board fitted in front of the ADC, with its switch settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrontEnd {
    #[default]
    None,
    /// ALEX board: 10 dB attenuator steps, 20 dB preamp
    Alex { attenuation: u8, preamp: bool },
    /// CHARLY25 board: 12 dB attenuator steps, 18 dB preamp and dither stages
    Charly25 {
        attenuation: u8,
        preamp: bool,
        dither: bool,
    },
}

impl FrontEnd {
    /// Correction contributed by the board (dB)
    pub fn offset_db(self) -> f32 {
        match self {
            FrontEnd::None => 0.0,
            FrontEnd::Alex {
                attenuation,
                preamp,
            } => 10.0 * attenuation as f32 - 20.0 * preamp as u8 as f32,
            FrontEnd::Charly25 {
                attenuation,
                preamp,
                dither,
            } => {
                12.0 * attenuation as f32
                    - 18.0 * preamp as u8 as f32
                    - 18.0 * dither as u8 as f32
            }
        }
    }
}

/// Calibration values supplied by the radio/band configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GainCalibration {
    /// Global receive gain calibration (dB)
    pub rx_gain_calibration: i32,
    /// Gain configured for the current band (dB)
    pub band_gain: i32,
    /// ADC input index the receiver is fed from
    pub adc: u8,
    /// ADC attenuation (dB)
    pub adc_attenuation: f32,
    /// ADC gain (dB)
    pub adc_gain: f32,
    pub front_end: FrontEnd,
}

impl GainCalibration {
    /// Total offset added to every spectrum sample (dB).
    ///
    /// Front-end boards only sit in front of the first ADC.
    pub fn offset_db(&self) -> f32 {
        let calib = self.rx_gain_calibration - self.band_gain;
        let mut offset = calib as f32 + self.adc_attenuation - self.adc_gain;
        if self.adc == 0 {
            offset += self.front_end.offset_db();
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plain_offset() {
        let cal = GainCalibration {
            rx_gain_calibration: 14,
            band_gain: 4,
            adc_attenuation: 6.0,
            adc_gain: 2.0,
            ..Default::default()
        };
        assert_relative_eq!(cal.offset_db(), 14.0);
    }

    #[test]
    fn test_front_end_offsets() {
        let alex = GainCalibration {
            front_end: FrontEnd::Alex {
                attenuation: 2,
                preamp: true,
            },
            ..Default::default()
        };
        assert_relative_eq!(alex.offset_db(), 0.0);

        let charly = GainCalibration {
            front_end: FrontEnd::Charly25 {
                attenuation: 3,
                preamp: true,
                dither: false,
            },
            ..Default::default()
        };
        assert_relative_eq!(charly.offset_db(), 18.0);
    }

    #[test]
    fn test_front_end_ignored_on_second_adc() {
        let cal = GainCalibration {
            adc: 1,
            front_end: FrontEnd::Alex {
                attenuation: 3,
                preamp: false,
            },
            ..Default::default()
        };
        assert_relative_eq!(cal.offset_db(), 0.0);
    }
}
