//! Frequency alignment between a history buffer and the live tuning
//!
//! A waterfall buffer shows the spectrum for the tuning it was filled at.
//! Whenever the receiver is retuned or panned the buffer either moves
//! sideways by whole units (pixels or bins) or is thrown away.
//!
//! Retuning usually arrives in many small steps. The remembered frequency
//! is only advanced by the part that was actually shifted, so fractions of a
//! unit accumulate until they add up to a whole one.

use wf_core::TuningTuple;

/// Which kind of buffer the aligner serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignMode {
    /// 2D raster, one unit per pixel
    Pixels,
    /// 3D history ring, one unit per bin; also resets when the new center
    /// leaves the old visible span
    Bins,
}

/// Why the buffer has to be cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// Nothing remembered yet (or remembered frequency is zero)
    Unset,
    SampleRate,
    Zoom,
    /// Shift would move everything out of the buffer
    ShiftTooLarge,
    /// Frequency moved by more than half the sample rate
    OutOfSpan,
    /// Sample rate or zoom is zero, no unit width can be derived
    Degenerate,
    /// Buffer geometry changed underneath the aligner
    Geometry,
}

/// Decision for one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Buffer still matches, ingest normally
    Unchanged,
    /// Move the buffer by `units` (positive = right). `retuned` is set when
    /// part of the shift came from a frequency change.
    Shift { units: i32, retuned: bool },
    /// Clear the buffer; the live tuning has been adopted
    Reset(ResetReason),
}

/// What one `update` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// `None` when the frame was skipped before alignment (no surface yet,
    /// degenerate geometry)
    pub alignment: Option<Alignment>,
    /// Whether the new spectrum row went into the buffer
    pub ingested: bool,
}

impl UpdateOutcome {
    pub const SKIPPED: Self = Self {
        alignment: None,
        ingested: false,
    };
}

/// Tracks the tuning a buffer represents
#[derive(Debug, Clone)]
pub struct FrequencyAligner {
    mode: AlignMode,
    remembered: Option<TuningTuple>,
}

impl FrequencyAligner {
    pub fn new(mode: AlignMode) -> Self {
        Self {
            mode,
            remembered: None,
        }
    }

    #[inline]
    pub fn mode(&self) -> AlignMode {
        self.mode
    }

    /// Tuning the buffer currently corresponds to
    #[inline]
    pub fn remembered(&self) -> Option<TuningTuple> {
        self.remembered
    }

    /// Forget the remembered tuning; the next `align` resets
    pub fn invalidate(&mut self) {
        self.remembered = None;
    }

    /// Decide how the buffer follows `live`. `units` is the buffer width in
    /// pixels or bins.
    pub fn align(&mut self, live: TuningTuple, units: usize) -> Alignment {
        let mut remembered = match self.remembered {
            Some(r) if r.frequency != 0 => r,
            _ => return self.reset(live, ResetReason::Unset),
        };

        if remembered.sample_rate != live.sample_rate {
            return self.reset(live, ResetReason::SampleRate);
        }
        if remembered.zoom != live.zoom {
            return self.reset(live, ResetReason::Zoom);
        }
        if remembered.frequency == live.frequency && remembered.pan == live.pan {
            return Alignment::Unchanged;
        }

        let Some(hz_per_unit) = live.hz_per_unit(units) else {
            return self.reset(live, ResetReason::Degenerate);
        };

        let delta_hz = remembered.frequency - live.frequency;
        if self.mode == AlignMode::Bins && delta_hz.abs() > i64::from(live.sample_rate / 2) {
            return self.reset(live, ResetReason::OutOfSpan);
        }

        // nearest whole unit; the remainder stays in the remembered frequency
        let freq_units = (delta_hz as f64 / hz_per_unit).round() as i64;
        let pan_units = i64::from(remembered.pan) - i64::from(live.pan);
        let shift = freq_units + pan_units;

        if shift.abs() >= units as i64 {
            return self.reset(live, ResetReason::ShiftTooLarge);
        }

        if freq_units != 0 {
            remembered.frequency -= (freq_units as f64 * hz_per_unit).round() as i64;
        }
        remembered.pan = live.pan;
        self.remembered = Some(remembered);

        if shift == 0 && freq_units == 0 {
            Alignment::Unchanged
        } else {
            Alignment::Shift {
                units: shift as i32,
                retuned: freq_units != 0,
            }
        }
    }

    /// Adopt `live` unconditionally, e.g. after the buffer was reallocated
    pub fn reset(&mut self, live: TuningTuple, reason: ResetReason) -> Alignment {
        log::debug!(
            "waterfall {:?} reset ({:?}) at {} Hz, pan {}, zoom {}",
            self.mode,
            reason,
            live.frequency,
            live.pan,
            live.zoom
        );
        self.remembered = Some(live);
        Alignment::Reset(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: usize = 800;

    fn tuning(frequency: i64, pan: i32) -> TuningTuple {
        TuningTuple::new(frequency, pan, 1, 48_000)
    }

    fn primed(mode: AlignMode, live: TuningTuple) -> FrequencyAligner {
        let mut aligner = FrequencyAligner::new(mode);
        assert_eq!(aligner.align(live, WIDTH), Alignment::Reset(ResetReason::Unset));
        aligner
    }

    #[test]
    fn test_first_update_resets_and_adopts() {
        let live = tuning(14_074_000, 3);
        let aligner = primed(AlignMode::Pixels, live);
        assert_eq!(aligner.remembered(), Some(live));
    }

    #[test]
    fn test_zero_frequency_counts_as_unset() {
        let mut aligner = primed(AlignMode::Pixels, tuning(0, 0));
        assert_eq!(
            aligner.align(tuning(0, 0), WIDTH),
            Alignment::Reset(ResetReason::Unset)
        );
    }

    #[test]
    fn test_unchanged_tuning() {
        let live = tuning(7_074_000, 0);
        let mut aligner = primed(AlignMode::Pixels, live);
        assert_eq!(aligner.align(live, WIDTH), Alignment::Unchanged);
        assert_eq!(aligner.remembered(), Some(live));
    }

    #[test]
    fn test_exact_600_hz_step() {
        let mut aligner = primed(AlignMode::Pixels, tuning(7_074_000, 0));
        let live = tuning(7_073_400, 0);

        assert_eq!(
            aligner.align(live, WIDTH),
            Alignment::Shift {
                units: 10,
                retuned: true
            }
        );
        assert_eq!(aligner.remembered(), Some(live));
    }

    #[test]
    fn test_sub_unit_steps_accumulate() {
        // 60 Hz per pixel, tuned up in 25 Hz encoder ticks
        let start = 7_074_000;
        let mut aligner = primed(AlignMode::Pixels, tuning(start, 0));

        assert_eq!(aligner.align(tuning(start + 25, 0), WIDTH), Alignment::Unchanged);
        // 50 Hz is closer to one pixel than to none
        assert_eq!(
            aligner.align(tuning(start + 50, 0), WIDTH),
            Alignment::Shift {
                units: -1,
                retuned: true
            }
        );
        // one pixel worth was consumed, the buffer is now 10 Hz ahead
        assert_eq!(aligner.remembered().unwrap().frequency, start + 60);

        assert_eq!(aligner.align(tuning(start + 75, 0), WIDTH), Alignment::Unchanged);
        assert_eq!(aligner.remembered().unwrap().frequency, start + 60);
        assert_eq!(
            aligner.align(tuning(start + 100, 0), WIDTH),
            Alignment::Shift {
                units: -1,
                retuned: true
            }
        );
        assert_eq!(aligner.remembered().unwrap().frequency, start + 120);
    }

    #[test]
    fn test_fractional_step_rounds_to_nearest_unit() {
        let start = 7_074_000;
        let mut aligner = primed(AlignMode::Pixels, tuning(start, 0));

        // 590 Hz at 60 Hz per pixel is 9.83 pixels
        assert_eq!(
            aligner.align(tuning(start - 590, 0), WIDTH),
            Alignment::Shift {
                units: 10,
                retuned: true
            }
        );
        assert_eq!(aligner.remembered().unwrap().frequency, start - 600);

        // the 10 Hz overshoot is carried, not re-applied
        assert_eq!(aligner.align(tuning(start - 590, 0), WIDTH), Alignment::Unchanged);
        assert_eq!(
            aligner.align(tuning(start - 640, 0), WIDTH),
            Alignment::Shift {
                units: 1,
                retuned: true
            }
        );
        assert_eq!(aligner.remembered().unwrap().frequency, start - 660);
    }

    #[test]
    fn test_half_unit_rounds_away_from_zero() {
        let start = 7_074_000;
        let mut aligner = primed(AlignMode::Pixels, tuning(start, 0));
        assert_eq!(
            aligner.align(tuning(start + 30, 0), WIDTH),
            Alignment::Shift {
                units: -1,
                retuned: true
            }
        );

        let mut aligner = primed(AlignMode::Pixels, tuning(start, 0));
        assert_eq!(
            aligner.align(tuning(start - 30, 0), WIDTH),
            Alignment::Shift {
                units: 1,
                retuned: true
            }
        );
    }

    #[test]
    fn test_pan_only_shift() {
        let mut aligner = primed(AlignMode::Pixels, tuning(7_074_000, 10));
        assert_eq!(
            aligner.align(tuning(7_074_000, 4), WIDTH),
            Alignment::Shift {
                units: 6,
                retuned: false
            }
        );
        assert_eq!(aligner.remembered().unwrap().pan, 4);
    }

    #[test]
    fn test_opposing_freq_and_pan_cancel() {
        // frequency says one pixel right, pan says one pixel left
        let mut aligner = primed(AlignMode::Pixels, tuning(7_074_000, 0));
        assert_eq!(
            aligner.align(tuning(7_073_940, 1), WIDTH),
            Alignment::Shift {
                units: 0,
                retuned: true
            }
        );
    }

    #[test]
    fn test_large_shift_resets() {
        let mut aligner = primed(AlignMode::Pixels, tuning(7_074_000, 0));
        // exactly one buffer width
        let live = tuning(7_074_000 - 800 * 60, 0);
        assert_eq!(
            aligner.align(live, WIDTH),
            Alignment::Reset(ResetReason::ShiftTooLarge)
        );
        assert_eq!(aligner.remembered(), Some(live));

        let mut aligner = primed(AlignMode::Pixels, tuning(7_074_000, 0));
        assert_eq!(
            aligner.align(tuning(7_074_000, -800), WIDTH),
            Alignment::Reset(ResetReason::ShiftTooLarge)
        );
    }

    #[test]
    fn test_sample_rate_and_zoom_reset() {
        let mut aligner = primed(AlignMode::Bins, tuning(7_074_000, 0));
        let faster = TuningTuple {
            sample_rate: 96_000,
            ..tuning(7_074_000, 0)
        };
        assert_eq!(
            aligner.align(faster, WIDTH),
            Alignment::Reset(ResetReason::SampleRate)
        );

        let zoomed = TuningTuple { zoom: 2, ..faster };
        assert_eq!(aligner.align(zoomed, WIDTH), Alignment::Reset(ResetReason::Zoom));
        assert_eq!(aligner.remembered(), Some(zoomed));
    }

    #[test]
    fn test_bins_reset_outside_half_span() {
        let mut aligner = primed(AlignMode::Bins, tuning(7_074_000, 0));
        assert_eq!(
            aligner.align(tuning(7_074_000 + 24_001, 0), WIDTH),
            Alignment::Reset(ResetReason::OutOfSpan)
        );

        // half the sample rate is still a shift
        let mut aligner = primed(AlignMode::Bins, tuning(7_074_000, 0));
        assert_eq!(
            aligner.align(tuning(7_074_000 + 24_000, 0), WIDTH),
            Alignment::Shift {
                units: -400,
                retuned: true
            }
        );
    }

    #[test]
    fn test_pixels_ignore_half_span_rule() {
        let mut aligner = primed(AlignMode::Pixels, tuning(7_074_000, 0));
        assert!(matches!(
            aligner.align(tuning(7_074_000 + 30_000, 0), WIDTH),
            Alignment::Shift { units: -500, .. }
        ));
    }

    #[test]
    fn test_invalidate_forces_reset() {
        let live = tuning(7_074_000, 0);
        let mut aligner = primed(AlignMode::Bins, live);
        aligner.invalidate();
        assert!(aligner.remembered().is_none());
        assert_eq!(aligner.align(live, WIDTH), Alignment::Reset(ResetReason::Unset));
    }

    #[test]
    fn test_degenerate_zoom() {
        let broken = TuningTuple::new(7_074_000, 0, 0, 48_000);
        let mut aligner = primed(AlignMode::Pixels, broken);
        assert_eq!(
            aligner.align(TuningTuple { frequency: 7_074_100, ..broken }, WIDTH),
            Alignment::Reset(ResetReason::Degenerate)
        );
    }
}
