//! 2D raster waterfall
//!
//! RGB pixel buffer, newest row on top. Each accepted update scrolls the
//! whole buffer down by one row and colorizes the new spectrum into row 0.

use std::sync::atomic::{AtomicBool, Ordering};

use wf_core::{ReceiverDisplayState, WaterfallConfig};

use crate::alignment::{AlignMode, Alignment, FrequencyAligner, UpdateOutcome};
use crate::color::HeatGradient;

// ═══════════════════════════════════════════════════════════════════════════
// SURFACE
// ═══════════════════════════════════════════════════════════════════════════

/// Packed RGB pixel buffer (3 bytes per pixel, no row padding)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSurface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl RasterSurface {
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Create a black surface
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * Self::BYTES_PER_PIXEL],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn rowstride(&self) -> usize {
        self.width * Self::BYTES_PER_PIXEL
    }

    /// Raw RGB bytes, row-major
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.rowstride();
        &self.pixels[y * stride..(y + 1) * stride]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let stride = self.rowstride();
        &mut self.pixels[y * stride..(y + 1) * stride]
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * Self::BYTES_PER_PIXEL;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Black out everything
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Move every row sideways by `units` pixels (positive = right) and black
    /// out the uncovered columns.
    ///
    /// One block move over the whole buffer; pixels that wrap into the
    /// neighbouring row land in the cleared strip.
    pub fn shift_horizontal(&mut self, units: i32) {
        if units == 0 || self.pixels.is_empty() {
            return;
        }
        let n = units.unsigned_abs() as usize;
        if n >= self.width {
            self.clear();
            return;
        }

        let len = self.pixels.len();
        let bytes = n * Self::BYTES_PER_PIXEL;
        let stride = self.rowstride();

        if units > 0 {
            self.pixels.copy_within(0..len - bytes, bytes);
            for row in self.pixels.chunks_exact_mut(stride) {
                row[..bytes].fill(0);
            }
        } else {
            self.pixels.copy_within(bytes..len, 0);
            for row in self.pixels.chunks_exact_mut(stride) {
                row[stride - bytes..].fill(0);
            }
        }
    }

    /// Move all rows down by one; row 0 keeps its old content until rewritten
    pub fn scroll_down(&mut self) {
        if self.height < 2 {
            return;
        }
        let stride = self.rowstride();
        let len = self.pixels.len();
        self.pixels.copy_within(0..len - stride, stride);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RASTER WATERFALL
// ═══════════════════════════════════════════════════════════════════════════

/// 2D waterfall for one receiver
#[derive(Debug)]
pub struct RasterWaterfall {
    config: WaterfallConfig,
    surface: Option<RasterSurface>,
    aligner: FrequencyAligner,
    redraw: AtomicBool,
}

impl RasterWaterfall {
    pub fn new(config: WaterfallConfig) -> Self {
        Self {
            config,
            surface: None,
            aligner: FrequencyAligner::new(AlignMode::Pixels),
            redraw: AtomicBool::new(false),
        }
    }

    /// (Re)create the pixel buffer for the given widget size.
    ///
    /// Always starts black. A zero dimension drops the surface until the
    /// next configure.
    pub fn configure(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("raster waterfall surface dropped ({width}x{height})");
            self.surface = None;
            return;
        }
        log::debug!("raster waterfall surface {width}x{height}");
        self.surface = Some(RasterSurface::new(width as usize, height as usize));
        // a fresh surface shows nothing, the next update starts over
        self.aligner.invalidate();
        self.request_redraw();
    }

    #[inline]
    pub fn surface(&self) -> Option<&RasterSurface> {
        self.surface.as_ref()
    }

    #[inline]
    pub fn aligner(&self) -> &FrequencyAligner {
        &self.aligner
    }

    /// Consume a pending redraw request
    pub fn take_redraw(&self) -> bool {
        self.redraw.swap(false, Ordering::AcqRel)
    }

    fn request_redraw(&self) {
        self.redraw.store(true, Ordering::Release);
    }

    /// Follow the receiver's tuning and push its current spectrum row.
    ///
    /// If the buffer was just shifted because the frequency changed, the row
    /// is dropped: samples still in flight belong to the old frequency and
    /// would leave a smear that never scrolls sideways again.
    pub fn update(&mut self, rx: &ReceiverDisplayState) -> UpdateOutcome {
        let Some(surface) = self.surface.as_mut() else {
            return UpdateOutcome::SKIPPED;
        };

        // one snapshot of the tuning, the producer may be writing meanwhile
        let live = rx.tuning();
        let alignment = self.aligner.align(live, surface.width());

        match alignment {
            Alignment::Reset(_) => surface.clear(),
            Alignment::Shift { units, .. } => surface.shift_horizontal(units),
            Alignment::Unchanged => {}
        }

        let retuned = matches!(alignment, Alignment::Shift { retuned: true, .. });
        if !retuned {
            Self::ingest(surface, rx, live.pan, &self.config);
        }

        self.request_redraw();
        UpdateOutcome {
            alignment: Some(alignment),
            ingested: !retuned,
        }
    }

    fn ingest(surface: &mut RasterSurface, rx: &ReceiverDisplayState, pan: i32, config: &WaterfallConfig) {
        surface.scroll_down();

        let width = surface.width();
        let offset = rx.calibration.offset_db();
        let head = &rx.pixel_samples[..width.min(rx.pixel_count())];
        let (low, high) = rx
            .levels
            .resolve(head, offset, config.auto_floor_offset, config.auto_span);
        let gradient = HeatGradient::new(low, high);

        let samples = (0..width).map(|i| rx.sample_at(i as i64 + pan as i64).map(|s| s + offset));
        gradient.map_row(samples, surface.row_mut(0));
    }
}
