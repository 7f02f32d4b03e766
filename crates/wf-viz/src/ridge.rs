//! 3D ridge waterfall for one receiver
//!
//! All per-receiver state (history, aligner, camera, scratch buffers and the
//! GPU resources) sits behind one mutex. `update` and `render` both take it,
//! so a frame is never built from a half-resized or half-reset history.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use wf_core::{ReceiverDisplayState, WaterfallConfig};

use crate::GpuContext;
use crate::alignment::{AlignMode, Alignment, FrequencyAligner, ResetReason, UpdateOutcome};
use crate::camera::CameraState;
use crate::history::HistoryRing;
use crate::interaction::{CameraController, InteractionResponse, PointerEvent};
use crate::mesh::{MeshBuilder, RidgeVertex, build_grid};
use crate::renderer::{RidgeFrame, RidgeRenderer};

/// Renders logged in detail after (re)initialization
const VERBOSE_RENDERS: u64 = 5;

// ═══════════════════════════════════════════════════════════════════════════
// CPU MODEL
// ═══════════════════════════════════════════════════════════════════════════

/// History, alignment and camera state of the 3D view
#[derive(Debug)]
pub struct RidgeModel {
    config: WaterfallConfig,
    ring: HistoryRing,
    aligner: FrequencyAligner,
    camera: CameraState,
    controller: CameraController,
    mesh: MeshBuilder,
    grid: Vec<RidgeVertex>,
    grid_dirty: bool,
    screen_width: u32,
    rows_since_init: u32,
    update_count: u64,
    render_count: u64,
}

impl RidgeModel {
    pub fn new(config: WaterfallConfig, bins: usize) -> Self {
        let camera = CameraState::new(config.initial_tilt, config.initial_zoom);
        Self {
            ring: HistoryRing::new(config.history_depth, bins),
            aligner: FrequencyAligner::new(AlignMode::Bins),
            controller: CameraController::new(&config),
            grid: build_grid(camera.tilt),
            grid_dirty: true,
            mesh: MeshBuilder::new(),
            screen_width: 0,
            rows_since_init: 0,
            update_count: 0,
            render_count: 0,
            camera,
            config,
        }
    }

    #[inline]
    pub fn ring(&self) -> &HistoryRing {
        &self.ring
    }

    #[inline]
    pub fn aligner(&self) -> &FrequencyAligner {
        &self.aligner
    }

    #[inline]
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    #[inline]
    pub fn grid(&self) -> &[RidgeVertex] {
        &self.grid
    }

    #[inline]
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    #[inline]
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Still inside the settling period after the last (re)initialization
    #[inline]
    pub fn warming_up(&self) -> bool {
        self.rows_since_init < self.config.warmup_rows
    }

    /// Widget width; also the bin count of the history
    pub fn set_screen_width(&mut self, width: u32) {
        self.screen_width = width;
    }

    fn bins(&self) -> usize {
        if self.screen_width > 0 {
            self.screen_width as usize
        } else {
            self.config.fallback_width as usize
        }
    }

    /// Align the history with the receiver and append its current row
    pub fn update(&mut self, rx: &ReceiverDisplayState) -> UpdateOutcome {
        let bins = self.bins();
        if bins <= 2 {
            return UpdateOutcome::SKIPPED;
        }

        let live = rx.tuning();
        let alignment = if self.ring.resize(bins) {
            log::debug!("RX{} 3D history resized to {} bins", rx.id, bins);
            self.aligner.reset(live, ResetReason::Geometry)
        } else {
            self.aligner.align(live, bins)
        };

        match alignment {
            Alignment::Reset(_) => {
                self.ring.reset();
                self.rows_since_init = 0;
            }
            Alignment::Shift { units, .. } => self.ring.shift(units),
            Alignment::Unchanged => {}
        }

        if self.warming_up() {
            log::debug!(
                "RX{} 3D warm-up row {}/{}",
                rx.id,
                self.rows_since_init + 1,
                self.config.warmup_rows
            );
        }

        self.ring.push_row(rx, live.pan);
        self.rows_since_init = self.rows_since_init.saturating_add(1);
        self.update_count += 1;

        UpdateOutcome {
            alignment: Some(alignment),
            ingested: true,
        }
    }

    /// Apply a pointer event to the camera
    pub fn handle_event(&mut self, event: PointerEvent) -> InteractionResponse {
        let response = self.controller.handle(&mut self.camera, event);
        if response == InteractionResponse::RebuildGrid {
            self.grid = build_grid(self.camera.tilt);
            self.grid_dirty = true;
        }
        response
    }

    /// Build the geometry for a `width` x `height` viewport.
    ///
    /// Heights and colors span the receiver's manual `levels.low..high`.
    /// Auto scale and the calibration offset only apply to the 2D raster.
    ///
    /// `None` means only the background is drawn.
    pub fn prepare_frame(
        &mut self,
        rx: &ReceiverDisplayState,
        width: u32,
        height: u32,
    ) -> Option<RidgeFrame<'_>> {
        self.render_count += 1;

        let (bins, depth) = (self.ring.bins(), self.ring.depth());
        if bins <= 2 || depth <= 2 || width <= 2 || height <= 2 {
            if self.render_count <= VERBOSE_RENDERS {
                log::debug!(
                    "RX{} 3D render skipped: bins={} depth={} viewport={}x{}",
                    rx.id,
                    bins,
                    depth,
                    width,
                    height
                );
            }
            return None;
        }

        let mvp = self.camera.mvp(width, height);
        let surface = self.mesh.build(
            &self.ring,
            width as usize,
            self.camera.tilt,
            rx.levels.low,
            rx.levels.high,
            rx.palette,
        );

        let grid = if self.grid_dirty {
            self.grid_dirty = false;
            Some(self.grid.as_slice())
        } else {
            None
        };

        Some(RidgeFrame {
            mvp,
            surface,
            screen_width: width as usize,
            depth,
            grid,
        })
    }

    /// Force the grid to be uploaded with the next frame
    fn mark_grid_dirty(&mut self) {
        self.grid_dirty = true;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// WATERFALL
// ═══════════════════════════════════════════════════════════════════════════

/// GPU side of the scene
#[derive(Debug, Default)]
enum GpuSlot {
    /// No device attached yet
    #[default]
    Detached,
    Ready(RidgeRenderer),
    /// Pipeline setup failed; stays this way for the receiver's lifetime
    Disabled,
}

#[derive(Debug)]
struct RidgeScene {
    model: RidgeModel,
    gpu: GpuSlot,
}

/// 3D waterfall shared between the spectrum producer and the presentation
/// thread
#[derive(Debug)]
pub struct RidgeWaterfall {
    scene: Mutex<RidgeScene>,
    redraw: AtomicBool,
}

impl RidgeWaterfall {
    pub fn new(config: WaterfallConfig, bins: usize) -> Self {
        Self {
            scene: Mutex::new(RidgeScene {
                model: RidgeModel::new(config, bins),
                gpu: GpuSlot::Detached,
            }),
            redraw: AtomicBool::new(false),
        }
    }

    /// Widget (re)sized
    pub fn configure(&self, width: u32, height: u32) {
        log::debug!("3D waterfall configured {width}x{height}");
        self.scene.lock().model.set_screen_width(width);
        self.request_redraw();
    }

    /// Create the GPU pipeline. A failure is logged once and leaves the
    /// waterfall without rendering; updates keep working.
    pub fn attach_gpu(&self, ctx: &GpuContext, format: wgpu::TextureFormat) {
        let mut scene = self.scene.lock();
        if matches!(scene.gpu, GpuSlot::Disabled) {
            return;
        }
        match RidgeRenderer::new(ctx, format) {
            Ok(renderer) => {
                scene.gpu = GpuSlot::Ready(renderer);
                scene.model.mark_grid_dirty();
                log::info!("3D waterfall pipeline ready ({format:?})");
            }
            Err(e) => {
                log::error!("3D waterfall pipeline setup failed, rendering disabled: {e}");
                scene.gpu = GpuSlot::Disabled;
            }
        }
    }

    /// Whether rendering was given up after a failed setup
    pub fn is_disabled(&self) -> bool {
        matches!(self.scene.lock().gpu, GpuSlot::Disabled)
    }

    pub fn update(&self, rx: &ReceiverDisplayState) -> UpdateOutcome {
        let outcome = self.scene.lock().model.update(rx);
        if outcome.alignment.is_some() {
            self.request_redraw();
        }
        outcome
    }

    /// Draw into `target`. Returns `false` when nothing was submitted
    /// (no pipeline).
    pub fn render(
        &self,
        rx: &ReceiverDisplayState,
        target: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> bool {
        let mut guard = self.scene.lock();
        let scene = &mut *guard;
        let GpuSlot::Ready(renderer) = &mut scene.gpu else {
            return false;
        };
        if width == 0 || height == 0 {
            return false;
        }
        let frame = scene.model.prepare_frame(rx, width, height);
        renderer.draw(target, width, height, frame);
        true
    }

    pub fn handle_event(&self, event: PointerEvent) -> InteractionResponse {
        let response = self.scene.lock().model.handle_event(event);
        if response.needs_redraw() {
            self.request_redraw();
        }
        response
    }

    /// Run `f` on the locked CPU state
    pub fn with_model<R>(&self, f: impl FnOnce(&mut RidgeModel) -> R) -> R {
        f(&mut self.scene.lock().model)
    }

    /// Consume a pending redraw request
    pub fn take_redraw(&self) -> bool {
        self.redraw.swap(false, Ordering::AcqRel)
    }

    fn request_redraw(&self) {
        self.redraw.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{MouseButton, ScrollDelta};
    use crate::mesh::GRID_VERTEX_COUNT;
    use wf_core::{FrontEnd, SENTINEL_DB, WaterfallMode};

    fn config(depth: usize) -> WaterfallConfig {
        WaterfallConfig {
            history_depth: depth,
            ..Default::default()
        }
    }

    fn receiver(width: usize) -> ReceiverDisplayState {
        let mut rx = ReceiverDisplayState::new(1, WaterfallMode::Mesh3D, 48_000, width);
        rx.frequency = 14_074_000;
        rx.pixel_samples = (0..width).map(|i| -100.0 + i as f32).collect();
        rx
    }

    #[test]
    fn test_first_update_resets_and_ingests() {
        let mut model = RidgeModel::new(config(4), 8);
        model.set_screen_width(8);
        let rx = receiver(8);

        let outcome = model.update(&rx);
        assert_eq!(
            outcome.alignment,
            Some(Alignment::Reset(ResetReason::Unset))
        );
        assert!(outcome.ingested);
        assert_eq!(model.ring().newest(), rx.pixel_samples.as_slice());
        assert_eq!(model.aligner().remembered(), Some(rx.tuning()));
    }

    #[test]
    fn test_warmup_rows_are_kept() {
        let mut model = RidgeModel::new(config(10), 8);
        model.set_screen_width(8);
        let rx = receiver(8);

        for _ in 0..3 {
            assert!(model.update(&rx).ingested);
        }
        assert!(model.warming_up());
        assert_eq!(model.ring().head(), 3);

        for _ in 0..2 {
            model.update(&rx);
        }
        assert!(!model.warming_up());
    }

    #[test]
    fn test_width_change_is_geometry_reset() {
        let mut model = RidgeModel::new(config(4), 8);
        model.set_screen_width(8);
        let rx = receiver(16);
        model.update(&rx);
        model.update(&rx);

        model.set_screen_width(12);
        let outcome = model.update(&rx);
        assert_eq!(
            outcome.alignment,
            Some(Alignment::Reset(ResetReason::Geometry))
        );
        assert_eq!(model.ring().bins(), 12);
        assert_eq!(model.ring().head(), 1);
        assert_eq!(model.ring().row(1), &[SENTINEL_DB; 12]);
    }

    #[test]
    fn test_fallback_width_before_layout() {
        let mut model = RidgeModel::new(config(4), 8);
        model.update(&receiver(8));
        assert_eq!(model.ring().bins(), 800);
    }

    #[test]
    fn test_tiny_width_skips_update() {
        let mut model = RidgeModel::new(config(4), 8);
        model.set_screen_width(2);
        assert_eq!(model.update(&receiver(8)), UpdateOutcome::SKIPPED);
        assert!(model.aligner().remembered().is_none());
    }

    #[test]
    fn test_retune_shifts_and_still_ingests() {
        let mut model = RidgeModel::new(config(4), 8);
        model.set_screen_width(8);
        let mut rx = receiver(8);
        model.update(&rx);

        // 48 kHz over 8 bins: 6 kHz per bin
        rx.frequency -= 12_000;
        let outcome = model.update(&rx);
        assert_eq!(
            outcome.alignment,
            Some(Alignment::Shift {
                units: 2,
                retuned: true
            })
        );
        assert!(outcome.ingested);

        let older = model.ring().row(1);
        assert_eq!(&older[..2], &[SENTINEL_DB, SENTINEL_DB]);
        assert_eq!(&older[2..], &rx.pixel_samples[..6]);
        assert_eq!(model.ring().newest(), rx.pixel_samples.as_slice());
    }

    #[test]
    fn test_out_of_span_resets() {
        let mut model = RidgeModel::new(config(4), 8);
        model.set_screen_width(8);
        let mut rx = receiver(8);
        model.update(&rx);

        rx.frequency += 30_000;
        let outcome = model.update(&rx);
        assert_eq!(
            outcome.alignment,
            Some(Alignment::Reset(ResetReason::OutOfSpan))
        );
        assert_eq!(model.ring().head(), 1);
    }

    #[test]
    fn test_prepare_frame_builds_geometry() {
        let mut model = RidgeModel::new(config(4), 8);
        model.set_screen_width(8);
        let rx = receiver(8);
        model.update(&rx);

        let frame = model.prepare_frame(&rx, 20, 10).unwrap();
        assert_eq!(frame.surface.len(), 3 * 20 * 2);
        assert_eq!(frame.depth, 4);
        assert_eq!(frame.grid.map(<[_]>::len), Some(GRID_VERTEX_COUNT));

        // grid goes out once until the tilt changes again
        assert!(model.prepare_frame(&rx, 20, 10).unwrap().grid.is_none());
        assert_eq!(model.render_count(), 2);
    }

    #[test]
    fn test_prepare_frame_uses_manual_levels() {
        let manual_rx = receiver(8);
        let mut scaled_rx = receiver(8);
        scaled_rx.levels.auto_scale = true;
        scaled_rx.calibration.front_end = FrontEnd::Alex {
            attenuation: 2,
            preamp: false,
        };

        let mut frames = Vec::new();
        for rx in [&manual_rx, &scaled_rx] {
            let mut model = RidgeModel::new(config(4), 8);
            model.set_screen_width(8);
            model.update(rx);
            model.update(rx);
            frames.push(model.prepare_frame(rx, 20, 10).unwrap().surface.to_vec());
        }
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn test_prepare_frame_before_data() {
        let mut model = RidgeModel::new(config(4), 8);
        let rx = receiver(8);
        // nothing ingested yet: sentinel history still draws a flat surface
        assert!(model.prepare_frame(&rx, 20, 10).is_some());
        assert!(model.prepare_frame(&rx, 2, 10).is_none());
        assert!(model.prepare_frame(&rx, 20, 1).is_none());

        let mut shallow = RidgeModel::new(config(2), 8);
        assert!(shallow.prepare_frame(&rx, 20, 10).is_none());
    }

    #[test]
    fn test_drag_rebuilds_grid() {
        let mut model = RidgeModel::new(config(4), 8);
        let rx = receiver(8);
        model.prepare_frame(&rx, 20, 10);

        model.handle_event(PointerEvent::ButtonDown {
            x: 0.0,
            y: 100.0,
            button: MouseButton::Primary,
        });
        let response = model.handle_event(PointerEvent::Motion { x: 0.0, y: 0.0 });
        assert_eq!(response, InteractionResponse::RebuildGrid);

        let tilt = model.camera().tilt;
        assert!((tilt - 2.6).abs() < 1e-5);
        let frame = model.prepare_frame(&rx, 20, 10).unwrap();
        let grid = frame.grid.unwrap();
        assert!((grid[1].position[1] - tilt).abs() < 1e-6);
    }

    #[test]
    fn test_waterfall_redraw_flag() {
        let wf = RidgeWaterfall::new(config(4), 8);
        wf.configure(8, 100);
        assert!(wf.take_redraw());
        assert!(!wf.take_redraw());

        wf.update(&receiver(8));
        assert!(wf.take_redraw());

        let response = wf.handle_event(PointerEvent::Scroll(ScrollDelta::Up));
        assert_eq!(response, InteractionResponse::Redraw);
        assert!(wf.take_redraw());
        assert!((wf.with_model(|m| m.camera().zoom_level) - 1.85).abs() < 1e-6);
    }

    #[test]
    fn test_waterfall_without_gpu_is_not_disabled() {
        let wf = RidgeWaterfall::new(config(4), 8);
        assert!(!wf.is_disabled());
        wf.update(&receiver(8));
        assert_eq!(wf.with_model(|m| m.update_count()), 1);
    }
}
