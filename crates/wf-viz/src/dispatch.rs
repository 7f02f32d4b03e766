//! Per-receiver entry point, routed by the receiver's waterfall mode
//!
//! Both variants lock internally, so a `Waterfall` can be shared between the
//! thread producing spectrum rows and the one presenting them.

use parking_lot::Mutex;
use wf_core::{ReceiverDisplayState, WaterfallConfig, WaterfallMode};

use crate::alignment::UpdateOutcome;
use crate::interaction::{PointerEvent, ReceiverInteraction};
use crate::raster::{RasterSurface, RasterWaterfall};
use crate::ridge::RidgeWaterfall;
use crate::{GpuContext, VizResult};

/// The waterfall of one receiver
#[derive(Debug)]
pub enum Waterfall {
    Raster(Mutex<RasterWaterfall>),
    Ridge(RidgeWaterfall),
}

impl Waterfall {
    /// Create the waterfall matching `rx.mode`, sized `width` x `height`
    pub fn init(
        rx: &ReceiverDisplayState,
        config: WaterfallConfig,
        width: u32,
        height: u32,
    ) -> VizResult<Self> {
        config.validate()?;
        log::info!("RX{} waterfall init {:?} {}x{}", rx.id, rx.mode, width, height);

        let waterfall = match rx.mode {
            WaterfallMode::Raster2D => Self::Raster(Mutex::new(RasterWaterfall::new(config))),
            WaterfallMode::Mesh3D => {
                let bins = match rx.pixel_count() {
                    0 => config.fallback_width as usize,
                    n => n,
                };
                Self::Ridge(RidgeWaterfall::new(config, bins))
            }
        };
        waterfall.resize(width, height);
        Ok(waterfall)
    }

    #[inline]
    pub fn mode(&self) -> WaterfallMode {
        match self {
            Self::Raster(_) => WaterfallMode::Raster2D,
            Self::Ridge(_) => WaterfallMode::Mesh3D,
        }
    }

    /// Widget size changed. Repeated calls with the same size are harmless.
    pub fn resize(&self, width: u32, height: u32) {
        match self {
            Self::Raster(wf) => {
                let mut wf = wf.lock();
                let unchanged = wf
                    .surface()
                    .is_some_and(|s| s.width() == width as usize && s.height() == height as usize);
                if !unchanged {
                    wf.configure(width, height);
                }
            }
            Self::Ridge(wf) => wf.configure(width, height),
        }
    }

    /// Set up GPU resources; 2D has none
    pub fn attach_gpu(&self, ctx: &GpuContext, format: wgpu::TextureFormat) {
        if let Self::Ridge(wf) = self {
            wf.attach_gpu(ctx, format);
        }
    }

    /// New spectrum row available
    pub fn update(&self, rx: &ReceiverDisplayState) -> UpdateOutcome {
        match self {
            Self::Raster(wf) => wf.lock().update(rx),
            Self::Ridge(wf) => wf.update(rx),
        }
    }

    /// Draw the 3D view into `target`. The 2D raster is presented by the host
    /// through [`Waterfall::with_raster`], so this returns `false` for it.
    pub fn render(
        &self,
        rx: &ReceiverDisplayState,
        target: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> bool {
        match self {
            Self::Raster(_) => false,
            Self::Ridge(wf) => wf.render(rx, target, width, height),
        }
    }

    /// Run `f` on the pixels of the 2D view. `None` for the 3D view or while
    /// the raster has no surface.
    pub fn with_raster<R>(&self, f: impl FnOnce(&RasterSurface) -> R) -> Option<R> {
        match self {
            Self::Raster(wf) => wf.lock().surface().map(f),
            Self::Ridge(_) => None,
        }
    }

    /// Route a pointer event. 2D hands it to `host` untouched, 3D drives the
    /// camera. Returns `true` if the event was consumed.
    pub fn handle_event(
        &self,
        rx: &ReceiverDisplayState,
        event: PointerEvent,
        host: &mut dyn ReceiverInteraction,
    ) -> bool {
        match self {
            Self::Raster(_) => host.pointer_event(rx.id, event),
            Self::Ridge(wf) => wf.handle_event(event).consumed(),
        }
    }

    /// Consume a pending redraw request
    pub fn take_redraw(&self) -> bool {
        match self {
            Self::Raster(wf) => wf.lock().take_redraw(),
            Self::Ridge(wf) => wf.take_redraw(),
        }
    }
}
