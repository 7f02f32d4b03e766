//! wf-viz: Receiver Waterfall Displays
//!
//! Scrolling spectrum history for SDR receivers, in two flavours:
//! - 2D raster: color-mapped RGB pixel buffer, one row per update
//! - 3D ridge view: tilted wgpu surface with per-vertex palette coloring
//!
//! Both keep their history aligned with the receiver's tuning while it is
//! retuned, zoomed or panned (see [`alignment`]).

pub mod alignment;
pub mod camera;
pub mod color;
pub mod common;
pub mod dispatch;
pub mod history;
pub mod interaction;
pub mod mesh;
pub mod raster;
pub mod renderer;
pub mod ridge;

pub use alignment::{AlignMode, Alignment, FrequencyAligner, ResetReason, UpdateOutcome};
pub use camera::CameraState;
pub use color::{HeatGradient, RidgeSample, palette_ramp, ridge_sample};
pub use common::{GpuContext, VizError, VizResult};
pub use dispatch::Waterfall;
pub use history::HistoryRing;
pub use interaction::{
    CameraController,
    InteractionResponse,
    MouseButton,
    PointerEvent,
    ReceiverInteraction,
    ScrollDelta,
};
pub use mesh::{MeshBuilder, RidgeVertex, build_grid, strip_ranges};
pub use raster::{RasterSurface, RasterWaterfall};
pub use renderer::{RidgeFrame, RidgeRenderer};
pub use ridge::{RidgeModel, RidgeWaterfall};
