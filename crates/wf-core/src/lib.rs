//! wf-core: Shared receiver display types for the waterfall
//!
//! Everything the host application owns and hands to the renderers:
//! live tuning, display levels, gain calibration and tunables.

mod calibration;
mod config;
mod error;
mod levels;
mod state;

pub use calibration::*;
pub use config::*;
pub use error::*;
pub use levels::*;
pub use state::*;

/// Floor value for history cells that never saw a spectrum row (dB)
pub const SENTINEL_DB: f32 = -140.0;
