//! Pointer interaction
//!
//! The 3D view turns vertical drags into tilt and the wheel into camera
//! distance. The 2D view has no camera and hands every event to the host.

use serde::{Deserialize, Serialize};
use wf_core::WaterfallConfig;

use crate::camera::{CameraState, TILT_RANGE, ZOOM_RANGE};

/// Mouse button of a press/release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
    Other(u16),
}

/// Wheel input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScrollDelta {
    /// One notch away from the user
    Up,
    /// One notch towards the user
    Down,
    /// Touchpad style continuous delta (positive = down)
    Smooth(f64),
}

/// Pointer event in widget coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    ButtonDown { x: f64, y: f64, button: MouseButton },
    ButtonUp { x: f64, y: f64, button: MouseButton },
    Motion { x: f64, y: f64 },
    Scroll(ScrollDelta),
}

/// What the waterfall did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionResponse {
    /// Not consumed; the host may handle it
    Ignored,
    /// Consumed, nothing to redraw
    Handled,
    /// Camera distance changed
    Redraw,
    /// Tilt changed; the grid must be rebuilt before the next frame
    RebuildGrid,
}

impl InteractionResponse {
    #[inline]
    pub fn consumed(self) -> bool {
        self != Self::Ignored
    }

    #[inline]
    pub fn needs_redraw(self) -> bool {
        matches!(self, Self::Redraw | Self::RebuildGrid)
    }
}

/// Host-side handler the 2D waterfall forwards pointer events to
/// (tuning by click/drag, VFO wheel steps and so on).
pub trait ReceiverInteraction {
    /// Returns `true` if the event was consumed
    fn pointer_event(&mut self, receiver: usize, event: PointerEvent) -> bool;
}

/// Tilt/zoom state machine for the 3D camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    tilt_sensitivity: f32,
    zoom_step: f32,
}

impl CameraController {
    pub fn new(config: &WaterfallConfig) -> Self {
        Self {
            tilt_sensitivity: config.tilt_sensitivity,
            zoom_step: config.zoom_step,
        }
    }

    pub fn handle(&self, camera: &mut CameraState, event: PointerEvent) -> InteractionResponse {
        match event {
            PointerEvent::ButtonDown {
                y,
                button: MouseButton::Primary,
                ..
            } => {
                camera.dragging = true;
                camera.drag_start_y = y;
                camera.drag_start_tilt = camera.tilt;
                InteractionResponse::Handled
            }
            PointerEvent::ButtonUp {
                button: MouseButton::Primary,
                ..
            } => {
                camera.dragging = false;
                InteractionResponse::Handled
            }
            PointerEvent::Motion { y, .. } if camera.dragging => {
                let delta = (y - camera.drag_start_y) as f32;
                camera.tilt = (camera.drag_start_tilt + delta * self.tilt_sensitivity)
                    .clamp(TILT_RANGE.0, TILT_RANGE.1);
                InteractionResponse::RebuildGrid
            }
            PointerEvent::Scroll(delta) => {
                let change = match delta {
                    ScrollDelta::Up => -self.zoom_step,
                    ScrollDelta::Down => self.zoom_step,
                    ScrollDelta::Smooth(dy) => dy as f32 * self.zoom_step * 0.5,
                };
                camera.zoom_level = (camera.zoom_level + change).clamp(ZOOM_RANGE.0, ZOOM_RANGE.1);
                InteractionResponse::Redraw
            }
            _ => InteractionResponse::Ignored,
        }
    }
}
