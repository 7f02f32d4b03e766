//! Ridge mesh and grid geometry for the 3D waterfall
//!
//! Every pair of adjacent history rows becomes one triangle strip of
//! `2 * screen_width` vertices, newest pair in front. Heights come from the
//! color mapper; the whole surface leans back by `tilt` with distance.

use std::ops::Range;

use wf_core::Palette;

use crate::color::ridge_sample;
use crate::history::HistoryRing;

/// Half width of the surface in model units
pub const SURFACE_HALF_WIDTH: f32 = 0.80;
/// Depth covered from the newest to the oldest row
pub const Z_SPAN: f32 = 1.60;
/// Height of a full-power ridge
pub const Y_SCALE: f32 = 0.60;

const GRID_COLOR: [f32; 4] = [0.15, 0.60, 0.70, 0.50];
const GRID_VLINES: usize = 20;
const GRID_HLINES: usize = 15;

/// Vertex count of the grid line list
pub const GRID_VERTEX_COUNT: usize = GRID_VLINES * 2 + GRID_HLINES * 2 + 4;

// ═══════════════════════════════════════════════════════════════════════════
// VERTEX
// ═══════════════════════════════════════════════════════════════════════════

/// Vertex shared by the ridge surface and the grid
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RidgeVertex {
    /// Position (x, y, z)
    pub position: [f32; 3],
    /// Color (r, g, b, a)
    pub color: [f32; 4],
}

impl RidgeVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    #[inline]
    pub fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    /// Buffer layout matching the ridge shader inputs
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RIDGE SURFACE
// ═══════════════════════════════════════════════════════════════════════════

/// Builds the ridge surface into reusable scratch buffers
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<RidgeVertex>,
    row_tmp0: Vec<f32>,
    row_tmp1: Vec<f32>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertices produced by the last `build`
    #[inline]
    pub fn vertices(&self) -> &[RidgeVertex] {
        &self.vertices
    }

    /// Build the surface for `ring` at `screen_width` columns.
    ///
    /// Returns an empty slice when the ring or the screen is too small to
    /// form a strip.
    pub fn build(
        &mut self,
        ring: &HistoryRing,
        screen_width: usize,
        tilt: f32,
        low: f32,
        high: f32,
        palette: Palette,
    ) -> &[RidgeVertex] {
        self.vertices.clear();

        let w = screen_width;
        let d = ring.depth();
        let b = ring.bins();
        if w < 2 || d < 2 || b < 2 {
            return &self.vertices;
        }

        if self.row_tmp0.len() < w {
            self.row_tmp0.resize(w, 0.0);
            self.row_tmp1.resize(w, 0.0);
        }
        self.vertices.reserve((d - 1) * w * 2);

        let x_denom = (w - 1) as f32;
        let d_denom = (d - 1) as f32;

        for slice in 0..d - 1 {
            let row0 = ring.row(slice);
            let row1 = ring.row(slice + 1);

            for x in 0..w {
                let bin_f = x as f32 / x_denom * (b - 1) as f32;
                let bin = (bin_f as usize).min(b - 2);
                self.row_tmp0[x] = row0[bin];
                self.row_tmp1[x] = row1[bin];
            }

            let dist0 = slice as f32 / d_denom;
            let dist1 = (slice + 1) as f32 / d_denom;

            for x in 0..w {
                let px = (x as f32 / x_denom - 0.5) * 2.0 * SURFACE_HALF_WIDTH;

                for (sample, dist) in [(self.row_tmp0[x], dist0), (self.row_tmp1[x], dist1)] {
                    let s = ridge_sample(sample, low, high, dist, palette);
                    self.vertices.push(RidgeVertex::new(
                        [px, s.height * Y_SCALE + tilt * dist, -dist * Z_SPAN],
                        s.color,
                    ));
                }
            }
        }

        &self.vertices
    }
}

/// Vertex ranges of the individual strips for a surface of `screen_width`
/// columns over `depth` rows
pub fn strip_ranges(screen_width: usize, depth: usize) -> impl Iterator<Item = Range<u32>> {
    let strip = (screen_width * 2) as u32;
    (0..depth.saturating_sub(1) as u32).map(move |s| s * strip..(s + 1) * strip)
}

// ═══════════════════════════════════════════════════════════════════════════
// GRID
// ═══════════════════════════════════════════════════════════════════════════

/// Line list for the floor grid at the given tilt
pub fn build_grid(tilt: f32) -> Vec<RidgeVertex> {
    let [r, g, b, a] = GRID_COLOR;
    let fogged = |fog: f32, alpha: f32| [r * fog, g * fog, b * fog, a * alpha];
    let mut grid = Vec::with_capacity(GRID_VERTEX_COUNT);

    // frequency lines, front to back
    let back_fog = fog(1.0);
    for i in 0..GRID_VLINES {
        let x = (i as f32 / (GRID_VLINES - 1) as f32 - 0.5) * 2.0 * SURFACE_HALF_WIDTH;
        grid.push(RidgeVertex::new([x, 0.0, 0.0], GRID_COLOR));
        grid.push(RidgeVertex::new([x, tilt, -Z_SPAN], fogged(back_fog, 0.4)));
    }

    // time lines
    for j in 0..GRID_HLINES {
        let d = j as f32 / (GRID_HLINES - 1) as f32;
        let color = fogged(fog(d), 0.8);
        let (y, z) = (tilt * d, -d * Z_SPAN);
        grid.push(RidgeVertex::new([-SURFACE_HALF_WIDTH, y, z], color));
        grid.push(RidgeVertex::new([SURFACE_HALF_WIDTH, y, z], color));
    }

    // border
    grid.push(RidgeVertex::new([-SURFACE_HALF_WIDTH, 0.0, 0.0], GRID_COLOR));
    grid.push(RidgeVertex::new([SURFACE_HALF_WIDTH, 0.0, 0.0], GRID_COLOR));
    let back = fogged(0.7, 0.5);
    grid.push(RidgeVertex::new([-SURFACE_HALF_WIDTH, tilt, -Z_SPAN], back));
    grid.push(RidgeVertex::new([SURFACE_HALF_WIDTH, tilt, -Z_SPAN], back));

    grid
}

#[inline]
fn fog(dist01: f32) -> f32 {
    (1.0 - dist01 * 0.7).clamp(0.35, 1.0)
}
