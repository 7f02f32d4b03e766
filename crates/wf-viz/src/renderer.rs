//! wgpu renderer for the 3D ridge waterfall
//!
//! One shader (position + vertex color, one MVP uniform) drives two
//! pipelines: triangle strips for the surface and a line list for the grid.
//! Both are alpha blended and depth tested against the same depth buffer.

use std::sync::Arc;

use glam::Mat4;

use crate::mesh::{GRID_VERTEX_COUNT, RidgeVertex, strip_ranges};
use crate::{GpuContext, VizError, VizResult};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Everything one frame needs from the CPU side
#[derive(Debug, Clone, Copy)]
pub struct RidgeFrame<'a> {
    pub mvp: Mat4,
    /// Strip vertices, `depth - 1` strips of `2 * screen_width`
    pub surface: &'a [RidgeVertex],
    pub screen_width: usize,
    pub depth: usize,
    /// New grid geometry, only when it changed since the last upload
    pub grid: Option<&'a [RidgeVertex]>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct RidgeUniforms {
    mvp: [[f32; 4]; 4],
}

/// GPU resources of one receiver's 3D waterfall
pub struct RidgeRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_capacity: u64,
    grid_buffer: wgpu::Buffer,
    grid_vertices: u32,
    depth_target: Option<(wgpu::TextureView, u32, u32)>,
}

impl RidgeRenderer {
    /// Build the pipelines for color targets of `format`.
    ///
    /// Validation errors raised while creating the shader or pipelines are
    /// returned instead of reaching the device's uncaptured error handler.
    pub fn new(ctx: &GpuContext, format: wgpu::TextureFormat) -> VizResult<Self> {
        let device = &ctx.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ridge Uniform Buffer"),
            size: std::mem::size_of::<RidgeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ridge Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ridge Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ridge Shader"),
            source: wgpu::ShaderSource::Wgsl(RIDGE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Ridge Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let surface_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            format,
            wgpu::PrimitiveTopology::TriangleStrip,
            "Ridge Surface Pipeline",
        );
        let grid_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            format,
            wgpu::PrimitiveTopology::LineList,
            "Ridge Grid Pipeline",
        );

        let grid_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ridge Grid Buffer"),
            size: (GRID_VERTEX_COUNT * std::mem::size_of::<RidgeVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(VizError::Shader(err.to_string()));
        }

        Ok(Self {
            device: Arc::clone(&ctx.device),
            queue: Arc::clone(&ctx.queue),
            surface_pipeline,
            grid_pipeline,
            uniform_buffer,
            bind_group,
            vertex_buffer: None,
            vertex_capacity: 0,
            grid_buffer,
            grid_vertices: 0,
            depth_target: None,
        })
    }

    /// Clear `target` and draw `frame` into it, if any
    pub fn draw(
        &mut self,
        target: &wgpu::TextureView,
        width: u32,
        height: u32,
        frame: Option<RidgeFrame<'_>>,
    ) {
        self.ensure_depth_target(width, height);

        let surface_bytes = match &frame {
            Some(frame) => self.upload(frame),
            None => 0,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ridge Encoder"),
            });

        {
            let depth_view = self.depth_target.as_ref().map(|(view, _, _)| view);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Ridge Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: depth_view.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let (Some(frame), Some(vertex_buffer)) = (&frame, &self.vertex_buffer) {
                if surface_bytes > 0 {
                    pass.set_pipeline(&self.surface_pipeline);
                    pass.set_bind_group(0, &self.bind_group, &[]);
                    pass.set_vertex_buffer(0, vertex_buffer.slice(..surface_bytes));
                    for strip in strip_ranges(frame.screen_width, frame.depth) {
                        pass.draw(strip, 0..1);
                    }
                }
            }

            if frame.is_some() && self.grid_vertices > 0 {
                pass.set_pipeline(&self.grid_pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, self.grid_buffer.slice(..));
                pass.draw(0..self.grid_vertices, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Write uniforms and geometry; returns the surface byte count
    fn upload(&mut self, frame: &RidgeFrame<'_>) -> u64 {
        let uniforms = RidgeUniforms {
            mvp: frame.mvp.to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        if let Some(grid) = frame.grid {
            let grid = &grid[..grid.len().min(GRID_VERTEX_COUNT)];
            self.queue
                .write_buffer(&self.grid_buffer, 0, bytemuck::cast_slice(grid));
            self.grid_vertices = grid.len() as u32;
        }

        let bytes: &[u8] = bytemuck::cast_slice(frame.surface);
        let needed = bytes.len() as u64;
        if needed == 0 {
            return 0;
        }
        if needed > self.vertex_capacity || self.vertex_buffer.is_none() {
            log::debug!(
                "ridge vertex buffer grows {} -> {} bytes",
                self.vertex_capacity,
                needed
            );
            self.vertex_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Ridge Vertex Buffer"),
                size: needed,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vertex_capacity = needed;
        }
        if let Some(buffer) = &self.vertex_buffer {
            self.queue.write_buffer(buffer, 0, bytes);
        }
        needed
    }

    fn ensure_depth_target(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if matches!(self.depth_target, Some((_, w, h)) if w == width && h == height) {
            return;
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Ridge Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth_target = Some((view, width, height));
    }
}

impl std::fmt::Debug for RidgeRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RidgeRenderer")
            .field("vertex_capacity", &self.vertex_capacity)
            .field("grid_vertices", &self.grid_vertices)
            .finish()
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[RidgeVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

const RIDGE_SHADER: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.position = uniforms.mvp * vec4<f32>(input.position, 1.0);
    output.color = input.color;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return input.color;
}
"#;
