//! Shared GPU plumbing for the waterfall renderers

use std::sync::Arc;
use thiserror::Error;

/// Visualization errors
#[derive(Error, Debug)]
pub enum VizError {
    #[error("GPU initialization failed: {0}")]
    GpuInit(String),
    #[error("Shader compilation failed: {0}")]
    Shader(String),
    #[error(transparent)]
    Core(#[from] wf_core::WfError),
}

pub type VizResult<T> = Result<T, VizError>;

/// Device and queue shared by every receiver's 3D waterfall
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Create GPU context (async)
    pub async fn new() -> VizResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| VizError::GpuInit("No suitable GPU adapter found".into()))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Waterfall GPU: {} ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Waterfall Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| VizError::GpuInit(e.to_string()))?;

        Ok(Self::from_parts(Arc::new(device), Arc::new(queue), adapter_info))
    }

    /// Create GPU context (blocking)
    pub fn new_blocking() -> VizResult<Self> {
        pollster::block_on(Self::new())
    }

    /// Wrap a device the host already owns (e.g. the one its window surface
    /// was configured with)
    pub fn from_parts(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        adapter_info: wgpu::AdapterInfo,
    ) -> Self {
        Self {
            device,
            queue,
            adapter_info,
        }
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .finish()
    }
}
