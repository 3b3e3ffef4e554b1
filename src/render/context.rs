//! Headless GPU device acquisition.

use crate::config::EngineConfig;
use crate::error::{Error, Result};

/// A wgpu device and queue with no window or surface attached.
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .finish()
    }
}

impl GpuContext {
    /// Request an adapter and device as `config` describes.
    ///
    /// Fails with `Error::EnvironmentUnavailable` when no adapter matches or
    /// the device cannot be created. There is nothing to retry.
    pub fn acquire(config: &EngineConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: config.backend.to_wgpu(),
            ..Default::default()
        });

        pollster::block_on(async {
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: config.power_preference.to_wgpu(),
                    compatible_surface: None,
                    force_fallback_adapter: config.force_fallback_adapter,
                })
                .await?;

            let adapter_info = adapter.get_info();
            tracing::info!(
                "Using GPU adapter {} ({:?}, {:?})",
                adapter_info.name,
                adapter_info.backend,
                adapter_info.device_type
            );

            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("Palette Filter Device"),
                    ..Default::default()
                })
                .await?;

            Ok::<_, Error>(Self { device, queue, adapter_info })
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }
}
