//! wgpu backend for the volumetric surfaces and shared textures.

use crate::errors::{Result, VolumetricError};
use crate::renderer::surface::{SurfaceAllocator, SurfaceDesc};
use crate::resources::dither::{DITHER_SIZE, dither_texels};
use crate::resources::noise_volume::{NOISE_VOLUME_SIZE, NoiseVolume};

/// A render target owned by the volumetric pipeline.
#[derive(Debug)]
pub struct GpuSurface {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Creates volumetric surfaces as sampled render-attachment textures.
pub struct WgpuSurfaceAllocator {
    device: wgpu::Device,
}

impl WgpuSurfaceAllocator {
    #[must_use]
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }
}

impl SurfaceAllocator for WgpuSurfaceAllocator {
    type Surface = GpuSurface;

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<GpuSurface> {
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width > max || desc.height > max {
            return Err(VolumetricError::SurfaceAllocation {
                label: desc.label,
                reason: format!(
                    "{}x{} exceeds max texture dimension {max}",
                    desc.width, desc.height
                ),
            });
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("Created surface '{}' {}x{}", desc.label, desc.width, desc.height);
        Ok(GpuSurface { texture, view })
    }

    fn destroy_surface(&mut self, surface: GpuSurface) {
        surface.texture.destroy();
    }
}

/// Clamp-to-edge point sampler used for every volumetric surface read.
#[must_use]
pub fn create_point_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Volumetric Point Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Uploads the 4×4 dither table as an `Rgba8Unorm` texture.
pub fn upload_dither_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: DITHER_SIZE,
        height: DITHER_SIZE,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Volumetric Dither 4x4"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let texels = dither_texels();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&texels),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(DITHER_SIZE * 4),
            rows_per_image: Some(DITHER_SIZE),
        },
        size,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Uploads the noise volume as a 128³ `Rgba8Unorm` 3D texture.
pub fn upload_noise_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    volume: &NoiseVolume,
) -> wgpu::TextureView {
    let n = NOISE_VOLUME_SIZE as u32;
    let size = wgpu::Extent3d {
        width: n,
        height: n,
        depth_or_array_layers: n,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Volumetric Noise 3D"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D3,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let texels = volume.to_rgba8();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&texels),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(n * 4),
            rows_per_image: Some(n),
        },
        size,
    );

    log::info!("Uploaded {n}³ noise volume");
    texture.create_view(&wgpu::TextureViewDescriptor {
        dimension: Some(wgpu::TextureViewDimension::D3),
        ..Default::default()
    })
}
