//! Process-wide shared resources.
//!
//! One light volume mesh per kind, one noise volume and one optional default
//! spot cookie exist per process. Each is created on first use, handed out as
//! an [`Arc`] and released by [`teardown_shared_resources`]. Handles already
//! held by renderers stay valid after teardown; the next request creates a
//! fresh instance.

use std::sync::Arc;

use parking_lot::{Mutex, const_mutex};

use crate::errors::Result;
use crate::renderer::settings::NoiseFallback;
use crate::resources::geometry::LightVolumeMesh;
use crate::resources::noise_volume::NoiseVolume;
use crate::resources::primitives::{
    SphereOptions, create_point_light_volume, create_spot_light_volume,
};

/// A lazily initialized, reference-counted singleton slot.
pub struct SharedResource<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> SharedResource<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: const_mutex(None),
        }
    }

    /// Returns the current instance, creating it with `init` if the slot is empty.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> Arc<T> {
        let mut slot = self.slot.lock();
        slot.get_or_insert_with(|| Arc::new(init())).clone()
    }

    /// Fallible [`get_or_init`](Self::get_or_init). The slot stays empty on error.
    pub fn get_or_try_init(&self, init: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        let mut slot = self.slot.lock();
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }
        let created = Arc::new(init()?);
        *slot = Some(created.clone());
        Ok(created)
    }

    /// Installs `value` unless an instance already exists; returns whichever
    /// instance occupies the slot afterwards.
    pub fn install(&self, value: Arc<T>) -> Arc<T> {
        let mut slot = self.slot.lock();
        slot.get_or_insert(value).clone()
    }

    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().clone()
    }

    /// Drops the slot's reference. Returns `true` if an instance was held.
    pub fn teardown(&self) -> bool {
        self.slot.lock().take().is_some()
    }
}

impl<T> Default for SharedResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

static SPOT_LIGHT_VOLUME: SharedResource<LightVolumeMesh> = SharedResource::new();
static POINT_LIGHT_VOLUME: SharedResource<LightVolumeMesh> = SharedResource::new();
static NOISE_VOLUME: SharedResource<NoiseVolume> = SharedResource::new();
static DEFAULT_SPOT_COOKIE: SharedResource<wgpu::TextureView> = SharedResource::new();

/// The shared spot light volume mesh.
pub fn spot_light_volume() -> Arc<LightVolumeMesh> {
    SPOT_LIGHT_VOLUME.get_or_init(|| {
        let mesh = create_spot_light_volume();
        log::info!(
            "Created spot light volume ({} vertices, {} triangles)",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        mesh
    })
}

/// The shared point light volume mesh.
pub fn point_light_volume() -> Arc<LightVolumeMesh> {
    POINT_LIGHT_VOLUME.get_or_init(|| {
        let mesh = create_point_light_volume(SphereOptions::default());
        log::info!(
            "Created point light volume ({} vertices, {} triangles)",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        mesh
    })
}

/// The shared noise volume, decoded from `bytes` on first use.
///
/// Later calls return the existing volume and ignore `bytes`.
///
/// # Errors
///
/// With [`NoiseFallback::Fail`] a corrupt blob is returned as an error and
/// nothing is cached. With [`NoiseFallback::ZeroFilled`] the zero-filled
/// volume is cached instead.
pub fn noise_volume(bytes: &[u8], fallback: NoiseFallback) -> Result<Arc<NoiseVolume>> {
    NOISE_VOLUME.get_or_try_init(|| {
        let volume = match fallback {
            NoiseFallback::Fail => NoiseVolume::decode(bytes)?,
            NoiseFallback::ZeroFilled => NoiseVolume::decode_or_zeroed(bytes),
        };
        log::info!("Loaded noise volume ({} bytes)", bytes.len());
        Ok(volume)
    })
}

/// The noise volume if one has been loaded.
#[must_use]
pub fn loaded_noise_volume() -> Option<Arc<NoiseVolume>> {
    NOISE_VOLUME.get()
}

/// Installs the default spot cookie. The first installed view is kept.
pub fn install_default_spot_cookie(view: Arc<wgpu::TextureView>) -> Arc<wgpu::TextureView> {
    let installed = DEFAULT_SPOT_COOKIE.install(view.clone());
    if !Arc::ptr_eq(&installed, &view) {
        log::debug!("Default spot cookie already installed; keeping the existing one");
    }
    installed
}

#[must_use]
pub fn default_spot_cookie() -> Option<Arc<wgpu::TextureView>> {
    DEFAULT_SPOT_COOKIE.get()
}

/// Releases every process-wide resource reference.
pub fn teardown_shared_resources() {
    let released = [
        SPOT_LIGHT_VOLUME.teardown(),
        POINT_LIGHT_VOLUME.teardown(),
        NOISE_VOLUME.teardown(),
        DEFAULT_SPOT_COOKIE.teardown(),
    ]
    .into_iter()
    .filter(|&r| r)
    .count();
    log::info!("Released {released} shared volumetric resources");
}
