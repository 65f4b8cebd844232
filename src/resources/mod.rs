//! CPU-side resources shared by every volumetric light.

pub mod dither;
pub mod geometry;
pub mod noise_volume;
pub mod primitives;
pub mod shared;

pub use dither::{DITHER_PATTERN, dither_matrix, dither_texels};
pub use geometry::{BoundingBox, BoundingSphere, LightVolumeKind, LightVolumeMesh};
pub use noise_volume::{NOISE_VOLUME_SIZE, NoiseVolume};
pub use shared::{
    SharedResource, default_spot_cookie, install_default_spot_cookie, loaded_noise_volume,
    noise_volume, point_light_volume, spot_light_volume, teardown_shared_resources,
};
