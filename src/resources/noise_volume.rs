//! 3D Noise Volume
//!
//! Decodes the raw volumetric noise blob into a dense 128³ density field.
//!
//! # Blob layout
//!
//! The blob is a DDS volume without any compression:
//!
//! ```text
//!   offset  field
//!   12      height        (u32 LE, must be 128)
//!   16      width         (u32 LE, must be 128)
//!   20      pitch         (u32 LE, ignored and recomputed)
//!   24      depth         (u32 LE, must be 128)
//!   88      bit depth     (u32 LE, one of 8 / 16 / 24 / 32)
//!   128     payload       (depth × height rows of `pitch` bytes)
//! ```
//!
//! The row pitch is recomputed as `(width * bit_depth + 7) / 8` and the
//! header is rejected unless the blob holds every row at that pitch. Only
//! the first byte of each texel carries density.
//!
//! The decoded field stores blob rows along X and blob columns along Y:
//! voxel `(x, y, z)` is row `x`, column `y` of slice `z`.

use glam::Vec4;

use crate::errors::{Result, VolumetricError};

/// Edge length of the noise volume in voxels.
pub const NOISE_VOLUME_SIZE: usize = 128;

const ASSET: &str = "noise volume";
const HEADER_SIZE: usize = 128;

const HEIGHT_OFFSET: usize = 12;
const WIDTH_OFFSET: usize = 16;
const DEPTH_OFFSET: usize = 24;
const BIT_DEPTH_OFFSET: usize = 88;

/// Immutable 128³ density field, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseVolume {
    density: Vec<f32>,
}

impl NoiseVolume {
    /// A volume with every voxel at zero density.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            density: vec![0.0; NOISE_VOLUME_SIZE.pow(3)],
        }
    }

    /// Decodes a noise blob.
    ///
    /// # Errors
    ///
    /// Returns [`VolumetricError::CorruptAsset`] if the header is malformed or
    /// the payload is shorter than the header implies. The blob is never read
    /// past its end.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = NoiseHeader::parse(bytes)?;
        let pitch = header.pitch();
        let texel_bytes = header.bit_depth as usize / 8;

        let rows = NOISE_VOLUME_SIZE * NOISE_VOLUME_SIZE;
        let required = HEADER_SIZE + pitch * rows;
        if bytes.len() < required {
            return Err(corrupt(format!(
                "blob is {} bytes, {required} required at pitch {pitch}",
                bytes.len()
            )));
        }

        let n = NOISE_VOLUME_SIZE;
        let mut density = vec![0.0_f32; n * n * n];
        let payload = &bytes[HEADER_SIZE..required];

        for (row_index, row) in payload.chunks_exact(pitch).enumerate() {
            let slice = row_index / n;
            let x = row_index % n;
            for y in 0..n {
                let value = row[y * texel_bytes];
                density[x + y * n + slice * n * n] = f32::from(value) / 255.0;
            }
        }

        Ok(Self { density })
    }

    /// Decodes a noise blob, substituting [`zeroed`](Self::zeroed) data on failure.
    #[must_use]
    pub fn decode_or_zeroed(bytes: &[u8]) -> Self {
        match Self::decode(bytes) {
            Ok(volume) => volume,
            Err(err) => {
                log::error!("{err}; using zero-filled noise volume");
                Self::zeroed()
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        NOISE_VOLUME_SIZE
    }

    /// Raw density values, X fastest then Y then Z.
    #[inline]
    #[must_use]
    pub fn density(&self) -> &[f32] {
        &self.density
    }

    /// Density at voxel `(x, y, z)`, or `None` outside the volume.
    #[must_use]
    pub fn density_at(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        let n = NOISE_VOLUME_SIZE;
        if x >= n || y >= n || z >= n {
            return None;
        }
        Some(self.density[x + y * n + z * n * n])
    }

    /// Voxel value as sampled by shaders: density replicated into RGBA.
    #[must_use]
    pub fn texel(&self, x: usize, y: usize, z: usize) -> Option<Vec4> {
        self.density_at(x, y, z).map(Vec4::splat)
    }

    /// RGBA8 texels for a `Rgba8Unorm` 3D texture upload, in the same order
    /// as [`density`](Self::density).
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<[u8; 4]> {
        self.density
            .iter()
            .map(|&d| {
                let v = (d.clamp(0.0, 1.0) * 255.0).round() as u8;
                [v; 4]
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct NoiseHeader {
    width: u32,
    bit_depth: u32,
}

impl NoiseHeader {
    fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(corrupt(format!(
                "blob is {} bytes, shorter than the {HEADER_SIZE}-byte header",
                bytes.len()
            )));
        }

        let height = read_u32(bytes, HEIGHT_OFFSET)?;
        let width = read_u32(bytes, WIDTH_OFFSET)?;
        let depth = read_u32(bytes, DEPTH_OFFSET)?;
        let bit_depth = read_u32(bytes, BIT_DEPTH_OFFSET)?;

        let expected = NOISE_VOLUME_SIZE as u32;
        if (width, height, depth) != (expected, expected, expected) {
            return Err(corrupt(format!(
                "expected {expected}³ volume, header says {width}x{height}x{depth}"
            )));
        }

        if !matches!(bit_depth, 8 | 16 | 24 | 32) {
            return Err(corrupt(format!("unsupported bit depth {bit_depth}")));
        }

        Ok(Self { width, bit_depth })
    }

    fn pitch(&self) -> usize {
        (self.width as usize * self.bit_depth as usize).div_ceil(8)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| corrupt(format!("header field at offset {offset} is truncated")))
}

fn corrupt(reason: String) -> VolumetricError {
    VolumetricError::CorruptAsset {
        asset: ASSET,
        reason,
    }
}
