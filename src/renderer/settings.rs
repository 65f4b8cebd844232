//! Volumetric Settings & Quality Tiers
//!
//! The core abstraction is [`QualityTier`], which determines the resolution the
//! light-scattering integral is evaluated at and, with it, which intermediate
//! surfaces exist and which filter passes reconstruct the full-resolution
//! buffer.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use volumetric_lighting::renderer::{QualityTier, VolumetricSettings};
//!
//! // Default: full-resolution light buffer
//! let settings = VolumetricSettings::default();
//!
//! // Quarter-resolution scattering for low-end devices
//! let settings = VolumetricSettings {
//!     tier: QualityTier::Quarter,
//!     ..Default::default()
//! };
//! ```

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::errors::VolumetricError;

/// Format of every light-accumulation surface (half-precision RGBA, linear).
pub const LIGHT_BUFFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Format of the downsampled depth helper surfaces (single-channel f32, linear).
pub const DEPTH_HELPER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Filter mode of every volumetric surface.
///
/// The buffers are consumed by depth-aware filters, which fetch exact texels.
pub const SURFACE_FILTER_MODE: wgpu::FilterMode = wgpu::FilterMode::Nearest;

// ---------------------------------------------------------------------------
// QualityTier
// ---------------------------------------------------------------------------

/// Resolution level of the volumetric light buffer.
///
/// | Tier      | Scattering resolution | Surfaces                           | Passes |
/// |-----------|-----------------------|------------------------------------|--------|
/// | `Full`    | 1/1                   | full color                         | 2      |
/// | `Half`    | 1/2                   | + half color / depth               | 4      |
/// | `Quarter` | 1/4                   | + half and quarter color / depth   | 5      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Scattering evaluated at full viewport resolution.
    #[default]
    Full,
    /// Scattering evaluated at half resolution, bilaterally upsampled.
    Half,
    /// Scattering evaluated at quarter resolution, bilaterally upsampled.
    Quarter,
}

impl QualityTier {
    /// All tiers, from highest to lowest resolution.
    pub const ALL: [QualityTier; 3] = [Self::Full, Self::Half, Self::Quarter];

    /// Right-shift applied to the viewport dimensions for this tier.
    #[inline]
    #[must_use]
    pub const fn shift(self) -> u32 {
        match self {
            Self::Full => 0,
            Self::Half => 1,
            Self::Quarter => 2,
        }
    }

    /// Scales a viewport extent down to this tier's resolution.
    #[inline]
    #[must_use]
    pub const fn scale_extent(self, width: u32, height: u32) -> (u32, u32) {
        (width >> self.shift(), height >> self.shift())
    }

    /// `(1/w, 1/h)` of this tier's extent for a `width × height` viewport.
    #[inline]
    #[must_use]
    pub fn texel_size(self, width: u32, height: u32) -> Vec2 {
        let (w, h) = self.scale_extent(width, height);
        Vec2::new(1.0 / w as f32, 1.0 / h as f32)
    }

    /// Returns `true` when the scattering pass renders below full resolution
    /// and the buffer must be reconstructed by a bilateral upsample.
    #[inline]
    #[must_use]
    pub const fn is_reduced(self) -> bool {
        !matches!(self, Self::Full)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Half => "half",
            Self::Quarter => "quarter",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = VolumetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "half" => Ok(Self::Half),
            "quarter" => Ok(Self::Quarter),
            other => Err(VolumetricError::UnsupportedTier(other.to_string())),
        }
    }
}

impl TryFrom<u32> for QualityTier {
    type Error = VolumetricError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Full),
            1 => Ok(Self::Half),
            2 => Ok(Self::Quarter),
            other => Err(VolumetricError::UnsupportedTier(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// VolumetricSettings
// ---------------------------------------------------------------------------

/// What to do when the noise volume asset fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseFallback {
    /// Surface the decode error to the caller.
    #[default]
    Fail,
    /// Log the error and continue with a zero-filled volume.
    ZeroFilled,
}

/// Runtime configuration of the volumetric light pipeline.
///
/// | Field            | Description                                   | Default          |
/// |------------------|-----------------------------------------------|------------------|
/// | `tier`           | Resolution of the scattering pass             | `Full`           |
/// | `clear_color`    | Clear value of the light buffer each frame    | `[0, 0, 0, 0]`   |
/// | `noise_fallback` | Behaviour on a corrupt noise asset            | `Fail`           |
///
/// `tier` may be changed at any time; the change is picked up at the next
/// frame boundary by [`FrameDriver`](crate::renderer::FrameDriver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumetricSettings {
    pub tier: QualityTier,
    pub clear_color: [f32; 4],
    pub noise_fallback: NoiseFallback,
}

impl Default for VolumetricSettings {
    fn default() -> Self {
        Self {
            tier: QualityTier::default(),
            clear_color: [0.0, 0.0, 0.0, 0.0],
            noise_fallback: NoiseFallback::default(),
        }
    }
}

impl VolumetricSettings {
    /// Clear color as a `wgpu::Color`.
    #[must_use]
    pub fn wgpu_clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: f64::from(a),
        }
    }
}
