//! Bilateral Filter Parameters
//!
//! Two levels of constants feed the depth-aware filters:
//!
//! - [`BilateralConstants`]: global per-allocation values (render target
//!   size and the texel size of every resolution level). Republished by the
//!   [`BufferSet`](super::BufferSet) on every reallocation and uploaded as
//!   [`BilateralUniforms`].
//! - [`PassParameters`]: per-pass values captured by the sequencer (source
//!   and destination texel sizes, depth guide surfaces).

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};
use smallvec::SmallVec;

use crate::renderer::settings::QualityTier;
use crate::renderer::surface::SurfaceSlot;

/// Global filter constants derived from the current allocation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BilateralConstants {
    /// `(width, height, 1/width, 1/height)` of the full-resolution buffer.
    pub render_target_size: Vec4,
    pub full_res_texel_size: Vec2,
    /// Zero when the half-resolution surfaces are not allocated.
    pub half_res_texel_size: Vec2,
    /// Zero when the quarter-resolution surfaces are not allocated.
    pub quarter_res_texel_size: Vec2,
}

impl BilateralConstants {
    /// Computes the constants for a viewport and tier.
    #[must_use]
    pub fn new(width: u32, height: u32, tier: QualityTier) -> Self {
        let texel = |level: QualityTier| level.texel_size(width, height);

        let (w, h) = (width as f32, height as f32);
        Self {
            render_target_size: Vec4::new(w, h, 1.0 / w, 1.0 / h),
            full_res_texel_size: texel(QualityTier::Full),
            half_res_texel_size: if tier.is_reduced() {
                texel(QualityTier::Half)
            } else {
                Vec2::ZERO
            },
            quarter_res_texel_size: if tier == QualityTier::Quarter {
                texel(QualityTier::Quarter)
            } else {
                Vec2::ZERO
            },
        }
    }

    #[must_use]
    pub fn to_uniforms(&self) -> BilateralUniforms {
        BilateralUniforms {
            render_target_size: self.render_target_size.to_array(),
            full_res_texel_size: self.full_res_texel_size.to_array(),
            half_res_texel_size: self.half_res_texel_size.to_array(),
            quarter_res_texel_size: self.quarter_res_texel_size.to_array(),
            __pad: [0.0; 2],
        }
    }
}

/// GPU layout of [`BilateralConstants`] (std140 compatible, 48 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct BilateralUniforms {
    pub render_target_size: [f32; 4],
    pub full_res_texel_size: [f32; 2],
    pub half_res_texel_size: [f32; 2],
    pub quarter_res_texel_size: [f32; 2],
    pub(crate) __pad: [f32; 2],
}

/// Constants captured for a single filter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassParameters {
    /// Texel size of the surface being read (or of the scene depth for
    /// passes that only consume depth).
    pub source_texel_size: Vec2,
    pub dest_texel_size: Vec2,
    /// Depth surfaces the pass weights its taps with, finest first.
    pub depth_guides: SmallVec<[SurfaceSlot; 2]>,
}

impl PassParameters {
    #[must_use]
    pub fn new(
        source_texel_size: Vec2,
        dest_texel_size: Vec2,
        depth_guides: &[SurfaceSlot],
    ) -> Self {
        Self {
            source_texel_size,
            dest_texel_size,
            depth_guides: SmallVec::from_slice(depth_guides),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_tiers_have_zero_texel_size() {
        let c = BilateralConstants::new(1920, 1080, QualityTier::Half);
        assert_eq!(c.half_res_texel_size, Vec2::new(1.0 / 960.0, 1.0 / 540.0));
        assert_eq!(c.quarter_res_texel_size, Vec2::ZERO);

        let c = BilateralConstants::new(1920, 1080, QualityTier::Full);
        assert_eq!(c.half_res_texel_size, Vec2::ZERO);
    }

    #[test]
    fn uniforms_are_std140_sized() {
        assert_eq!(std::mem::size_of::<BilateralUniforms>(), 48);
        let u = BilateralConstants::new(800, 600, QualityTier::Quarter).to_uniforms();
        assert_eq!(u.render_target_size, [800.0, 600.0, 1.0 / 800.0, 1.0 / 600.0]);
        assert_eq!(u.quarter_res_texel_size, [1.0 / 200.0, 1.0 / 150.0]);
    }
}
