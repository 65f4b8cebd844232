//! Volumetric Surfaces
//!
//! Backend-agnostic description of the render targets the volumetric pipeline
//! works with, and the [`SurfaceAllocator`] seam that turns a description into
//! a backend resource.
//!
//! Surfaces are identified by [`SurfaceSlot`] rather than by name: the pass
//! sequence stores slots, and the executor resolves a slot to a concrete view
//! through the [`BufferSet`](super::BufferSet), the transient pool, or the
//! host-provided external views.

use rustc_hash::FxHashSet;

use crate::errors::Result;
use crate::renderer::settings::{
    DEPTH_HELPER_FORMAT, LIGHT_BUFFER_FORMAT, QualityTier, SURFACE_FILTER_MODE,
};

/// What a surface stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfacePurpose {
    /// Accumulated in-scattered light (RGBA half float).
    LightAccum,
    /// Linear depth used to guide the bilateral filters (R32 float).
    Depth,
}

/// Identifies a surface read or written by a filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceSlot {
    /// Full-resolution light buffer owned by the `BufferSet`.
    FullColor,
    /// Half-resolution light buffer owned by the `BufferSet`.
    HalfColor,
    /// Half-resolution depth helper owned by the `BufferSet`.
    HalfDepth,
    /// Quarter-resolution light buffer owned by the `BufferSet`.
    QuarterColor,
    /// Quarter-resolution depth helper owned by the `BufferSet`.
    QuarterDepth,
    /// Full-resolution blur intermediate, acquired from the transient pool.
    BlurTemp,
    /// The host camera's depth buffer.
    SceneDepth,
    /// The host's currently active color target (composite destination).
    ActiveTarget,
}

impl SurfaceSlot {
    /// Resolution level of the slot.
    #[must_use]
    pub const fn resolution(self) -> QualityTier {
        match self {
            Self::HalfColor | Self::HalfDepth => QualityTier::Half,
            Self::QuarterColor | Self::QuarterDepth => QualityTier::Quarter,
            Self::FullColor | Self::BlurTemp | Self::SceneDepth | Self::ActiveTarget => {
                QualityTier::Full
            }
        }
    }

    /// Extent of the slot for a given full-resolution viewport.
    #[must_use]
    pub const fn extent(self, width: u32, height: u32) -> (u32, u32) {
        self.resolution().scale_extent(width, height)
    }

    /// Texel size of the slot for a given full-resolution viewport.
    #[inline]
    #[must_use]
    pub fn texel_size(self, width: u32, height: u32) -> glam::Vec2 {
        self.resolution().texel_size(width, height)
    }
}

/// Description of a surface to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub filter: wgpu::FilterMode,
    pub purpose: SurfacePurpose,
    pub resolution: QualityTier,
    pub label: &'static str,
}

impl SurfaceDesc {
    /// Light-accumulation surface for the given viewport and resolution level.
    #[must_use]
    pub fn light_buffer(viewport: (u32, u32), resolution: QualityTier) -> Self {
        let (width, height) = resolution.scale_extent(viewport.0, viewport.1);
        Self {
            width,
            height,
            format: LIGHT_BUFFER_FORMAT,
            filter: SURFACE_FILTER_MODE,
            purpose: SurfacePurpose::LightAccum,
            resolution,
            label: match resolution {
                QualityTier::Full => "VolumeLightBuffer",
                QualityTier::Half => "VolumeLightBufferHalf",
                QualityTier::Quarter => "VolumeLightBufferQuarter",
            },
        }
    }

    /// Depth helper surface for the given viewport and resolution level.
    #[must_use]
    pub fn depth_helper(viewport: (u32, u32), resolution: QualityTier) -> Self {
        let (width, height) = resolution.scale_extent(viewport.0, viewport.1);
        Self {
            width,
            height,
            format: DEPTH_HELPER_FORMAT,
            filter: SURFACE_FILTER_MODE,
            purpose: SurfacePurpose::Depth,
            resolution,
            label: match resolution {
                QualityTier::Full => "VolumeDepthFull",
                QualityTier::Half => "VolumeDepthHalf",
                QualityTier::Quarter => "VolumeDepthQuarter",
            },
        }
    }

    /// Full-resolution intermediate shared by the separable blur passes.
    #[must_use]
    pub fn blur_temp(viewport: (u32, u32)) -> Self {
        Self {
            label: "VolumeLightBufferTemp",
            ..Self::light_buffer(viewport, QualityTier::Full)
        }
    }

    #[inline]
    #[must_use]
    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A backend resource together with the description it was created from.
#[derive(Debug)]
pub struct Surface<S> {
    pub desc: SurfaceDesc,
    pub handle: S,
}

/// Creates and destroys backend surfaces.
///
/// Destruction is explicit: dropping a handle without calling
/// [`destroy_surface`](Self::destroy_surface) is a leak from the allocator's
/// point of view.
pub trait SurfaceAllocator {
    type Surface;

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<Self::Surface>;

    fn destroy_surface(&mut self, surface: Self::Surface);
}

// ─── Headless allocator ───────────────────────────────────────────────────────

/// Handle issued by [`HeadlessAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessSurface(pub u64);

/// CPU-only allocator that tracks surface lifetimes without a GPU.
#[derive(Debug, Default)]
pub struct HeadlessAllocator {
    next_id: u64,
    live: FxHashSet<u64>,
    created: usize,
    destroyed: usize,
}

impl HeadlessAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of surfaces created and not yet destroyed.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total number of surfaces ever created.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Total number of surfaces destroyed.
    #[must_use]
    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    #[must_use]
    pub fn is_live(&self, surface: HeadlessSurface) -> bool {
        self.live.contains(&surface.0)
    }
}

impl SurfaceAllocator for HeadlessAllocator {
    type Surface = HeadlessSurface;

    fn create_surface(&mut self, _desc: &SurfaceDesc) -> Result<HeadlessSurface> {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        self.created += 1;
        Ok(HeadlessSurface(id))
    }

    fn destroy_surface(&mut self, surface: HeadlessSurface) {
        if self.live.remove(&surface.0) {
            self.destroyed += 1;
        } else {
            log::warn!("HeadlessAllocator: double destroy of surface {}", surface.0);
        }
    }
}
