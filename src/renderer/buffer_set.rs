//! Volumetric Buffer Set
//!
//! Owns the persistent intermediate render targets of the volumetric
//! pipeline and keeps them in step with the viewport size and quality tier.
//!
//! # Surfaces per tier
//!
//! ```text
//!            full color   half color   half depth   quarter color   quarter depth
//! Full           ✔
//! Half           ✔            ✔            ✔
//! Quarter        ✔            ✔            ✔              ✔               ✔
//! ```
//!
//! The quarter tier keeps the half-resolution pair because its depth
//! downsample chains through half resolution.
//!
//! # Lifecycle
//!
//! A reallocation is all-or-nothing: every owned surface is explicitly
//! destroyed through the [`SurfaceAllocator`] before the new set is created,
//! so a surface sized for a previous viewport can never be sampled. Each
//! successful reallocation bumps the [`generation`](BufferSet::generation)
//! and republishes the [`BilateralConstants`].

use smallvec::SmallVec;

use crate::errors::{Result, VolumetricError};
use crate::renderer::bilateral::BilateralConstants;
use crate::renderer::settings::QualityTier;
use crate::renderer::surface::{Surface, SurfaceAllocator, SurfaceDesc, SurfaceSlot};

/// Slots whose storage is owned by the buffer set, in allocation order.
const OWNED_SLOTS: [SurfaceSlot; 5] = [
    SurfaceSlot::FullColor,
    SurfaceSlot::HalfColor,
    SurfaceSlot::HalfDepth,
    SurfaceSlot::QuarterColor,
    SurfaceSlot::QuarterDepth,
];

const fn owned_index(slot: SurfaceSlot) -> Option<usize> {
    match slot {
        SurfaceSlot::FullColor => Some(0),
        SurfaceSlot::HalfColor => Some(1),
        SurfaceSlot::HalfDepth => Some(2),
        SurfaceSlot::QuarterColor => Some(3),
        SurfaceSlot::QuarterDepth => Some(4),
        SurfaceSlot::BlurTemp | SurfaceSlot::SceneDepth | SurfaceSlot::ActiveTarget => None,
    }
}

/// Viewport size and tier a buffer set was allocated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferLayout {
    pub width: u32,
    pub height: u32,
    pub tier: QualityTier,
}

impl BufferLayout {
    #[must_use]
    pub const fn new(width: u32, height: u32, tier: QualityTier) -> Self {
        Self { width, height, tier }
    }

    #[inline]
    #[must_use]
    pub const fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns `true` when every surface the tier needs has a non-empty extent.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        let (w, h) = self.tier.scale_extent(self.width, self.height);
        w > 0 && h > 0
    }

    /// The slot the upstream light-accumulation pass writes into.
    #[must_use]
    pub const fn light_buffer_slot(&self) -> SurfaceSlot {
        match self.tier {
            QualityTier::Full => SurfaceSlot::FullColor,
            QualityTier::Half => SurfaceSlot::HalfColor,
            QualityTier::Quarter => SurfaceSlot::QuarterColor,
        }
    }

    /// Surfaces the tier requires, in allocation order.
    #[must_use]
    pub fn required_surfaces(&self) -> SmallVec<[(SurfaceSlot, SurfaceDesc); 5]> {
        let viewport = self.viewport();
        let mut out = SmallVec::new();
        out.push((
            SurfaceSlot::FullColor,
            SurfaceDesc::light_buffer(viewport, QualityTier::Full),
        ));

        if self.tier.is_reduced() {
            out.push((
                SurfaceSlot::HalfColor,
                SurfaceDesc::light_buffer(viewport, QualityTier::Half),
            ));
            out.push((
                SurfaceSlot::HalfDepth,
                SurfaceDesc::depth_helper(viewport, QualityTier::Half),
            ));
        }

        if self.tier == QualityTier::Quarter {
            out.push((
                SurfaceSlot::QuarterColor,
                SurfaceDesc::light_buffer(viewport, QualityTier::Quarter),
            ));
            out.push((
                SurfaceSlot::QuarterDepth,
                SurfaceDesc::depth_helper(viewport, QualityTier::Quarter),
            ));
        }
        out
    }

    /// Extent of a slot under this layout, `None` for slots the layout does
    /// not provide.
    #[must_use]
    pub fn extent_of(&self, slot: SurfaceSlot) -> Option<(u32, u32)> {
        let provided = match slot {
            SurfaceSlot::FullColor
            | SurfaceSlot::BlurTemp
            | SurfaceSlot::SceneDepth
            | SurfaceSlot::ActiveTarget => true,
            SurfaceSlot::HalfColor | SurfaceSlot::HalfDepth => self.tier.is_reduced(),
            SurfaceSlot::QuarterColor | SurfaceSlot::QuarterDepth => {
                self.tier == QualityTier::Quarter
            }
        };
        provided.then(|| slot.extent(self.width, self.height))
    }
}

/// Persistent volumetric render targets.
///
/// Generic over the backend surface handle `S` so the lifecycle can be driven
/// by any [`SurfaceAllocator`].
pub struct BufferSet<S> {
    layout: Option<BufferLayout>,
    surfaces: [Option<Surface<S>>; 5],
    constants: BilateralConstants,
    generation: u64,
}

impl<S> Default for BufferSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> BufferSet<S> {
    /// Creates an empty buffer set. No surfaces exist until the first
    /// [`reallocate`](Self::reallocate).
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: None,
            surfaces: [None, None, None, None, None],
            constants: BilateralConstants::default(),
            generation: 0,
        }
    }

    /// The layout of the current allocation, `None` when nothing is allocated.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> Option<BufferLayout> {
        self.layout
    }

    /// Incremented every time the owned surfaces change.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Filter constants for the current allocation.
    #[inline]
    #[must_use]
    pub fn constants(&self) -> &BilateralConstants {
        &self.constants
    }

    /// Returns `true` when the current allocation does not match the request.
    #[must_use]
    pub fn needs_reallocation(&self, width: u32, height: u32, tier: QualityTier) -> bool {
        self.layout != Some(BufferLayout::new(width, height, tier))
    }

    /// Destroys every owned surface and allocates the set `tier` requires for
    /// a `width × height` viewport.
    ///
    /// An empty viewport (or one too small for the tier's lowest resolution)
    /// is rejected with [`VolumetricError::InvalidViewport`] before anything
    /// is destroyed, so the previous surfaces stay usable. Backend allocation
    /// failures are propagated; surfaces created by the failed call are
    /// destroyed again and the set is left empty.
    pub fn reallocate<A>(
        &mut self,
        allocator: &mut A,
        width: u32,
        height: u32,
        tier: QualityTier,
    ) -> Result<()>
    where
        A: SurfaceAllocator<Surface = S>,
    {
        let layout = BufferLayout::new(width, height, tier);
        if !layout.is_valid() {
            return Err(VolumetricError::InvalidViewport {
                width,
                height,
                tier,
            });
        }

        self.release(allocator);

        let mut created: SmallVec<[(SurfaceSlot, Surface<S>); 5]> = SmallVec::new();
        for (slot, desc) in layout.required_surfaces() {
            match allocator.create_surface(&desc) {
                Ok(handle) => created.push((slot, Surface { desc, handle })),
                Err(err) => {
                    for (_, surface) in created {
                        allocator.destroy_surface(surface.handle);
                    }
                    return Err(err);
                }
            }
        }

        let count = created.len();
        for (slot, surface) in created {
            if let Some(index) = owned_index(slot) {
                self.surfaces[index] = Some(surface);
            }
        }

        self.layout = Some(layout);
        self.constants = BilateralConstants::new(width, height, tier);
        self.generation += 1;

        log::info!(
            "Volumetric buffers reallocated: {width}x{height} {tier} tier, {count} surfaces (generation {})",
            self.generation
        );
        Ok(())
    }

    /// Explicitly destroys every owned surface.
    pub fn release<A>(&mut self, allocator: &mut A)
    where
        A: SurfaceAllocator<Surface = S>,
    {
        let mut released = false;
        for slot in &mut self.surfaces {
            if let Some(surface) = slot.take() {
                allocator.destroy_surface(surface.handle);
                released = true;
            }
        }

        if released || self.layout.is_some() {
            self.layout = None;
            self.constants = BilateralConstants::default();
            self.generation += 1;
        }
    }

    /// Looks up an owned surface. External and transient slots always
    /// return `None`.
    #[must_use]
    pub fn surface(&self, slot: SurfaceSlot) -> Option<&Surface<S>> {
        owned_index(slot).and_then(|index| self.surfaces[index].as_ref())
    }

    /// The surface the upstream light-accumulation pass writes into.
    #[must_use]
    pub fn light_buffer(&self) -> Option<&Surface<S>> {
        self.layout
            .and_then(|layout| self.surface(layout.light_buffer_slot()))
    }

    /// Iterates the allocated surfaces in allocation order.
    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceSlot, &Surface<S>)> {
        OWNED_SLOTS
            .iter()
            .zip(self.surfaces.iter())
            .filter_map(|(slot, surface)| surface.as_ref().map(|s| (*slot, s)))
    }

    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.iter().filter(|s| s.is_some()).count()
    }
}
