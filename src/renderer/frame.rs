//! Per-Frame Driver
//!
//! [`FrameDriver`] is the entry point a host calls once per frame:
//!
//! ```text
//! begin_frame(camera)
//!   ├─ tier or viewport changed? → BufferSet::reallocate → build_sequence
//!   ├─ resolve adjusted view-projection
//!   ├─ select + clear the tier's light buffer
//!   └─ broadcast LightPassContext to per-light renderers
//!
//! (per-light renderers draw into the light buffer)
//!
//! filter_chain()          → replay the PassSequence + CompositeAdd
//! end_frame()             → destroy the frame's transient surfaces
//! ```
//!
//! Tier changes made through [`FrameDriver::set_tier`] (or the settings)
//! never touch surfaces immediately; they take effect at the next
//! `begin_frame`, so a reallocation can never happen between two passes of
//! the same frame.

use glam::Mat4;

use crate::errors::{Result, VolumetricError};
use crate::renderer::buffer_set::{BufferLayout, BufferSet};
use crate::renderer::listeners::{LightPassContext, LightPassListeners};
use crate::renderer::sequencer::{FilterPass, PassSequence, build_sequence};
use crate::renderer::settings::{QualityTier, VolumetricSettings};
use crate::renderer::surface::{SurfaceAllocator, SurfaceSlot};
use crate::renderer::transient_pool::{TemporarySurface, TransientSurfacePool};

/// How the host projection must be adjusted before rendering into a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipSpaceConvention {
    /// The projection already matches the backend's render-target convention.
    #[default]
    Native,
    /// The projection is GL-style (y-up, depth in `[-1, 1]`) while the backend
    /// renders textures y-down with depth in `[0, 1]`.
    FlipYRescaleDepth,
}

/// Camera state consumed from the host each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostCamera {
    pub projection: Mat4,
    /// World-to-camera transform.
    pub view: Mat4,
    /// Viewport size in pixels.
    pub viewport: (u32, u32),
    pub clip_convention: ClipSpaceConvention,
}

/// Applies the backend clip-space adjustment to a projection matrix.
///
/// For [`ClipSpaceConvention::FlipYRescaleDepth`] the second row is negated
/// and the third row becomes `0.5 * row2 + 0.5 * row3`, mapping GL depth
/// `[-1, 1]` onto `[0, 1]`.
#[must_use]
pub fn adjust_projection(projection: Mat4, convention: ClipSpaceConvention) -> Mat4 {
    match convention {
        ClipSpaceConvention::Native => projection,
        ClipSpaceConvention::FlipYRescaleDepth => {
            let r0 = projection.row(0);
            let r1 = -projection.row(1);
            let r2 = projection.row(2) * 0.5 + projection.row(3) * 0.5;
            let r3 = projection.row(3);
            Mat4::from_cols(r0, r1, r2, r3).transpose()
        }
    }
}

/// Adjusted `projection × view` for the frame.
#[must_use]
pub fn view_projection(camera: &HostCamera) -> Mat4 {
    adjust_projection(camera.projection, camera.clip_convention) * camera.view
}

/// Borrowed view of everything needed to replay the post-light passes.
pub struct FilterChain<'a, S> {
    pub buffers: &'a BufferSet<S>,
    pub sequence: &'a PassSequence,
    pub pool: &'a mut TransientSurfacePool<S>,
}

impl<S> FilterChain<'_, S> {
    /// Visits every filter pass in order.
    ///
    /// The blur temporary is acquired right before the first pass of its span
    /// and returned to the pool right after the last one. `visit` receives it
    /// only for passes inside the span.
    pub fn replay<A, F>(&mut self, allocator: &mut A, mut visit: F) -> Result<()>
    where
        A: SurfaceAllocator<Surface = S>,
        F: FnMut(&FilterPass, Option<&TemporarySurface<'_, S>>) -> Result<()>,
    {
        let sequence = self.sequence;
        let passes = sequence.passes();
        let span = *sequence.temporary();

        for filter in &passes[..span.first_pass] {
            visit(filter, None)?;
        }
        {
            let temporary = self.pool.acquire(allocator, &span.desc)?;
            for filter in &passes[span.first_pass..=span.last_pass] {
                visit(filter, Some(&temporary))?;
            }
        }
        for filter in &passes[span.last_pass + 1..] {
            visit(filter, None)?;
        }
        Ok(())
    }
}

/// Orchestrates buffer lifecycle, pass sequencing and listener broadcast.
pub struct FrameDriver<S> {
    settings: VolumetricSettings,
    buffers: BufferSet<S>,
    pool: TransientSurfacePool<S>,
    sequence: Option<PassSequence>,
    listeners: LightPassListeners,
    frame_index: u64,
    /// Last layout rejected as invalid, to report it once rather than every frame.
    rejected: Option<BufferLayout>,
}

impl<S> FrameDriver<S> {
    #[must_use]
    pub fn new(settings: VolumetricSettings) -> Self {
        Self {
            settings,
            buffers: BufferSet::new(),
            pool: TransientSurfacePool::new(),
            sequence: None,
            listeners: LightPassListeners::new(),
            frame_index: 0,
            rejected: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &VolumetricSettings {
        &self.settings
    }

    /// Mutable settings. Changes are applied at the next frame boundary.
    #[inline]
    pub fn settings_mut(&mut self) -> &mut VolumetricSettings {
        &mut self.settings
    }

    /// Requests a tier change for the next frame.
    pub fn set_tier(&mut self, tier: QualityTier) {
        self.settings.tier = tier;
    }

    #[inline]
    #[must_use]
    pub fn buffers(&self) -> &BufferSet<S> {
        &self.buffers
    }

    /// The filter chain of the current allocation.
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> Option<&PassSequence> {
        self.sequence.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn listeners(&self) -> &LightPassListeners {
        &self.listeners
    }

    #[inline]
    pub fn listeners_mut(&mut self) -> &mut LightPassListeners {
        &mut self.listeners
    }

    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Starts a frame without a backend clear step.
    ///
    /// See [`begin_frame_with`](Self::begin_frame_with).
    pub fn begin_frame<A>(
        &mut self,
        allocator: &mut A,
        camera: &HostCamera,
    ) -> Result<Option<LightPassContext>>
    where
        A: SurfaceAllocator<Surface = S>,
    {
        self.begin_frame_with(allocator, camera, |_, _| Ok(()))
    }

    /// Starts a frame.
    ///
    /// Reallocates buffers and rebuilds the pass sequence when the tier or
    /// viewport changed, computes the adjusted view-projection, runs `clear`
    /// on the selected light buffer and finally broadcasts the context to
    /// every listener.
    ///
    /// Returns `Ok(None)` while no valid allocation exists (e.g. the viewport
    /// has never been larger than zero); the frame should then skip
    /// volumetrics entirely. Backend allocation failures are returned as
    /// errors.
    pub fn begin_frame_with<A, F>(
        &mut self,
        allocator: &mut A,
        camera: &HostCamera,
        clear: F,
    ) -> Result<Option<LightPassContext>>
    where
        A: SurfaceAllocator<Surface = S>,
        F: FnOnce(&BufferSet<S>, &LightPassContext) -> Result<()>,
    {
        self.frame_index += 1;
        self.sync_allocation(allocator, camera.viewport)?;

        let Some(layout) = self.buffers.layout() else {
            return Ok(None);
        };

        let target = layout.light_buffer_slot();
        let ctx = LightPassContext {
            frame_index: self.frame_index,
            view_projection: view_projection(camera),
            tier: layout.tier,
            target,
            target_extent: target.extent(layout.width, layout.height),
            depth_attachment: (!layout.tier.is_reduced()).then_some(SurfaceSlot::SceneDepth),
        };

        clear(&self.buffers, &ctx)?;
        self.listeners.broadcast(&ctx);
        Ok(Some(ctx))
    }

    fn sync_allocation<A>(&mut self, allocator: &mut A, viewport: (u32, u32)) -> Result<()>
    where
        A: SurfaceAllocator<Surface = S>,
    {
        let (width, height) = viewport;
        let tier = self.settings.tier;
        if !self.buffers.needs_reallocation(width, height, tier) {
            return Ok(());
        }

        let requested = BufferLayout::new(width, height, tier);
        match self.buffers.reallocate(allocator, width, height, tier) {
            Ok(()) => {
                self.rejected = None;
                // Pooled temporaries are sized for the old viewport.
                self.pool.clear(allocator);
                self.sequence = Some(build_sequence(tier, &self.buffers)?);
                Ok(())
            }
            Err(err @ VolumetricError::InvalidViewport { .. }) => {
                if self.rejected != Some(requested) {
                    log::warn!("{err}; keeping previous volumetric buffers");
                    self.rejected = Some(requested);
                }
                Ok(())
            }
            Err(err) => {
                self.sequence = None;
                Err(err)
            }
        }
    }

    /// Borrows the buffers, sequence and transient pool for pass replay.
    ///
    /// Fails with [`VolumetricError::StaleSequence`] if the sequence no
    /// longer matches the buffers.
    pub fn filter_chain(&mut self) -> Result<FilterChain<'_, S>> {
        let sequence = self
            .sequence
            .as_ref()
            .ok_or(VolumetricError::BuffersNotReady)?;

        if !sequence.is_current_for(&self.buffers) {
            log::warn!(
                "Volumetric pass sequence is stale (generation {} vs {})",
                sequence.generation(),
                self.buffers.generation()
            );
            return Err(VolumetricError::StaleSequence {
                sequence: sequence.generation(),
                buffers: self.buffers.generation(),
            });
        }

        Ok(FilterChain {
            buffers: &self.buffers,
            sequence,
            pool: &mut self.pool,
        })
    }

    /// Ends the frame: destroys every transient surface the frame used.
    pub fn end_frame<A>(&mut self, allocator: &mut A)
    where
        A: SurfaceAllocator<Surface = S>,
    {
        self.pool.clear(allocator);
    }

    /// Destroys every surface owned by the driver.
    pub fn shutdown<A>(&mut self, allocator: &mut A)
    where
        A: SurfaceAllocator<Surface = S>,
    {
        self.sequence = None;
        self.buffers.release(allocator);
        self.pool.clear(allocator);
        log::info!("Volumetric frame driver shut down");
    }
}
