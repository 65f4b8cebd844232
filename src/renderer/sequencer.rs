//! Filter Pass Sequencer
//!
//! Maps a buffer layout to the fixed, ordered list of post-light filter
//! passes that reconstruct the full-resolution light buffer.
//!
//! # Topology per tier
//!
//! ```text
//! Full:     BlurH(full → temp) → BlurV(temp → full)
//!
//! Half:     DownsampleDepth(scene → halfDepth)
//!           → UpsampleBilateral(half → full | halfDepth)
//!           → BlurH(full → temp) → BlurV(temp → full)
//!
//! Quarter:  DownsampleDepth(scene → halfDepth)
//!           → DownsampleDepth(halfDepth → quarterDepth)
//!           → UpsampleBilateral(quarter → full | quarterDepth)
//!           → BlurH(full → temp) → BlurV(temp → full)
//!
//! Always, once, after the above:
//!           CompositeAdd(full → active target)
//! ```
//!
//! Building is a pure function of `(layout, generation)`: rebuilding against
//! an unchanged [`BufferSet`] yields an identical sequence.

use crate::errors::{Result, VolumetricError};
use crate::renderer::bilateral::PassParameters;
use crate::renderer::buffer_set::{BufferLayout, BufferSet};
use crate::renderer::settings::QualityTier;
use crate::renderer::surface::{SurfaceDesc, SurfaceSlot};

/// The filter operation a pass performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperation {
    /// Min/representative depth reduction into a lower-resolution helper.
    DownsampleDepth,
    /// Cross-bilateral upsample guided by low- and full-resolution depth.
    UpsampleBilateral,
    /// Horizontal 1-D depth-aware blur.
    BlurHorizontal,
    /// Vertical 1-D depth-aware blur.
    BlurVertical,
    /// Additive blend of the finished buffer onto the active color target.
    CompositeAdd,
}

/// One step of the post-light filter chain.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPass {
    pub operation: FilterOperation,
    pub source: SurfaceSlot,
    pub dest: SurfaceSlot,
    pub params: PassParameters,
}

/// A transient surface alive for a contiguous range of passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporarySpan {
    pub slot: SurfaceSlot,
    pub desc: SurfaceDesc,
    /// Index of the first pass that uses the surface (acquire before it).
    pub first_pass: usize,
    /// Index of the last pass that uses the surface (release after it).
    pub last_pass: usize,
}

impl TemporarySpan {
    #[inline]
    #[must_use]
    pub fn contains(&self, pass_index: usize) -> bool {
        (self.first_pass..=self.last_pass).contains(&pass_index)
    }
}

/// The immutable filter chain for one `(tier, viewport)` allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSequence {
    layout: BufferLayout,
    generation: u64,
    passes: Vec<FilterPass>,
    temporary: TemporarySpan,
    composite: FilterPass,
}

impl PassSequence {
    #[inline]
    #[must_use]
    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    #[inline]
    #[must_use]
    pub fn tier(&self) -> QualityTier {
        self.layout.tier
    }

    /// Buffer generation the sequence was built against.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The tier-dependent passes, in execution order. Does not include the
    /// composite pass.
    #[inline]
    #[must_use]
    pub fn passes(&self) -> &[FilterPass] {
        &self.passes
    }

    #[must_use]
    pub fn operations(&self) -> Vec<FilterOperation> {
        self.passes.iter().map(|p| p.operation).collect()
    }

    /// The blur intermediate and the pass range it lives for.
    #[inline]
    #[must_use]
    pub fn temporary(&self) -> &TemporarySpan {
        &self.temporary
    }

    /// The final additive composite, run once after [`passes`](Self::passes).
    #[inline]
    #[must_use]
    pub fn composite(&self) -> &FilterPass {
        &self.composite
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Returns `true` when the sequence still matches the buffers' allocation.
    #[must_use]
    pub fn is_current_for<S>(&self, buffers: &BufferSet<S>) -> bool {
        self.generation == buffers.generation() && buffers.layout() == Some(self.layout)
    }
}

/// Builds the filter chain for `tier` against the current buffer set.
///
/// Fails with [`VolumetricError::BuffersNotReady`] before the first
/// allocation and with [`VolumetricError::TierMismatch`] when the buffers
/// were allocated for a different tier.
pub fn build_sequence<S>(tier: QualityTier, buffers: &BufferSet<S>) -> Result<PassSequence> {
    let layout = buffers.layout().ok_or(VolumetricError::BuffersNotReady)?;
    if layout.tier != tier {
        return Err(VolumetricError::TierMismatch {
            requested: tier,
            allocated: layout.tier,
        });
    }

    let sequence = sequence_for_layout(layout, buffers.generation());
    log::debug!(
        "Volumetric pass sequence rebuilt for {} tier ({}x{}): {:?}",
        tier,
        layout.width,
        layout.height,
        sequence.operations()
    );
    Ok(sequence)
}

/// Pure mapping from a layout to its filter chain.
#[must_use]
pub fn sequence_for_layout(layout: BufferLayout, generation: u64) -> PassSequence {
    let (width, height) = layout.viewport();
    let pass = |operation, source: SurfaceSlot, dest: SurfaceSlot, guides: &[SurfaceSlot]| {
        FilterPass {
            operation,
            source,
            dest,
            params: PassParameters::new(
                source.texel_size(width, height),
                dest.texel_size(width, height),
                guides,
            ),
        }
    };

    let mut passes = Vec::with_capacity(5);

    match layout.tier {
        QualityTier::Full => {}
        QualityTier::Half => {
            passes.push(pass(
                FilterOperation::DownsampleDepth,
                SurfaceSlot::SceneDepth,
                SurfaceSlot::HalfDepth,
                &[SurfaceSlot::SceneDepth],
            ));
            passes.push(pass(
                FilterOperation::UpsampleBilateral,
                SurfaceSlot::HalfColor,
                SurfaceSlot::FullColor,
                &[SurfaceSlot::SceneDepth, SurfaceSlot::HalfDepth],
            ));
        }
        QualityTier::Quarter => {
            passes.push(pass(
                FilterOperation::DownsampleDepth,
                SurfaceSlot::SceneDepth,
                SurfaceSlot::HalfDepth,
                &[SurfaceSlot::SceneDepth],
            ));
            passes.push(pass(
                FilterOperation::DownsampleDepth,
                SurfaceSlot::HalfDepth,
                SurfaceSlot::QuarterDepth,
                &[SurfaceSlot::HalfDepth],
            ));
            passes.push(pass(
                FilterOperation::UpsampleBilateral,
                SurfaceSlot::QuarterColor,
                SurfaceSlot::FullColor,
                &[SurfaceSlot::SceneDepth, SurfaceSlot::QuarterDepth],
            ));
        }
    }

    // Separable depth-aware blur at full resolution, through the temporary.
    let first_blur = passes.len();
    passes.push(pass(
        FilterOperation::BlurHorizontal,
        SurfaceSlot::FullColor,
        SurfaceSlot::BlurTemp,
        &[SurfaceSlot::SceneDepth],
    ));
    passes.push(pass(
        FilterOperation::BlurVertical,
        SurfaceSlot::BlurTemp,
        SurfaceSlot::FullColor,
        &[SurfaceSlot::SceneDepth],
    ));

    let temporary = TemporarySpan {
        slot: SurfaceSlot::BlurTemp,
        desc: SurfaceDesc::blur_temp(layout.viewport()),
        first_pass: first_blur,
        last_pass: first_blur + 1,
    };

    let composite = pass(
        FilterOperation::CompositeAdd,
        SurfaceSlot::FullColor,
        SurfaceSlot::ActiveTarget,
        &[],
    );

    PassSequence {
        layout,
        generation,
        passes,
        temporary,
        composite,
    }
}
