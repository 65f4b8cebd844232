//! Pass Sequencer Tests
//!
//! Tests for:
//! - Exact pass lists per quality tier
//! - Source / destination / depth guide wiring of each pass
//! - Per-pass texel sizes
//! - Rebuilt vs. fresh sequences, idempotence
//! - Errors for missing or mismatched allocations

use glam::Vec2;

use volumetric_lighting::errors::VolumetricError;
use volumetric_lighting::renderer::sequencer::{
    FilterOperation, build_sequence, sequence_for_layout,
};
use volumetric_lighting::renderer::settings::QualityTier;
use volumetric_lighting::renderer::surface::{HeadlessAllocator, HeadlessSurface, SurfaceSlot};
use volumetric_lighting::renderer::{BufferLayout, BufferSet};

use FilterOperation::{
    BlurHorizontal, BlurVertical, CompositeAdd, DownsampleDepth, UpsampleBilateral,
};

fn allocated(
    width: u32,
    height: u32,
    tier: QualityTier,
) -> (HeadlessAllocator, BufferSet<HeadlessSurface>) {
    let mut alloc = HeadlessAllocator::new();
    let mut buffers = BufferSet::new();
    buffers.reallocate(&mut alloc, width, height, tier).unwrap();
    (alloc, buffers)
}

// ============================================================================
// Pass lists
// ============================================================================

#[test]
fn full_tier_is_blur_only() {
    let (_, buffers) = allocated(1920, 1080, QualityTier::Full);
    let seq = build_sequence(QualityTier::Full, &buffers).unwrap();
    assert_eq!(seq.operations(), vec![BlurHorizontal, BlurVertical]);
}

#[test]
fn half_tier_pass_list() {
    let (_, buffers) = allocated(1920, 1080, QualityTier::Half);
    let seq = build_sequence(QualityTier::Half, &buffers).unwrap();
    assert_eq!(
        seq.operations(),
        vec![DownsampleDepth, UpsampleBilateral, BlurHorizontal, BlurVertical]
    );
}

#[test]
fn quarter_tier_pass_list() {
    let (_, buffers) = allocated(1920, 1080, QualityTier::Quarter);
    let seq = build_sequence(QualityTier::Quarter, &buffers).unwrap();
    assert_eq!(
        seq.operations(),
        vec![
            DownsampleDepth,
            DownsampleDepth,
            UpsampleBilateral,
            BlurHorizontal,
            BlurVertical
        ]
    );
    assert_eq!(seq.len(), 5);
}

#[test]
fn every_sequence_ends_with_blur_pair() {
    for tier in QualityTier::ALL {
        let (_, buffers) = allocated(640, 480, tier);
        let seq = build_sequence(tier, &buffers).unwrap();
        let ops = seq.operations();
        assert_eq!(&ops[ops.len() - 2..], &[BlurHorizontal, BlurVertical], "{tier}");
        assert!(!ops.contains(&CompositeAdd));
    }
}

// ============================================================================
// Wiring
// ============================================================================

#[test]
fn quarter_tier_wiring() {
    let (_, buffers) = allocated(1920, 1080, QualityTier::Quarter);
    let seq = build_sequence(QualityTier::Quarter, &buffers).unwrap();
    let p = seq.passes();

    assert_eq!((p[0].source, p[0].dest), (SurfaceSlot::SceneDepth, SurfaceSlot::HalfDepth));
    assert_eq!((p[1].source, p[1].dest), (SurfaceSlot::HalfDepth, SurfaceSlot::QuarterDepth));
    assert_eq!((p[2].source, p[2].dest), (SurfaceSlot::QuarterColor, SurfaceSlot::FullColor));
    assert_eq!(
        p[2].params.depth_guides.as_slice(),
        &[SurfaceSlot::SceneDepth, SurfaceSlot::QuarterDepth]
    );
    assert_eq!((p[3].source, p[3].dest), (SurfaceSlot::FullColor, SurfaceSlot::BlurTemp));
    assert_eq!((p[4].source, p[4].dest), (SurfaceSlot::BlurTemp, SurfaceSlot::FullColor));
}

#[test]
fn half_tier_upsample_guides() {
    let (_, buffers) = allocated(1920, 1080, QualityTier::Half);
    let seq = build_sequence(QualityTier::Half, &buffers).unwrap();
    let upsample = &seq.passes()[1];

    assert_eq!(upsample.source, SurfaceSlot::HalfColor);
    assert_eq!(
        upsample.params.depth_guides.as_slice(),
        &[SurfaceSlot::SceneDepth, SurfaceSlot::HalfDepth]
    );
}

#[test]
fn pass_texel_sizes_match_surfaces() {
    let (_, buffers) = allocated(1920, 1080, QualityTier::Quarter);
    let seq = build_sequence(QualityTier::Quarter, &buffers).unwrap();
    let p = seq.passes();

    assert_eq!(p[0].params.source_texel_size, Vec2::new(1.0 / 1920.0, 1.0 / 1080.0));
    assert_eq!(p[0].params.dest_texel_size, Vec2::new(1.0 / 960.0, 1.0 / 540.0));
    assert_eq!(p[2].params.source_texel_size, Vec2::new(1.0 / 480.0, 1.0 / 270.0));
}

#[test]
fn composite_adds_full_color_onto_active_target() {
    let (_, buffers) = allocated(800, 600, QualityTier::Half);
    let seq = build_sequence(QualityTier::Half, &buffers).unwrap();
    let composite = seq.composite();

    assert_eq!(composite.operation, CompositeAdd);
    assert_eq!(composite.source, SurfaceSlot::FullColor);
    assert_eq!(composite.dest, SurfaceSlot::ActiveTarget);
}

#[test]
fn temporary_spans_blur_pair() {
    let (_, buffers) = allocated(800, 600, QualityTier::Quarter);
    let seq = build_sequence(QualityTier::Quarter, &buffers).unwrap();
    let span = seq.temporary();

    assert_eq!((span.first_pass, span.last_pass), (3, 4));
    assert_eq!(span.desc.extent(), (800, 600));
    assert!(!span.contains(2));
}

// ============================================================================
// Rebuilds
// ============================================================================

#[test]
fn rebuilt_sequence_matches_fresh_sequence() {
    let (mut alloc, mut buffers) = allocated(1920, 1080, QualityTier::Quarter);
    build_sequence(QualityTier::Quarter, &buffers).unwrap();

    buffers.reallocate(&mut alloc, 1920, 1080, QualityTier::Half).unwrap();
    let rebuilt = build_sequence(QualityTier::Half, &buffers).unwrap();

    let (_, fresh_buffers) = allocated(1920, 1080, QualityTier::Half);
    let fresh = build_sequence(QualityTier::Half, &fresh_buffers).unwrap();

    assert_eq!(rebuilt.passes(), fresh.passes());
    assert_eq!(rebuilt.composite(), fresh.composite());
}

#[test]
fn building_twice_is_identical() {
    let (_, buffers) = allocated(1280, 720, QualityTier::Half);
    let a = build_sequence(QualityTier::Half, &buffers).unwrap();
    let b = build_sequence(QualityTier::Half, &buffers).unwrap();
    assert_eq!(a, b);
}

#[test]
fn sequence_goes_stale_on_reallocation() {
    let (mut alloc, mut buffers) = allocated(1280, 720, QualityTier::Full);
    let seq = build_sequence(QualityTier::Full, &buffers).unwrap();
    assert!(seq.is_current_for(&buffers));

    buffers.reallocate(&mut alloc, 1280, 720, QualityTier::Full).unwrap();
    assert!(!seq.is_current_for(&buffers));
}

#[test]
fn pure_mapping_matches_built_sequence() {
    let (_, buffers) = allocated(1024, 768, QualityTier::Quarter);
    let built = build_sequence(QualityTier::Quarter, &buffers).unwrap();
    let pure = sequence_for_layout(
        BufferLayout::new(1024, 768, QualityTier::Quarter),
        buffers.generation(),
    );
    assert_eq!(built, pure);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn unallocated_buffers_are_not_ready() {
    let buffers: BufferSet<HeadlessSurface> = BufferSet::new();
    assert_eq!(
        build_sequence(QualityTier::Full, &buffers),
        Err(VolumetricError::BuffersNotReady)
    );
}

#[test]
fn tier_mismatch_is_rejected() {
    let (_, buffers) = allocated(640, 480, QualityTier::Full);
    assert_eq!(
        build_sequence(QualityTier::Quarter, &buffers),
        Err(VolumetricError::TierMismatch {
            requested: QualityTier::Quarter,
            allocated: QualityTier::Full,
        })
    );
}
