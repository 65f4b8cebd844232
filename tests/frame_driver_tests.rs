//! Frame Driver Tests
//!
//! Tests for:
//! - End-to-end tier switching (1920×1080 Quarter → Full)
//! - Per-frame light-pass context and listener broadcast
//! - Viewport changes, empty viewports and stale sequences
//! - Blur temporary scoped to its pass span and to one frame
//! - Shutdown and settings serialization

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use volumetric_lighting::errors::VolumetricError;
use volumetric_lighting::renderer::frame::{ClipSpaceConvention, FrameDriver, HostCamera};
use volumetric_lighting::renderer::listeners::LightPassContext;
use volumetric_lighting::renderer::sequencer::FilterOperation;
use volumetric_lighting::renderer::settings::{NoiseFallback, QualityTier, VolumetricSettings};
use volumetric_lighting::renderer::surface::{HeadlessAllocator, HeadlessSurface, SurfaceSlot};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn camera(width: u32, height: u32) -> HostCamera {
    HostCamera {
        projection: Mat4::perspective_rh(1.0, width as f32 / height.max(1) as f32, 0.1, 100.0),
        view: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y),
        viewport: (width, height),
        clip_convention: ClipSpaceConvention::Native,
    }
}

fn driver(tier: QualityTier) -> FrameDriver<HeadlessSurface> {
    FrameDriver::new(VolumetricSettings {
        tier,
        ..Default::default()
    })
}

fn extent(driver: &FrameDriver<HeadlessSurface>, slot: SurfaceSlot) -> Option<(u32, u32)> {
    driver.buffers().surface(slot).map(|s| s.desc.extent())
}

/// Replays the filter chain headlessly and returns the number of passes visited.
fn replay(driver: &mut FrameDriver<HeadlessSurface>, alloc: &mut HeadlessAllocator) -> usize {
    let mut chain = driver.filter_chain().unwrap();
    let mut visited = 0;
    chain
        .replay(alloc, |_, _| {
            visited += 1;
            Ok(())
        })
        .unwrap();
    visited
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn quarter_to_full_scenario() {
    init_logger();
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Quarter);
    let cam = camera(1920, 1080);

    let ctx = driver.begin_frame(&mut alloc, &cam).unwrap().unwrap();
    assert_eq!(ctx.target, SurfaceSlot::QuarterColor);
    assert_eq!(ctx.target_extent, (480, 270));

    assert_eq!(extent(&driver, SurfaceSlot::FullColor), Some((1920, 1080)));
    assert_eq!(extent(&driver, SurfaceSlot::HalfColor), Some((960, 540)));
    assert_eq!(extent(&driver, SurfaceSlot::HalfDepth), Some((960, 540)));
    assert_eq!(extent(&driver, SurfaceSlot::QuarterColor), Some((480, 270)));
    assert_eq!(extent(&driver, SurfaceSlot::QuarterDepth), Some((480, 270)));

    let ops = driver.sequence().unwrap().operations();
    assert_eq!(ops.len(), 5);
    assert_eq!(
        &ops[3..],
        &[FilterOperation::BlurHorizontal, FilterOperation::BlurVertical]
    );
    assert_eq!(replay(&mut driver, &mut alloc), 5);
    driver.end_frame(&mut alloc);

    let quarter_handles: Vec<_> = [
        SurfaceSlot::HalfColor,
        SurfaceSlot::HalfDepth,
        SurfaceSlot::QuarterColor,
        SurfaceSlot::QuarterDepth,
    ]
    .iter()
    .map(|&slot| driver.buffers().surface(slot).unwrap().handle)
    .collect();

    driver.set_tier(QualityTier::Full);
    // Nothing changes until the next frame boundary.
    assert_eq!(driver.buffers().surface_count(), 5);

    driver.begin_frame(&mut alloc, &cam).unwrap().unwrap();
    assert!(quarter_handles.iter().all(|&h| !alloc.is_live(h)));
    assert_eq!(driver.buffers().surface_count(), 1);
    assert_eq!(driver.sequence().unwrap().len(), 2);
    assert_eq!(replay(&mut driver, &mut alloc), 2);
}

#[test]
fn every_tier_produces_expected_pass_count() {
    let mut alloc = HeadlessAllocator::new();
    for (tier, passes) in [
        (QualityTier::Full, 2),
        (QualityTier::Half, 4),
        (QualityTier::Quarter, 5),
    ] {
        let mut driver = driver(tier);
        driver.begin_frame(&mut alloc, &camera(1280, 720)).unwrap();
        assert_eq!(driver.sequence().unwrap().len(), passes, "{tier}");
        driver.shutdown(&mut alloc);
    }
    assert_eq!(alloc.live_count(), 0);
}

// ============================================================================
// Light-pass context
// ============================================================================

#[test]
fn context_carries_view_projection() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Full);
    let cam = camera(800, 600);

    let ctx = driver.begin_frame(&mut alloc, &cam).unwrap().unwrap();
    assert_eq!(ctx.view_projection, cam.projection * cam.view);
    assert_eq!(ctx.frame_index, 1);
    assert_eq!(ctx.depth_attachment, Some(SurfaceSlot::SceneDepth));

    driver.set_tier(QualityTier::Half);
    let ctx = driver.begin_frame(&mut alloc, &cam).unwrap().unwrap();
    assert_eq!(ctx.frame_index, 2);
    assert_eq!(ctx.depth_attachment, None);
    assert_eq!(ctx.target, SurfaceSlot::HalfColor);
}

#[test]
fn gl_camera_gets_adjusted_projection() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Full);
    let mut cam = camera(800, 600);
    cam.projection = Mat4::perspective_rh_gl(1.0, 4.0 / 3.0, 0.1, 100.0);
    cam.clip_convention = ClipSpaceConvention::FlipYRescaleDepth;

    let ctx = driver.begin_frame(&mut alloc, &cam).unwrap().unwrap();
    assert_ne!(ctx.view_projection, cam.projection * cam.view);
}

#[test]
fn listeners_receive_every_frame() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Half);
    let seen: Rc<RefCell<Vec<u64>>> = Rc::default();

    let sink = Rc::clone(&seen);
    let key = driver
        .listeners_mut()
        .add(move |ctx: &LightPassContext| sink.borrow_mut().push(ctx.frame_index));
    let (_, rx) = driver.listeners_mut().subscribe();

    for _ in 0..3 {
        driver.begin_frame(&mut alloc, &camera(640, 360)).unwrap();
        driver.end_frame(&mut alloc);
    }
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    let received: Vec<_> = rx.try_iter().map(|ctx| ctx.frame_index).collect();
    assert_eq!(received, vec![1, 2, 3]);

    assert!(driver.listeners_mut().remove(key));
    driver.begin_frame(&mut alloc, &camera(640, 360)).unwrap();
    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(rx.try_iter().count(), 1);
}

#[test]
fn clear_step_runs_before_broadcast() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Quarter);
    let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();

    let sink = Rc::clone(&order);
    driver
        .listeners_mut()
        .add(move |_: &LightPassContext| sink.borrow_mut().push("listener"));

    let cleared = Rc::clone(&order);
    driver
        .begin_frame_with(&mut alloc, &camera(640, 360), |buffers, ctx| {
            assert!(buffers.surface(ctx.target).is_some());
            cleared.borrow_mut().push("clear");
            Ok(())
        })
        .unwrap();

    assert_eq!(*order.borrow(), vec!["clear", "listener"]);
}

#[test]
fn failing_clear_is_propagated_without_broadcast() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Full);
    let (_, rx) = driver.listeners_mut().subscribe();

    let err = driver
        .begin_frame_with(&mut alloc, &camera(640, 360), |_, _| {
            Err(VolumetricError::BuffersNotReady)
        })
        .unwrap_err();
    assert_eq!(err, VolumetricError::BuffersNotReady);
    assert!(rx.try_recv().is_err());
}

// ============================================================================
// Viewport handling
// ============================================================================

#[test]
fn viewport_resize_reallocates() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Half);

    driver.begin_frame(&mut alloc, &camera(1280, 720)).unwrap();
    let generation = driver.buffers().generation();
    driver.begin_frame(&mut alloc, &camera(1280, 720)).unwrap();
    assert_eq!(driver.buffers().generation(), generation);

    driver.begin_frame(&mut alloc, &camera(1920, 1080)).unwrap();
    assert!(driver.buffers().generation() > generation);
    assert_eq!(extent(&driver, SurfaceSlot::HalfColor), Some((960, 540)));
    assert_eq!(alloc.live_count(), 3);
}

#[test]
fn empty_viewport_before_first_allocation_skips_frame() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Full);

    assert_eq!(driver.begin_frame(&mut alloc, &camera(0, 0)).unwrap(), None);
    assert!(driver.sequence().is_none());
    assert!(matches!(
        driver.filter_chain(),
        Err(VolumetricError::BuffersNotReady)
    ));
}

#[test]
fn empty_viewport_keeps_previous_buffers() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Quarter);
    driver.begin_frame(&mut alloc, &camera(1920, 1080)).unwrap();
    let generation = driver.buffers().generation();

    // Minimized window.
    let ctx = driver.begin_frame(&mut alloc, &camera(0, 0)).unwrap().unwrap();
    assert_eq!(ctx.target_extent, (480, 270));
    assert_eq!(driver.buffers().generation(), generation);
    assert_eq!(driver.buffers().surface_count(), 5);
    assert!(driver.filter_chain().is_ok());
}

// ============================================================================
// Transient surfaces
// ============================================================================

#[test]
fn blur_temporary_is_held_only_for_its_span() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Quarter);
    driver.begin_frame(&mut alloc, &camera(1920, 1080)).unwrap();
    let owned = driver.buffers().surface_count();

    let mut chain = driver.filter_chain().unwrap();
    let span = *chain.sequence.temporary();
    let mut seen: Vec<(FilterOperation, Option<HeadlessSurface>)> = Vec::new();
    chain
        .replay(&mut alloc, |filter, temporary| {
            if let Some(temp) = temporary {
                assert_eq!(temp.desc().extent(), (1920, 1080));
            }
            seen.push((filter.operation, temporary.map(|t| **t)));
            Ok(())
        })
        .unwrap();
    assert_eq!(chain.pool.free_count(), 1);

    assert_eq!(seen.len(), 5);
    for (index, (_, temp)) in seen.iter().enumerate() {
        assert_eq!(temp.is_some(), span.contains(index), "pass {index}");
    }
    assert_eq!(seen[3].0, FilterOperation::BlurHorizontal);
    assert_eq!(seen[3].1, seen[4].1, "both blur passes share one temporary");

    // Parked in the pool until the frame ends, then destroyed.
    let temp = seen[3].1.unwrap();
    assert!(alloc.is_live(temp));
    driver.end_frame(&mut alloc);
    assert!(!alloc.is_live(temp));
    assert_eq!(alloc.live_count(), owned);
}

#[test]
fn replay_stops_at_first_failing_pass() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Half);
    driver.begin_frame(&mut alloc, &camera(640, 360)).unwrap();

    let mut chain = driver.filter_chain().unwrap();
    let mut visited = 0;
    let err = chain
        .replay(&mut alloc, |filter, _| {
            visited += 1;
            match filter.operation {
                FilterOperation::BlurHorizontal => Err(VolumetricError::BuffersNotReady),
                _ => Ok(()),
            }
        })
        .unwrap_err();

    assert_eq!(err, VolumetricError::BuffersNotReady);
    assert_eq!(visited, 3);
    // The guard went back to the pool on the error path too.
    assert_eq!(chain.pool.free_count(), 1);
}

#[test]
fn blur_temporary_never_outlives_the_frame() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Full);
    let cam = camera(800, 600);

    for _ in 0..4 {
        driver.begin_frame(&mut alloc, &cam).unwrap();
        assert_eq!(replay(&mut driver, &mut alloc), 2);
        driver.end_frame(&mut alloc);
        // Only the light buffer survives the frame boundary.
        assert_eq!(alloc.live_count(), 1);
    }

    // One light buffer plus a fresh temporary per frame.
    assert_eq!(alloc.created_count(), 1 + 4);
    assert_eq!(alloc.destroyed_count(), 4);
}

#[test]
fn clear_color_is_read_before_the_frame_starts() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = FrameDriver::new(VolumetricSettings {
        clear_color: [0.0, 0.0, 0.0, 0.5],
        ..Default::default()
    });

    let clear_color = driver.settings().wgpu_clear_color();
    let mut cleared = None;
    driver
        .begin_frame_with(&mut alloc, &camera(320, 240), |_, _| {
            cleared = Some(clear_color);
            Ok(())
        })
        .unwrap();

    assert_eq!(cleared.map(|c| c.a), Some(0.5));
}

#[test]
fn reallocation_drops_pooled_temporaries() {
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Full);

    driver.begin_frame(&mut alloc, &camera(800, 600)).unwrap();
    replay(&mut driver, &mut alloc);
    driver.end_frame(&mut alloc);

    driver.begin_frame(&mut alloc, &camera(1024, 768)).unwrap();
    // Old light buffer and old temporary are both gone.
    assert_eq!(alloc.live_count(), 1);
    assert_eq!(alloc.destroyed_count(), 2);
}

// ============================================================================
// Shutdown and settings
// ============================================================================

#[test]
fn shutdown_destroys_everything() {
    init_logger();
    let mut alloc = HeadlessAllocator::new();
    let mut driver = driver(QualityTier::Quarter);
    driver.begin_frame(&mut alloc, &camera(1920, 1080)).unwrap();
    replay(&mut driver, &mut alloc);

    driver.shutdown(&mut alloc);
    assert_eq!(alloc.live_count(), 0);
    assert!(driver.sequence().is_none());
    assert!(driver.buffers().layout().is_none());
}

#[test]
fn settings_round_trip_through_json() {
    let settings = VolumetricSettings {
        tier: QualityTier::Half,
        clear_color: [0.1, 0.2, 0.3, 1.0],
        noise_fallback: NoiseFallback::ZeroFilled,
    };
    let json = serde_json::to_string(&settings).unwrap();
    assert!(json.contains("\"half\""));
    assert!(json.contains("\"zero_filled\""));

    let parsed: VolumetricSettings = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, settings);

    let partial: VolumetricSettings = serde_json::from_str(r#"{"tier":"quarter"}"#).unwrap();
    assert_eq!(partial.tier, QualityTier::Quarter);
    assert_eq!(partial.noise_fallback, NoiseFallback::Fail);
}
