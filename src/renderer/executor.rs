//! Pass Recording
//!
//! Replays a [`PassSequence`](crate::renderer::sequencer::PassSequence) into a
//! `wgpu::CommandEncoder`. Every filter pass is a full-screen triangle drawn
//! into its destination surface; the shader programs themselves are supplied
//! by the host through [`FilterProgram`].

use smallvec::SmallVec;

use crate::errors::{Result, VolumetricError};
use crate::renderer::bilateral::BilateralUniforms;
use crate::renderer::buffer_set::BufferSet;
use crate::renderer::frame::FilterChain;
use crate::renderer::gpu::{GpuSurface, WgpuSurfaceAllocator};
use crate::renderer::listeners::LightPassContext;
use crate::renderer::sequencer::{FilterOperation, FilterPass};
use crate::renderer::surface::SurfaceSlot;
use crate::renderer::transient_pool::TemporarySurface;

/// Host-provided views that are not owned by the volumetric pipeline.
#[derive(Clone, Copy)]
pub struct ExternalViews<'a> {
    pub scene_depth: &'a wgpu::TextureView,
    pub active_target: &'a wgpu::TextureView,
}

/// Resolved inputs for one filter pass.
pub struct FilterInputs<'a> {
    pub source: &'a wgpu::TextureView,
    /// Depth guides, in the order listed by the pass parameters.
    pub guides: SmallVec<[&'a wgpu::TextureView; 2]>,
    pub uniforms: BilateralUniforms,
    pub dest_format: wgpu::TextureFormat,
}

/// Shader programs for the filter operations.
///
/// `bind` sets the pipeline and bind groups; the caller issues the draw.
pub trait FilterProgram {
    fn bind(
        &mut self,
        pass: &mut wgpu::RenderPass<'_>,
        filter: &FilterPass,
        inputs: &FilterInputs<'_>,
    );
}

fn pass_label(operation: FilterOperation) -> &'static str {
    match operation {
        FilterOperation::DownsampleDepth => "Volumetric Downsample Depth",
        FilterOperation::UpsampleBilateral => "Volumetric Bilateral Upsample",
        FilterOperation::BlurHorizontal => "Volumetric Blur H",
        FilterOperation::BlurVertical => "Volumetric Blur V",
        FilterOperation::CompositeAdd => "Volumetric Composite",
    }
}

fn resolve_view<'v>(
    slot: SurfaceSlot,
    buffers: &'v BufferSet<GpuSurface>,
    external: &ExternalViews<'v>,
    temporary: Option<&'v GpuSurface>,
) -> Result<&'v wgpu::TextureView> {
    match slot {
        SurfaceSlot::SceneDepth => Ok(external.scene_depth),
        SurfaceSlot::ActiveTarget => Ok(external.active_target),
        SurfaceSlot::BlurTemp => temporary
            .map(|t| &t.view)
            .ok_or(VolumetricError::BuffersNotReady),
        owned => buffers
            .surface(owned)
            .map(|s| &s.handle.view)
            .ok_or(VolumetricError::BuffersNotReady),
    }
}

fn record_pass(
    encoder: &mut wgpu::CommandEncoder,
    filter: &FilterPass,
    dest: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    inputs: &FilterInputs<'_>,
    program: &mut impl FilterProgram,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(pass_label(filter.operation)),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: dest,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        ..Default::default()
    });

    program.bind(&mut pass, filter, inputs);
    pass.draw(0..3, 0..1); // fullscreen triangle
}

fn filter_inputs<'v>(
    filter: &FilterPass,
    buffers: &'v BufferSet<GpuSurface>,
    external: &ExternalViews<'v>,
    temporary: Option<&'v GpuSurface>,
    dest_format: wgpu::TextureFormat,
) -> Result<FilterInputs<'v>> {
    let source = resolve_view(filter.source, buffers, external, temporary)?;
    let guides = filter
        .params
        .depth_guides
        .iter()
        .map(|&slot| resolve_view(slot, buffers, external, temporary))
        .collect::<Result<SmallVec<_>>>()?;

    Ok(FilterInputs {
        source,
        guides,
        uniforms: buffers.constants().to_uniforms(),
        dest_format,
    })
}

fn record_filter(
    encoder: &mut wgpu::CommandEncoder,
    filter: &FilterPass,
    buffers: &BufferSet<GpuSurface>,
    external: &ExternalViews<'_>,
    temporary: Option<&TemporarySurface<'_, GpuSurface>>,
    program: &mut impl FilterProgram,
) -> Result<()> {
    let temp = temporary.map(|t| &**t);
    let dest = resolve_view(filter.dest, buffers, external, temp)?;
    let dest_format = match (filter.dest, temporary) {
        (SurfaceSlot::BlurTemp, Some(t)) => t.desc().format,
        (slot, _) => buffers
            .surface(slot)
            .map(|s| s.desc.format)
            .ok_or(VolumetricError::BuffersNotReady)?,
    };
    let inputs = filter_inputs(filter, buffers, external, temp, dest_format)?;
    let load = wgpu::LoadOp::DontCare(wgpu::LoadOpDontCare::default());
    record_pass(encoder, filter, dest, load, &inputs, program);
    Ok(())
}

/// Records every filter pass of the chain, in order.
///
/// The blur temporary is acquired from the transient pool right before its
/// first pass and goes back to the pool right after its last one.
pub fn record_filter_passes(
    encoder: &mut wgpu::CommandEncoder,
    chain: &mut FilterChain<'_, GpuSurface>,
    allocator: &mut WgpuSurfaceAllocator,
    external: &ExternalViews<'_>,
    program: &mut impl FilterProgram,
) -> Result<()> {
    let buffers = chain.buffers;
    chain.replay(allocator, |filter, temporary| {
        record_filter(&mut *encoder, filter, buffers, external, temporary, &mut *program)
    })
}

/// Records the additive composite of the finished buffer onto the active target.
pub fn record_composite(
    encoder: &mut wgpu::CommandEncoder,
    chain: &FilterChain<'_, GpuSurface>,
    external: &ExternalViews<'_>,
    target_format: wgpu::TextureFormat,
    program: &mut impl FilterProgram,
) -> Result<()> {
    let composite = chain.sequence.composite();
    let inputs = filter_inputs(composite, chain.buffers, external, None, target_format)?;
    record_pass(
        encoder,
        composite,
        external.active_target,
        wgpu::LoadOp::Load,
        &inputs,
        program,
    );
    Ok(())
}

/// Clears the frame's light buffer. Suitable as the `clear` step of
/// [`FrameDriver::begin_frame_with`](crate::renderer::frame::FrameDriver::begin_frame_with).
///
/// Read `clear_color` from [`VolumetricSettings::wgpu_clear_color`] before
/// starting the frame.
///
/// [`VolumetricSettings::wgpu_clear_color`]: crate::renderer::settings::VolumetricSettings::wgpu_clear_color
pub fn clear_light_target(
    encoder: &mut wgpu::CommandEncoder,
    clear_color: wgpu::Color,
    buffers: &BufferSet<GpuSurface>,
    ctx: &LightPassContext,
) -> Result<()> {
    let target = buffers
        .surface(ctx.target)
        .ok_or(VolumetricError::BuffersNotReady)?;

    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Volumetric Light Buffer Clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &target.handle.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        ..Default::default()
    });
    Ok(())
}
