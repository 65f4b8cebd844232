//! Volumetric light buffer pipeline.
//!
//! - [`settings`]: quality tiers and runtime configuration
//! - [`surface`]: surface descriptions and the allocator seam
//! - [`buffer_set`]: tier-dependent intermediate render targets
//! - [`sequencer`]: the filter pass list rebuilt on every reallocation
//! - [`frame`]: per-frame driver
//! - [`gpu`] / [`executor`]: wgpu allocation and pass recording

pub mod bilateral;
pub mod buffer_set;
pub mod executor;
pub mod frame;
pub mod gpu;
pub mod listeners;
pub mod sequencer;
pub mod settings;
pub mod surface;
pub mod transient_pool;

pub use bilateral::{BilateralConstants, BilateralUniforms, PassParameters};
pub use buffer_set::{BufferLayout, BufferSet};
pub use executor::{
    ExternalViews, FilterInputs, FilterProgram, clear_light_target, record_composite,
    record_filter_passes,
};
pub use frame::{ClipSpaceConvention, FilterChain, FrameDriver, HostCamera, view_projection};
pub use gpu::{
    GpuSurface, WgpuSurfaceAllocator, create_point_sampler, upload_dither_texture,
    upload_noise_texture,
};
pub use listeners::{LightPassContext, LightPassListener, LightPassListeners, ListenerKey};
pub use sequencer::{FilterOperation, FilterPass, PassSequence, TemporarySpan, build_sequence};
pub use settings::{NoiseFallback, QualityTier, VolumetricSettings};
pub use surface::{
    HeadlessAllocator, HeadlessSurface, Surface, SurfaceAllocator, SurfaceDesc, SurfacePurpose,
    SurfaceSlot,
};
pub use transient_pool::{TemporarySurface, TransientSurfacePool};
