#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod resources;

pub use errors::{Result, VolumetricError};
pub use renderer::{
    BufferSet, FilterOperation, FrameDriver, HostCamera, LightPassContext, PassSequence,
    QualityTier, VolumetricSettings,
};
pub use resources::{LightVolumeMesh, NoiseVolume};
