//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`VolumetricError`] covers all failure modes including:
//! - Viewport / render-target allocation failures
//! - Noise asset decoding errors
//! - Quality tier parsing errors
//! - Pass sequences replayed against reallocated buffers
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, VolumetricError>`.
//!
//! ```rust,ignore
//! use volumetric_lighting::errors::{VolumetricError, Result};
//!
//! fn load_noise(bytes: &[u8]) -> Result<NoiseVolume> {
//!     NoiseVolume::decode(bytes)
//! }
//! ```

use thiserror::Error;

use crate::renderer::settings::QualityTier;

/// The main error type for the volumetric lighting pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolumetricError {
    // ========================================================================
    // Render Target Errors
    // ========================================================================
    /// The viewport is too small to hold the surfaces a tier requires.
    ///
    /// Recovered locally: the previous [`BufferSet`](crate::renderer::BufferSet)
    /// stays in place.
    #[error("Invalid viewport {width}x{height} for {tier:?} tier")]
    InvalidViewport {
        /// Requested viewport width in pixels
        width: u32,
        /// Requested viewport height in pixels
        height: u32,
        /// Tier that was being allocated
        tier: QualityTier,
    },

    /// The graphics backend refused to create a surface.
    #[error("Failed to allocate surface '{label}': {reason}")]
    SurfaceAllocation {
        /// Debug label of the surface
        label: &'static str,
        /// Backend-provided reason
        reason: String,
    },

    /// A pass sequence was requested before any surfaces were allocated.
    #[error("Volumetric buffers are not allocated yet")]
    BuffersNotReady,

    /// A pass sequence was built for a buffer generation that no longer exists.
    #[error("Pass sequence built for buffer generation {sequence}, buffers are at {buffers}")]
    StaleSequence {
        /// Generation the sequence was built against
        sequence: u64,
        /// Current buffer generation
        buffers: u64,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A quality tier value outside the closed `Full | Half | Quarter` set.
    #[error("Unsupported quality tier: {0}")]
    UnsupportedTier(String),

    /// The requested tier does not match the tier the buffers were built for.
    #[error("Buffers are allocated for {allocated:?}, sequence requested for {requested:?}")]
    TierMismatch {
        /// Tier the caller asked for
        requested: QualityTier,
        /// Tier of the current allocation
        allocated: QualityTier,
    },

    // ========================================================================
    // Asset Errors
    // ========================================================================
    /// An input asset blob is truncated or its header is inconsistent.
    #[error("Corrupt asset '{asset}': {reason}")]
    CorruptAsset {
        /// Asset name
        asset: &'static str,
        /// What failed validation
        reason: String,
    },
}

/// Alias for `Result<T, VolumetricError>`.
pub type Result<T> = std::result::Result<T, VolumetricError>;
