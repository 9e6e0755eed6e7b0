//! Error types for the `auto_farmers_sim` crate.
//!
//! Search misses and contended claims are not errors: they are ordinary
//! outcomes reported through `Decision` and `SimEvent`. Only configuration
//! loading, agent spawns, and host-facing grid edits can fail.

use crate::types::{GridCoord, PlanePos};

/// Errors raised while loading or validating a [`crate::config::FarmConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse config JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// A field holds a value the sim cannot run with.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by host-facing grid edits.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The coordinate lies outside `[0, width)` on some axis.
    #[error("cell {coord} is outside the {width}x{width} grid")]
    OutOfBounds { coord: GridCoord, width: u32 },
}

/// Errors raised when a spawn request carries values an agent cannot move with.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SpawnError {
    /// A per-agent speed override that is zero, negative, or not finite.
    #[error("agent speed must be positive and finite, got {0}")]
    InvalidSpeed(f32),

    #[error("spawn position ({}, {}) is not finite", .0.x, .0.z)]
    NonFinitePosition(PlanePos),
}
