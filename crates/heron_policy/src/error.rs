//! Policy Error Types

use thiserror::Error;

use heron_system::{OutputId, StreamType};

use crate::state::ForcedConfig;

/// Errors that can occur in the policy engine
///
/// No failure here is fatal: every error is local to one request and leaves
/// the engine state unmodified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    /// The call-audio path and the SCO path must never be volume-adjusted
    /// while the other one is the active routing. The condition persists
    /// until the communication force-use changes, so callers should drop
    /// the request rather than retry.
    #[error("cannot set {stream:?} volume while communication force-use is {forced:?}")]
    InvalidVolumeOperation {
        stream: StreamType,
        forced: ForcedConfig,
    },

    #[error("output {0} is not open")]
    UnknownOutput(OutputId),

    #[error("volume index {index} out of range [{min}, {max}] for stream {stream:?}")]
    IndexOutOfRange {
        stream: StreamType,
        index: u32,
        min: u32,
        max: u32,
    },
}

/// Result type alias for policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;
