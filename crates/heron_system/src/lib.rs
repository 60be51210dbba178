//! Heron System - Audio System Boundary
//!
//! This crate defines the vocabulary shared between the policy core and the
//! platform below it:
//! - Output device capability masks (`DeviceMask`)
//! - Logical stream categories (`StreamType`) and output identifiers
//! - The collaborator traits the policy core calls into: the hardware
//!   command sink (`PolicyClient`), the index-to-volume curve
//!   (`VolumeCurve`) and the persisted property store (`ConfigStore`)
//! - An in-memory mock implementation of all three, used by tests
//!
//! # Architecture
//!
//! The policy core never talks to hardware directly. Every routing or gain
//! decision it makes is pushed through `PolicyClient` as a fire-and-forget
//! command, mirroring the split between policy (what device, what volume)
//! and mechanism (actual routing and gain application).

mod device;
mod stream;
mod traits;

pub mod mock;

pub use device::DeviceMask;
pub use stream::{OutputId, StreamType, STREAM_COUNT};
pub use traits::{ConfigStore, PolicyClient, VolumeCurve};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let _mask = DeviceMask::SPEAKER;
        let _stream = StreamType::Music;
    }
}
