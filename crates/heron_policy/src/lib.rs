//! Heron Policy - Audio Routing Policy Core
//!
//! This crate decides where audio goes and how loud it is, including:
//! - Priority-ordered device selection per routing strategy
//! - Per-stream volume computation, attenuation and change suppression
//! - Phone-state, forced-configuration and connection tracking
//! - A cached device table kept consistent across state transitions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Control Plane                           │
//! │  (telephony / settings) ──state changes──▶ PolicyEngine     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ device + volume commands
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PolicyClient                            │
//! │   set_stream_volume / set_voice_volume / set_fm_volume      │
//! │          (hardware mixer, owned by the platform)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine holds all mutable policy state; the selection and volume
//! logic live in their own modules but operate on the same `PolicyEngine`.

mod curve;
mod engine;
mod error;
mod output;
mod selector;
mod settings;
mod state;
mod strategy;
mod volume;

pub use curve::DefaultVolumeCurve;
pub use engine::PolicyEngine;
pub use error::{PolicyError, PolicyResult};
pub use output::OutputState;
pub use settings::PolicySettings;
pub use state::{ForceUsage, ForcedConfig, PhoneState, StreamDescriptor, FORCE_USAGE_COUNT};
pub use strategy::{Strategy, STRATEGY_COUNT};
pub use volume::{
    FM_ATTENUATION_DEFAULT_DB, FM_ATTENUATION_KEY, HEADSET_ATTENUATION_DEFAULT_DB,
    HEADSET_ATTENUATION_KEY, SPEAKER_ATTENUATION_DEFAULT_DB, SPEAKER_ATTENUATION_KEY,
};

// Re-export boundary types for convenience
pub use heron_system::{ConfigStore, DeviceMask, OutputId, PolicyClient, StreamType, VolumeCurve};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let _strategy = Strategy::for_stream(StreamType::Music);
        let _settings = PolicySettings::default();
    }
}
