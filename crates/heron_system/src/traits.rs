//! Collaborator Traits
//!
//! Defines the interfaces the policy core depends on. Each trait has a real
//! implementation somewhere below the core (hardware abstraction, persisted
//! property store) and an in-memory stand-in in the `mock` module.

use std::sync::Arc;

use tracing::warn;

use crate::device::DeviceMask;
use crate::stream::{OutputId, StreamType};

/// Hardware command sink
///
/// All methods are fire-and-forget: the collaborator queues the command and
/// interprets `delay_ms` itself, and the policy core never consumes a
/// return value.
pub trait PolicyClient {
    /// Apply a stream volume on an output path
    fn set_stream_volume(&self, stream: StreamType, volume: f32, output: OutputId, delay_ms: u32);

    /// Apply the call-audio volume on the primary hardware output
    fn set_voice_volume(&self, volume: f32, delay_ms: u32);

    /// Apply the FM radio volume on the primary hardware output
    fn set_fm_volume(&self, volume: f32, delay_ms: u32);
}

impl<T: PolicyClient + ?Sized> PolicyClient for &T {
    fn set_stream_volume(&self, stream: StreamType, volume: f32, output: OutputId, delay_ms: u32) {
        (**self).set_stream_volume(stream, volume, output, delay_ms)
    }

    fn set_voice_volume(&self, volume: f32, delay_ms: u32) {
        (**self).set_voice_volume(volume, delay_ms)
    }

    fn set_fm_volume(&self, volume: f32, delay_ms: u32) {
        (**self).set_fm_volume(volume, delay_ms)
    }
}

impl<T: PolicyClient + ?Sized> PolicyClient for Arc<T> {
    fn set_stream_volume(&self, stream: StreamType, volume: f32, output: OutputId, delay_ms: u32) {
        (**self).set_stream_volume(stream, volume, output, delay_ms)
    }

    fn set_voice_volume(&self, volume: f32, delay_ms: u32) {
        (**self).set_voice_volume(volume, delay_ms)
    }

    fn set_fm_volume(&self, volume: f32, delay_ms: u32) {
        (**self).set_fm_volume(volume, delay_ms)
    }
}

impl<T: PolicyClient + ?Sized> PolicyClient for Box<T> {
    fn set_stream_volume(&self, stream: StreamType, volume: f32, output: OutputId, delay_ms: u32) {
        (**self).set_stream_volume(stream, volume, output, delay_ms)
    }

    fn set_voice_volume(&self, volume: f32, delay_ms: u32) {
        (**self).set_voice_volume(volume, delay_ms)
    }

    fn set_fm_volume(&self, volume: f32, delay_ms: u32) {
        (**self).set_fm_volume(volume, delay_ms)
    }
}

/// Index-to-volume curve provider
///
/// Maps a user-facing volume index to a linear gain in `[0.0, 1.0]` for a
/// given stream on a given output and device.
pub trait VolumeCurve {
    fn gain(&self, stream: StreamType, index: u32, output: OutputId, device: DeviceMask) -> f32;
}

/// Persisted configuration store
///
/// Keys are stable names; values are stored as strings and parsed by the
/// caller. The store is externally owned and may change between reads.
pub trait ConfigStore {
    /// Look up `key`, returning `default` when unset
    fn get(&self, key: &str, default: &str) -> String;

    /// Look up a decimal dB value, falling back to `default_db` when the
    /// key is unset or unparsable
    fn get_db(&self, key: &str, default_db: f32) -> f32 {
        let raw = self.get(key, "");
        if raw.is_empty() {
            return default_db;
        }
        match raw.trim().parse::<f32>() {
            Ok(db) => db,
            Err(_) => {
                warn!("ignoring unparsable dB value {:?} for key {}", raw, key);
                default_db
            }
        }
    }
}
