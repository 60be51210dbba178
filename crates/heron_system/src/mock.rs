//! In-Memory Mock Collaborators
//!
//! Recording/stub implementations of the system boundary traits, used by
//! the policy core's tests and available to downstream integration tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::device::DeviceMask;
use crate::stream::{OutputId, StreamType};
use crate::traits::{ConfigStore, PolicyClient, VolumeCurve};

/// A single command received by the hardware sink
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Stream {
        stream: StreamType,
        volume: f32,
        output: OutputId,
        delay_ms: u32,
    },
    Voice {
        volume: f32,
        delay_ms: u32,
    },
    Fm {
        volume: f32,
        delay_ms: u32,
    },
}

/// Hardware sink that records every command it receives
#[derive(Debug, Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded commands, in arrival order
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the generic stream-volume commands
    pub fn stream_calls(&self) -> Vec<SinkCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, SinkCall::Stream { .. }))
            .collect()
    }

    /// Drop all recorded commands
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }
}

impl PolicyClient for RecordingClient {
    fn set_stream_volume(&self, stream: StreamType, volume: f32, output: OutputId, delay_ms: u32) {
        self.calls.lock().unwrap().push(SinkCall::Stream {
            stream,
            volume,
            output,
            delay_ms,
        });
    }

    fn set_voice_volume(&self, volume: f32, delay_ms: u32) {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Voice { volume, delay_ms });
    }

    fn set_fm_volume(&self, volume: f32, delay_ms: u32) {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Fm { volume, delay_ms });
    }
}

/// Curve that returns the same gain for every lookup
#[derive(Debug, Clone, Copy)]
pub struct FixedCurve(pub f32);

impl VolumeCurve for FixedCurve {
    fn gain(&self, _stream: StreamType, _index: u32, _output: OutputId, _device: DeviceMask) -> f32 {
        self.0
    }
}

/// Configuration store backed by a plain map
#[derive(Debug, Default)]
pub struct MemoryConfig {
    values: HashMap<String, String>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl ConfigStore for MemoryConfig {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}
