//! Per-Output Volume and Mute Records
//!
//! One `OutputState` exists per opened hardware output path. It tracks, per
//! stream, a mute reference count and the last volume the policy applied,
//! which is what the change decision in the volume controller compares
//! against.

use serde::{Deserialize, Serialize};

use heron_system::{StreamType, STREAM_COUNT};

/// Per-stream bookkeeping for one opened output path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputState {
    /// Mute reference count per stream; non-zero means muted
    mute_count: [u32; STREAM_COUNT],

    /// Last applied volume per stream; -1.0 until first applied so the
    /// first application always reaches the hardware
    cur_volume: [f32; STREAM_COUNT],
}

impl Default for OutputState {
    fn default() -> Self {
        Self {
            mute_count: [0; STREAM_COUNT],
            cur_volume: [-1.0; STREAM_COUNT],
        }
    }
}

impl OutputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mute_count(&self, stream: StreamType) -> u32 {
        self.mute_count[stream.index()]
    }

    pub fn is_muted(&self, stream: StreamType) -> bool {
        self.mute_count[stream.index()] != 0
    }

    /// Last volume applied for `stream`, or -1.0 if none yet
    pub fn cur_volume(&self, stream: StreamType) -> f32 {
        self.cur_volume[stream.index()]
    }

    pub(crate) fn set_cur_volume(&mut self, stream: StreamType, volume: f32) {
        self.cur_volume[stream.index()] = volume;
    }

    pub(crate) fn increment_mute(&mut self, stream: StreamType) {
        self.mute_count[stream.index()] += 1;
    }

    /// Returns false when the count was already zero
    pub(crate) fn decrement_mute(&mut self, stream: StreamType) -> bool {
        let count = &mut self.mute_count[stream.index()];
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_output_is_unmuted() {
        let out = OutputState::new();
        for stream in StreamType::all() {
            assert!(!out.is_muted(stream));
            assert_eq!(out.cur_volume(stream), -1.0);
        }
    }

    #[test]
    fn test_mute_reference_counting() {
        let mut out = OutputState::new();
        out.increment_mute(StreamType::Music);
        out.increment_mute(StreamType::Music);
        assert_eq!(out.mute_count(StreamType::Music), 2);

        assert!(out.decrement_mute(StreamType::Music));
        assert!(out.is_muted(StreamType::Music));
        assert!(out.decrement_mute(StreamType::Music));
        assert!(!out.is_muted(StreamType::Music));

        // Underflow is reported, not wrapped
        assert!(!out.decrement_mute(StreamType::Music));
        assert_eq!(out.mute_count(StreamType::Music), 0);
    }

    #[test]
    fn test_volume_record_is_per_stream() {
        let mut out = OutputState::new();
        out.set_cur_volume(StreamType::Music, 0.5);
        assert_eq!(out.cur_volume(StreamType::Music), 0.5);
        assert_eq!(out.cur_volume(StreamType::Ring), -1.0);
    }
}
