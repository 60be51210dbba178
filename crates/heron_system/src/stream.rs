//! Logical Stream Categories and Output Identifiers

use serde::{Deserialize, Serialize};

/// Identifier of an opened hardware output path
///
/// Assigned by whoever opens the output; the policy core only uses it as a
/// lookup key and to recognize the primary hardware output.
pub type OutputId = u32;

/// Number of stream categories (for per-stream arrays)
pub const STREAM_COUNT: usize = 10;

/// Logical audio stream category
///
/// Each category carries its own volume index and mute state per output,
/// and maps onto a routing strategy in the policy core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamType {
    /// Call audio (downlink voice)
    VoiceCall,
    /// System sounds
    System,
    /// Incoming call ringtone
    Ring,
    /// Media playback
    Music,
    /// Alarm clock
    Alarm,
    /// Notification sounds
    Notification,
    /// Audio carried over a Bluetooth SCO link
    BluetoothSco,
    /// Sounds that must stay audible regardless of user settings
    EnforcedAudible,
    /// Dial tones
    Dtmf,
    /// FM radio playback
    Fm,
}

impl StreamType {
    /// Position in per-stream arrays
    pub fn index(self) -> usize {
        match self {
            StreamType::VoiceCall => 0,
            StreamType::System => 1,
            StreamType::Ring => 2,
            StreamType::Music => 3,
            StreamType::Alarm => 4,
            StreamType::Notification => 5,
            StreamType::BluetoothSco => 6,
            StreamType::EnforcedAudible => 7,
            StreamType::Dtmf => 8,
            StreamType::Fm => 9,
        }
    }

    /// All stream categories, in array order
    pub fn all() -> [StreamType; STREAM_COUNT] {
        [
            StreamType::VoiceCall,
            StreamType::System,
            StreamType::Ring,
            StreamType::Music,
            StreamType::Alarm,
            StreamType::Notification,
            StreamType::BluetoothSco,
            StreamType::EnforcedAudible,
            StreamType::Dtmf,
            StreamType::Fm,
        ]
    }
}
