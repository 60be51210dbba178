//! Routing Strategies
//!
//! A strategy is the playback use-case category that drives device
//! selection. Several stream types can share one strategy, and some
//! strategies resolve by delegating to another one (dial tones follow
//! media rules when no call is active, alerts follow the phone routing
//! while one is).

use serde::{Deserialize, Serialize};

use heron_system::StreamType;

/// Number of routing strategies (for cache sizing)
pub const STRATEGY_COUNT: usize = 5;

/// Playback use-case category driving routing policy
///
/// The enum is closed: there is no "unknown strategy" case to handle at
/// run time, every stream classifies onto exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Media playback (music, FM radio)
    Media,
    /// Call audio and SCO streams
    Phone,
    /// Ringtones, alarms, notifications and system sounds
    Sonification,
    /// Sounds that must remain audible regardless of user settings
    EnforcedAudible,
    /// Dial tones
    Dtmf,
}

impl Strategy {
    /// Position in the strategy-to-device cache
    pub fn index(self) -> usize {
        match self {
            Strategy::Media => 0,
            Strategy::Phone => 1,
            Strategy::Sonification => 2,
            Strategy::EnforcedAudible => 3,
            Strategy::Dtmf => 4,
        }
    }

    /// All strategies, in cache order
    pub fn all() -> [Strategy; STRATEGY_COUNT] {
        [
            Strategy::Media,
            Strategy::Phone,
            Strategy::Sonification,
            Strategy::EnforcedAudible,
            Strategy::Dtmf,
        ]
    }

    /// Classify a stream onto its routing strategy
    pub fn for_stream(stream: StreamType) -> Strategy {
        match stream {
            StreamType::VoiceCall | StreamType::BluetoothSco => Strategy::Phone,
            // system sounds follow sonification routing
            StreamType::System
            | StreamType::Ring
            | StreamType::Alarm
            | StreamType::Notification => Strategy::Sonification,
            StreamType::EnforcedAudible => Strategy::EnforcedAudible,
            StreamType::Dtmf => Strategy::Dtmf,
            StreamType::Music | StreamType::Fm => Strategy::Media,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_dense_and_unique() {
        let mut seen = [false; STRATEGY_COUNT];
        for strategy in Strategy::all() {
            let i = strategy.index();
            assert!(i < STRATEGY_COUNT);
            assert!(!seen[i]);
            seen[i] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_stream_classification() {
        assert_eq!(Strategy::for_stream(StreamType::VoiceCall), Strategy::Phone);
        assert_eq!(
            Strategy::for_stream(StreamType::BluetoothSco),
            Strategy::Phone
        );
        assert_eq!(Strategy::for_stream(StreamType::Ring), Strategy::Sonification);
        assert_eq!(
            Strategy::for_stream(StreamType::System),
            Strategy::Sonification
        );
        assert_eq!(Strategy::for_stream(StreamType::Dtmf), Strategy::Dtmf);
        assert_eq!(Strategy::for_stream(StreamType::Music), Strategy::Media);
        assert_eq!(Strategy::for_stream(StreamType::Fm), Strategy::Media);
        assert_eq!(
            Strategy::for_stream(StreamType::EnforcedAudible),
            Strategy::EnforcedAudible
        );
    }
}
