//! Process-Wide Policy State Vocabulary
//!
//! Call state, force-use overrides and per-stream volume records. All of it
//! lives inside `PolicyEngine` and is mutated only through its narrow
//! setters so cache invalidation cannot be forgotten.

use serde::{Deserialize, Serialize};

/// Current telephony state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhoneState {
    /// No call activity
    Normal,
    /// An incoming call is ringing
    Ringtone,
    /// A call is active
    InCall,
}

/// Number of force-use categories (for table sizing)
pub const FORCE_USAGE_COUNT: usize = 2;

/// Usage category a force-use override applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceUsage {
    /// Call audio and SCO routing
    Communication,
    /// Media playback routing
    Media,
}

impl ForceUsage {
    pub fn index(self) -> usize {
        match self {
            ForceUsage::Communication => 0,
            ForceUsage::Media => 1,
        }
    }
}

/// Forced routing policy for a usage category
///
/// An explicit user/system override that takes precedence over the default
/// device priority order for the category it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForcedConfig {
    /// No override, follow default priorities
    #[default]
    None,
    /// Force toward the loudspeaker
    Speaker,
    /// Force toward a Bluetooth SCO device
    BtSco,
}

/// Per-stream volume bookkeeping
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Lowest valid volume index
    pub index_min: u32,
    /// Highest valid volume index (used to normalize voice volume)
    pub index_max: u32,
    /// Current volume index
    pub index: u32,
    /// Whether mute requests may actually silence this stream
    pub can_be_muted: bool,
}

impl Default for StreamDescriptor {
    fn default() -> Self {
        Self {
            index_min: 0,
            index_max: 1,
            index: 0,
            can_be_muted: true,
        }
    }
}
