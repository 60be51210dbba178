//! Output Device Capability Masks
//!
//! A `DeviceMask` is a bitwise combination of named output capability flags.
//! A single mask may name several concurrent outputs (e.g. media routed to
//! both the speaker and an FM transmitter), and the zero mask means "no
//! eligible device".

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Bitmask of physical output devices
///
/// Selection policy always intersects candidate flags with the set of
/// currently available devices, so any non-zero result is a subset of
/// what is actually connected.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceMask(u32);

impl DeviceMask {
    /// No device - callers must treat this as "do not route audio"
    pub const NONE: DeviceMask = DeviceMask(0);

    pub const EARPIECE: DeviceMask = DeviceMask(0x0001);
    pub const SPEAKER: DeviceMask = DeviceMask(0x0002);
    pub const WIRED_HEADSET: DeviceMask = DeviceMask(0x0004);
    pub const WIRED_HEADPHONE: DeviceMask = DeviceMask(0x0008);
    pub const BLUETOOTH_SCO: DeviceMask = DeviceMask(0x0010);
    pub const BLUETOOTH_SCO_HEADSET: DeviceMask = DeviceMask(0x0020);
    pub const BLUETOOTH_SCO_CARKIT: DeviceMask = DeviceMask(0x0040);
    pub const BLUETOOTH_A2DP: DeviceMask = DeviceMask(0x0080);
    pub const BLUETOOTH_A2DP_HEADPHONES: DeviceMask = DeviceMask(0x0100);
    pub const BLUETOOTH_A2DP_SPEAKER: DeviceMask = DeviceMask(0x0200);
    pub const AUX_DIGITAL: DeviceMask = DeviceMask(0x0400);
    pub const FM: DeviceMask = DeviceMask(0x0800);

    /// All A2DP-class devices
    pub const ALL_A2DP: DeviceMask = DeviceMask(0x0080 | 0x0100 | 0x0200);

    /// All SCO-class devices
    pub const ALL_SCO: DeviceMask = DeviceMask(0x0010 | 0x0020 | 0x0040);

    /// All FM-capable devices
    pub const ALL_FM: DeviceMask = DeviceMask(0x0800);

    /// Raw bit value (for diagnostics)
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every flag in `other` is set in `self`
    pub fn contains(self, other: DeviceMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if `self` and `other` share at least one flag
    pub fn intersects(self, other: DeviceMask) -> bool {
        self.0 & other.0 != 0
    }

    /// True if the mask names only A2DP-class devices
    pub fn is_a2dp(self) -> bool {
        !self.is_empty() && Self::ALL_A2DP.contains(self)
    }

    /// True if the mask names only SCO-class devices
    pub fn is_sco(self) -> bool {
        !self.is_empty() && Self::ALL_SCO.contains(self)
    }

    /// True if the mask includes an FM-capable device
    pub fn is_fm_capable(self) -> bool {
        self.intersects(Self::ALL_FM)
    }

    /// Mask with every flag of `other` cleared
    pub fn without(self, other: DeviceMask) -> DeviceMask {
        DeviceMask(self.0 & !other.0)
    }
}

impl BitOr for DeviceMask {
    type Output = DeviceMask;

    fn bitor(self, rhs: DeviceMask) -> DeviceMask {
        DeviceMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for DeviceMask {
    fn bitor_assign(&mut self, rhs: DeviceMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DeviceMask {
    type Output = DeviceMask;

    fn bitand(self, rhs: DeviceMask) -> DeviceMask {
        DeviceMask(self.0 & rhs.0)
    }
}

impl BitAndAssign for DeviceMask {
    fn bitand_assign(&mut self, rhs: DeviceMask) {
        self.0 &= rhs.0;
    }
}

impl fmt::Debug for DeviceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u32, &str); 12] = [
            (0x0001, "EARPIECE"),
            (0x0002, "SPEAKER"),
            (0x0004, "WIRED_HEADSET"),
            (0x0008, "WIRED_HEADPHONE"),
            (0x0010, "BLUETOOTH_SCO"),
            (0x0020, "BLUETOOTH_SCO_HEADSET"),
            (0x0040, "BLUETOOTH_SCO_CARKIT"),
            (0x0080, "BLUETOOTH_A2DP"),
            (0x0100, "BLUETOOTH_A2DP_HEADPHONES"),
            (0x0200, "BLUETOOTH_A2DP_SPEAKER"),
            (0x0400, "AUX_DIGITAL"),
            (0x0800, "FM"),
        ];

        if self.0 == 0 {
            return write!(f, "NONE");
        }

        write!(f, "{:#06x}", self.0)?;
        let mut sep = " (";
        for (bit, name) in NAMES {
            if self.0 & bit != 0 {
                write!(f, "{}{}", sep, name)?;
                sep = "|";
            }
        }
        write!(f, ")")
    }
}

impl fmt::Display for DeviceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_operations() {
        let mask = DeviceMask::SPEAKER | DeviceMask::FM;
        assert!(mask.contains(DeviceMask::SPEAKER));
        assert!(mask.contains(DeviceMask::FM));
        assert!(!mask.contains(DeviceMask::EARPIECE));
        assert!(mask.intersects(DeviceMask::SPEAKER | DeviceMask::EARPIECE));
        assert_eq!(mask & DeviceMask::SPEAKER, DeviceMask::SPEAKER);
    }

    #[test]
    fn test_none_is_empty() {
        assert!(DeviceMask::NONE.is_empty());
        assert!(!DeviceMask::SPEAKER.is_empty());
        // NONE is a subset of everything but intersects nothing
        assert!(DeviceMask::SPEAKER.contains(DeviceMask::NONE));
        assert!(!DeviceMask::SPEAKER.intersects(DeviceMask::NONE));
    }

    #[test]
    fn test_a2dp_classification() {
        assert!(DeviceMask::BLUETOOTH_A2DP.is_a2dp());
        assert!(DeviceMask::BLUETOOTH_A2DP_HEADPHONES.is_a2dp());
        assert!(DeviceMask::BLUETOOTH_A2DP_SPEAKER.is_a2dp());
        assert!((DeviceMask::BLUETOOTH_A2DP | DeviceMask::BLUETOOTH_A2DP_SPEAKER).is_a2dp());
        assert!(!DeviceMask::SPEAKER.is_a2dp());
        // A mixed mask is not pure A2DP
        assert!(!(DeviceMask::BLUETOOTH_A2DP | DeviceMask::SPEAKER).is_a2dp());
        assert!(!DeviceMask::NONE.is_a2dp());
    }

    #[test]
    fn test_sco_classification() {
        assert!(DeviceMask::BLUETOOTH_SCO.is_sco());
        assert!(DeviceMask::BLUETOOTH_SCO_CARKIT.is_sco());
        assert!(!DeviceMask::BLUETOOTH_A2DP.is_sco());
    }

    #[test]
    fn test_without_clears_flags() {
        let mask = DeviceMask::SPEAKER | DeviceMask::EARPIECE | DeviceMask::FM;
        assert_eq!(
            mask.without(DeviceMask::FM),
            DeviceMask::SPEAKER | DeviceMask::EARPIECE
        );
        assert_eq!(mask.without(DeviceMask::WIRED_HEADSET), mask);
    }

    #[test]
    fn test_fm_capable() {
        assert!((DeviceMask::SPEAKER | DeviceMask::FM).is_fm_capable());
        assert!(!DeviceMask::SPEAKER.is_fm_capable());
    }

    #[test]
    fn test_serialization_transparent() {
        let mask = DeviceMask::SPEAKER | DeviceMask::WIRED_HEADSET;
        let json = serde_json::to_string(&mask).unwrap();
        assert_eq!(json, "6");

        let deserialized: DeviceMask = serde_json::from_str(&json).unwrap();
        assert_eq!(mask, deserialized);
    }

    #[test]
    fn test_debug_names_flags() {
        let mask = DeviceMask::SPEAKER | DeviceMask::FM;
        let text = format!("{:?}", mask);
        assert!(text.contains("SPEAKER"));
        assert!(text.contains("FM"));
        assert_eq!(format!("{:?}", DeviceMask::NONE), "NONE");
    }
}
