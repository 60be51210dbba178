//! Device Selection Policy
//!
//! Maps a routing strategy plus the current call state, force-use overrides
//! and device availability to the output device mask that should carry the
//! sound. Priority chains encode the expected user experience: wired
//! accessories beat a forced Bluetooth preference, which beats the speaker,
//! which beats the earpiece.
//!
//! Delegation between strategies is expressed as explicit calls rather than
//! shared fallthrough so each policy stays independently testable: dial
//! tones follow media rules off-call and phone rules in-call, and
//! sonification/enforced-audible feed their accumulated speaker preference
//! into the media chain.

use tracing::{debug, error};

use heron_system::{DeviceMask, PolicyClient};

use crate::engine::PolicyEngine;
use crate::state::{ForceUsage, ForcedConfig, PhoneState};
use crate::strategy::Strategy;

impl<C: PolicyClient> PolicyEngine<C> {
    /// Select the output device(s) for a strategy
    ///
    /// With `from_cache` the last recomputed mask is returned as-is; a
    /// stale cache is the caller's responsibility (see
    /// [`update_devices_for_strategies`](Self::update_devices_for_strategies)).
    /// Otherwise the policy is evaluated against current state. The zero
    /// mask means no suitable device and must be treated as "do not route".
    pub fn device_for_strategy(&self, strategy: Strategy, from_cache: bool) -> DeviceMask {
        if from_cache {
            let device = self.cached_device(strategy);
            debug!("device for {:?} from cache: {}", strategy, device);
            return device;
        }

        let device = match strategy {
            Strategy::Dtmf => {
                if self.phone_state() != PhoneState::InCall {
                    // off call, dial tones follow the media rules
                    self.media_device(Strategy::Media, DeviceMask::NONE)
                } else {
                    // in call, dial tones follow the phone rules
                    self.phone_device(Strategy::Dtmf)
                }
            }
            Strategy::Phone => self.phone_device(Strategy::Phone),
            Strategy::Sonification => {
                let speaker = self.available_devices() & DeviceMask::SPEAKER;
                if speaker.is_empty() {
                    error!("no speaker device for sonification");
                }
                self.enforced_audible_device(Strategy::Sonification, speaker)
            }
            Strategy::EnforcedAudible => {
                self.enforced_audible_device(Strategy::EnforcedAudible, DeviceMask::NONE)
            }
            Strategy::Media => self.media_device(Strategy::Media, DeviceMask::NONE),
        };

        debug!("device for {:?}: {}", strategy, device);
        device
    }

    /// Phone routing: forced preference first, then availability order
    ///
    /// `strategy` is the strategy being resolved (phone proper, or dial
    /// tones delegating while in call); the carkit shortcut is withheld
    /// from in-call dial tones.
    fn phone_device(&self, strategy: Strategy) -> DeviceMask {
        let avail = self.available_devices();
        match self.force_use(ForceUsage::Communication) {
            ForcedConfig::BtSco => {
                if self.phone_state() != PhoneState::InCall || strategy != Strategy::Dtmf {
                    let device = avail & DeviceMask::BLUETOOTH_SCO_CARKIT;
                    if !device.is_empty() {
                        return device;
                    }
                }
                let device = avail & DeviceMask::BLUETOOTH_SCO_HEADSET;
                if !device.is_empty() {
                    return device;
                }
                let device = avail & DeviceMask::BLUETOOTH_SCO;
                if !device.is_empty() {
                    return device;
                }
                // SCO requested but no SCO device is up: degrade silently
                // to the default priority order
                self.phone_default_device()
            }
            ForcedConfig::Speaker => {
                if self.phone_state() != PhoneState::InCall || strategy != Strategy::Dtmf {
                    let device = avail & DeviceMask::BLUETOOTH_SCO_CARKIT;
                    if !device.is_empty() {
                        return device;
                    }
                }
                // off call, forcing speaker routes call audio to an A2DP
                // speaker when one is up
                if self.phone_state() != PhoneState::InCall {
                    let device = avail & DeviceMask::BLUETOOTH_A2DP_SPEAKER;
                    if !device.is_empty() {
                        return device;
                    }
                }
                let device = avail & DeviceMask::SPEAKER;
                if device.is_empty() {
                    error!("no speaker device for phone strategy");
                }
                device
            }
            ForcedConfig::None => self.phone_default_device(),
        }
    }

    /// Default phone priority order, shared by the no-override case and
    /// the SCO fallback
    fn phone_default_device(&self) -> DeviceMask {
        let avail = self.available_devices();

        let device = avail & DeviceMask::WIRED_HEADPHONE;
        if !device.is_empty() {
            return device;
        }
        let device = avail & DeviceMask::WIRED_HEADSET;
        if !device.is_empty() {
            return device;
        }
        // off call, call audio may route to A2DP
        if self.phone_state() != PhoneState::InCall {
            let device = avail & DeviceMask::BLUETOOTH_A2DP;
            if !device.is_empty() {
                return device;
            }
            let device = avail & DeviceMask::BLUETOOTH_A2DP_HEADPHONES;
            if !device.is_empty() {
                return device;
            }
        }
        if self.phone_state() == PhoneState::Ringtone {
            let device = avail & DeviceMask::SPEAKER;
            if !device.is_empty() {
                return device;
            }
        }

        let device = avail & DeviceMask::EARPIECE;
        if device.is_empty() {
            error!("no earpiece device for phone strategy");
        }
        device
    }

    /// Enforced-audible routing: phone wins outright while in call,
    /// otherwise the media chain runs with the accumulated device ORed in
    fn enforced_audible_device(&self, strategy: Strategy, device: DeviceMask) -> DeviceMask {
        if self.phone_state() == PhoneState::InCall {
            // the accumulated speaker preference is discarded here
            return self.phone_device(Strategy::Phone);
        }
        self.media_device(strategy, device)
    }

    /// Media routing: pick a secondary candidate by priority, OR it into
    /// the accumulated device, add FM, and suppress the result while a
    /// call would be re-routed by it
    fn media_device(&self, strategy: Strategy, device: DeviceMask) -> DeviceMask {
        // sonification reaching here keeps only its speaker preference
        if strategy == Strategy::Sonification {
            return device;
        }
        let avail = self.available_devices();

        let mut device2 = DeviceMask::NONE;
        if self.force_use(ForceUsage::Media) == ForcedConfig::Speaker {
            device2 = avail & DeviceMask::SPEAKER;
        }
        if device2.is_empty() {
            device2 = avail & DeviceMask::AUX_DIGITAL;
        }
        if self.a2dp_output().is_some() {
            if strategy == Strategy::Sonification && !self.a2dp_used_for_sonification() {
                return device;
            }
            if device2.is_empty() {
                device2 = avail & DeviceMask::BLUETOOTH_A2DP;
            }
            if device2.is_empty() {
                device2 = avail & DeviceMask::BLUETOOTH_A2DP_HEADPHONES;
            }
            if device2.is_empty() {
                device2 = avail & DeviceMask::BLUETOOTH_A2DP_SPEAKER;
            }
        }
        if device2.is_empty() {
            device2 = avail & DeviceMask::WIRED_HEADPHONE;
        }
        if device2.is_empty() {
            device2 = avail & DeviceMask::WIRED_HEADSET;
        }
        if device2.is_empty() {
            device2 = avail & DeviceMask::SPEAKER;
        }
        if device2.is_empty() {
            device2 = avail & DeviceMask::EARPIECE;
        }

        let mut device = device | device2;
        device |= avail & DeviceMask::ALL_FM;

        // do not let a media stream change the hardware routing of an
        // active call
        if self.phone_state() == PhoneState::InCall
            && !device.is_a2dp()
            && device != self.cached_device(Strategy::Phone)
        {
            debug!("incompatible media and phone devices, media suppressed");
            return DeviceMask::NONE;
        }
        device
    }
}
