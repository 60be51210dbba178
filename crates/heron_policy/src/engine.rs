//! Policy Engine - State Ownership and Mutators
//!
//! `PolicyEngine` owns every piece of process-wide policy state: the phone
//! state, the force-use table, the set of available output devices, the
//! strategy-to-device cache, the per-output volume/mute records and the
//! per-stream volume indices. External mutation goes through the narrow
//! setters below, each of which recomputes the strategy cache so routing
//! lookups served from cache stay consistent.
//!
//! # Concurrency
//!
//! The engine is synchronous and performs no internal locking. Callers must
//! serialize all calls through a single policy-decision context (one thread
//! or an external lock); interleaved mutation would produce inconsistent
//! routing and volume decisions.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use heron_system::{ConfigStore, DeviceMask, OutputId, PolicyClient, StreamType, VolumeCurve};

use crate::error::{PolicyError, PolicyResult};
use crate::output::OutputState;
use crate::state::{ForceUsage, ForcedConfig, PhoneState, StreamDescriptor, FORCE_USAGE_COUNT};
use crate::strategy::{Strategy, STRATEGY_COUNT};

/// Routing and volume policy engine
///
/// Decides which output device(s) should carry sound for each playback
/// strategy and at what attenuated volume, and pushes the results to the
/// hardware through the client. Policy only: the client performs the
/// actual routing and gain changes.
pub struct PolicyEngine<C: PolicyClient> {
    /// Hardware command sink
    client: C,

    /// Index-to-volume curve provider
    curve: Box<dyn VolumeCurve>,

    /// Persisted configuration (attenuation values)
    config: Box<dyn ConfigStore>,

    phone_state: PhoneState,
    force_use: [ForcedConfig; FORCE_USAGE_COUNT],

    /// Bitmask of currently connected output devices
    available_devices: DeviceMask,

    /// Last computed device per strategy. Not self-invalidating: every
    /// setter below recomputes it, and external readers using
    /// `device_for_strategy(_, true)` get whatever the last recompute
    /// produced.
    device_cache: [DeviceMask; STRATEGY_COUNT],

    pub(crate) outputs: HashMap<OutputId, OutputState>,

    /// First opened output; call-audio and FM side-channel commands only
    /// go out through this one
    primary_output: Option<OutputId>,

    /// Output bridging to an A2DP sink, when one is open
    a2dp_output: Option<OutputId>,

    pub(crate) streams: [StreamDescriptor; heron_system::STREAM_COUNT],

    /// Last voice volume pushed to the hardware, kept to restore it on
    /// state transitions
    pub(crate) last_voice_volume: f32,
}

impl<C: PolicyClient> PolicyEngine<C> {
    pub fn new(client: C, curve: Box<dyn VolumeCurve>, config: Box<dyn ConfigStore>) -> Self {
        let mut streams = [StreamDescriptor::default(); heron_system::STREAM_COUNT];
        // enforced-audible sounds must stay audible
        streams[StreamType::EnforcedAudible.index()].can_be_muted = false;
        Self {
            client,
            curve,
            config,
            phone_state: PhoneState::Normal,
            force_use: [ForcedConfig::None; FORCE_USAGE_COUNT],
            available_devices: DeviceMask::NONE,
            device_cache: [DeviceMask::NONE; STRATEGY_COUNT],
            outputs: HashMap::new(),
            primary_output: None,
            a2dp_output: None,
            streams,
            last_voice_volume: -1.0,
        }
    }

    // --- accessors ---

    pub fn phone_state(&self) -> PhoneState {
        self.phone_state
    }

    pub fn force_use(&self, usage: ForceUsage) -> ForcedConfig {
        self.force_use[usage.index()]
    }

    pub fn available_devices(&self) -> DeviceMask {
        self.available_devices
    }

    pub fn primary_output(&self) -> Option<OutputId> {
        self.primary_output
    }

    pub fn a2dp_output(&self) -> Option<OutputId> {
        self.a2dp_output
    }

    pub fn last_voice_volume(&self) -> f32 {
        self.last_voice_volume
    }

    pub fn output(&self, output: OutputId) -> Option<&OutputState> {
        self.outputs.get(&output)
    }

    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    pub(crate) fn curve(&self) -> &dyn VolumeCurve {
        &*self.curve
    }

    pub(crate) fn config(&self) -> &dyn ConfigStore {
        &*self.config
    }

    pub(crate) fn cached_device(&self, strategy: Strategy) -> DeviceMask {
        self.device_cache[strategy.index()]
    }

    /// Whether sonification may be routed over the A2DP bridge
    pub(crate) fn a2dp_used_for_sonification(&self) -> bool {
        true
    }

    // --- state mutators ---

    /// Update the telephony state
    ///
    /// Recomputes routing for every strategy, then force-reapplies all
    /// stream volumes on the primary output so gains that depend on the
    /// new routing take effect.
    pub fn set_phone_state(&mut self, state: PhoneState, delay_ms: u32) {
        if state == self.phone_state {
            debug!("phone state unchanged: {:?}", state);
            return;
        }
        info!("phone state {:?} -> {:?}", self.phone_state, state);
        self.phone_state = state;
        self.update_devices_for_strategies();

        if let Some(primary) = self.primary_output {
            let strategy = if state == PhoneState::InCall {
                Strategy::Phone
            } else {
                Strategy::Media
            };
            let device = self.cached_device(strategy);
            let _ = self.apply_stream_volumes(primary, device, delay_ms, true);
        }
    }

    /// Install a force-use override for a usage category
    pub fn set_force_use(&mut self, usage: ForceUsage, config: ForcedConfig) {
        info!("force use for {:?} set to {:?}", usage, config);
        self.force_use[usage.index()] = config;
        self.update_devices_for_strategies();
    }

    /// Record a device (or set of devices) as connected or disconnected
    pub fn set_device_connection(&mut self, device: DeviceMask, connected: bool) {
        if connected {
            self.available_devices |= device;
        } else {
            self.available_devices = self.available_devices.without(device);
        }
        info!(
            "device {} {}; available now {}",
            device,
            if connected { "connected" } else { "disconnected" },
            self.available_devices
        );
        self.update_devices_for_strategies();
    }

    /// Register an opened hardware output path
    ///
    /// The first opened output becomes the primary hardware output.
    pub fn open_output(&mut self, output: OutputId) {
        self.outputs.entry(output).or_insert_with(OutputState::new);
        if self.primary_output.is_none() {
            self.primary_output = Some(output);
            info!("output {} opened (primary)", output);
        } else {
            info!("output {} opened", output);
        }
    }

    /// Forget a closed output path
    pub fn close_output(&mut self, output: OutputId) {
        if self.outputs.remove(&output).is_none() {
            warn!("close_output: output {} was not open", output);
            return;
        }
        if self.primary_output == Some(output) {
            self.primary_output = None;
        }
        if self.a2dp_output == Some(output) {
            self.a2dp_output = None;
            self.update_devices_for_strategies();
        }
        info!("output {} closed", output);
    }

    /// Mark (or clear) the output that bridges to an A2DP sink
    pub fn set_a2dp_output(&mut self, output: Option<OutputId>) {
        self.a2dp_output = output;
        self.update_devices_for_strategies();
    }

    /// Declare the valid index range for a stream
    pub fn init_stream_volume(&mut self, stream: StreamType, index_min: u32, index_max: u32) {
        if index_min >= index_max {
            warn!(
                "init_stream_volume: invalid range [{}, {}] for {:?}, ignored",
                index_min, index_max, stream
            );
            return;
        }
        let desc = &mut self.streams[stream.index()];
        desc.index_min = index_min;
        desc.index_max = index_max;
        desc.index = desc.index.clamp(index_min, index_max);
    }

    /// Change a stream's volume index and apply it to every open output
    pub fn set_stream_volume_index(&mut self, stream: StreamType, index: u32) -> PolicyResult<()> {
        let desc = self.streams[stream.index()];
        if index < desc.index_min || index > desc.index_max {
            return Err(PolicyError::IndexOutOfRange {
                stream,
                index,
                min: desc.index_min,
                max: desc.index_max,
            });
        }
        self.streams[stream.index()].index = index;
        debug!("volume index for {:?} set to {}", stream, index);

        // Apply to every output; the change decision in the volume
        // controller skips outputs where nothing changed.
        let device = self.cached_device(Strategy::for_stream(stream));
        let mut status = Ok(());
        let ids: Vec<OutputId> = self.outputs.keys().copied().collect();
        for output in ids {
            if let Err(e) = self.check_and_set_volume(stream, index, output, device, 0, false) {
                status = Err(e);
            }
        }
        status
    }

    /// Current volume index for a stream
    pub fn stream_volume_index(&self, stream: StreamType) -> u32 {
        self.streams[stream.index()].index
    }

    /// Mute or unmute a stream on one output, with reference counting
    ///
    /// Only the 0 to 1 and 1 to 0 transitions touch the hardware; nested
    /// mute requests just move the count.
    pub fn set_stream_mute(
        &mut self,
        stream: StreamType,
        muted: bool,
        output: OutputId,
        delay_ms: u32,
    ) -> PolicyResult<()> {
        let out = self
            .outputs
            .get(&output)
            .ok_or(PolicyError::UnknownOutput(output))?;
        let count = out.mute_count(stream);
        let desc = self.streams[stream.index()];
        let device = self.cached_device(Strategy::for_stream(stream));

        if muted {
            // apply silence before raising the count, the muted gate in
            // the volume controller would swallow it otherwise
            if count == 0 && desc.can_be_muted {
                self.check_and_set_volume(stream, 0, output, device, delay_ms, false)?;
            }
            if let Some(out) = self.outputs.get_mut(&output) {
                out.increment_mute(stream);
            }
            return Ok(());
        }

        if count == 0 {
            warn!("set_stream_mute: {:?} on output {} not muted", stream, output);
            return Ok(());
        }
        if let Some(out) = self.outputs.get_mut(&output) {
            if !out.decrement_mute(stream) {
                return Ok(());
            }
            if out.mute_count(stream) != 0 {
                return Ok(());
            }
        }
        self.check_and_set_volume(stream, desc.index, output, device, delay_ms, false)
    }

    /// Reapply every stream's current volume index on one output
    pub fn apply_stream_volumes(
        &mut self,
        output: OutputId,
        device: DeviceMask,
        delay_ms: u32,
        force: bool,
    ) -> PolicyResult<()> {
        if !self.outputs.contains_key(&output) {
            return Err(PolicyError::UnknownOutput(output));
        }
        for stream in StreamType::all() {
            let index = self.streams[stream.index()].index;
            // per-stream guard failures (cross-routing) are expected here
            let _ = self.check_and_set_volume(stream, index, output, device, delay_ms, force);
        }
        Ok(())
    }

    /// Recompute the cached device for every strategy
    ///
    /// The cache is not self-invalidating; every setter above calls this,
    /// and callers mutating collaborator-owned state (device availability
    /// through `set_device_connection` excepted) must call it themselves.
    pub fn update_devices_for_strategies(&mut self) {
        // Phone first: the media policy compares against the cached phone
        // device for its in-call suppression check.
        for strategy in [
            Strategy::Phone,
            Strategy::Media,
            Strategy::Sonification,
            Strategy::EnforcedAudible,
            Strategy::Dtmf,
        ] {
            self.device_cache[strategy.index()] = self.device_for_strategy(strategy, false);
        }
    }
}
