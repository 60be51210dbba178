//! Volume Computation and Application
//!
//! Turns a (stream, index) pair into a linear gain, applies device- and
//! stream-specific attenuation, and decides whether the hardware actually
//! needs to hear about it. Call-audio streams additionally feed a separate
//! voice-volume side channel on the primary output, and FM volume travels
//! through its own dedicated sink call.

use tracing::debug;

use heron_system::{DeviceMask, OutputId, PolicyClient, StreamType};

use crate::engine::PolicyEngine;
use crate::error::{PolicyError, PolicyResult};
use crate::state::{ForceUsage, ForcedConfig};

/// Config key for the extra speaker attenuation (dB)
pub const SPEAKER_ATTENUATION_KEY: &str = "speaker-attenuation-db";
/// Config key for the extra wired headset/headphone attenuation (dB)
pub const HEADSET_ATTENUATION_KEY: &str = "headset-attenuation-db";
/// Config key for the extra FM attenuation (dB)
pub const FM_ATTENUATION_KEY: &str = "fm-attenuation-db";

/// Default speaker attenuation, prevents distortion on small speakers
pub const SPEAKER_ATTENUATION_DEFAULT_DB: f32 = 6.0;
pub const HEADSET_ATTENUATION_DEFAULT_DB: f32 = 0.0;
pub const FM_ATTENUATION_DEFAULT_DB: f32 = 0.0;

/// Linear factor for an attenuation in dB
fn attenuation_factor(db: f32) -> f32 {
    10f32.powf(-db / 20.0)
}

impl<C: PolicyClient> PolicyEngine<C> {
    /// Compute and apply the volume for a stream on an output
    ///
    /// Muted streams succeed without touching the hardware. The only error
    /// conditions are an unknown output and the cross-routing guard: call
    /// audio cannot be adjusted while communication is forced to SCO, and
    /// the SCO stream cannot be adjusted while it is not.
    pub fn check_and_set_volume(
        &mut self,
        stream: StreamType,
        index: u32,
        output: OutputId,
        device: DeviceMask,
        delay_ms: u32,
        force: bool,
    ) -> PolicyResult<()> {
        let out = self
            .outputs
            .get(&output)
            .ok_or(PolicyError::UnknownOutput(output))?;

        // do not change actual stream volume if the stream is muted
        if out.is_muted(stream) {
            debug!(
                "stream {:?} muted on output {} ({} refs), volume untouched",
                stream,
                output,
                out.mute_count(stream)
            );
            return Ok(());
        }

        // do not change in-call volume if bluetooth is connected and vice versa
        let forced_comm = self.force_use(ForceUsage::Communication);
        if (stream == StreamType::VoiceCall && forced_comm == ForcedConfig::BtSco)
            || (stream == StreamType::BluetoothSco && forced_comm != ForcedConfig::BtSco)
        {
            debug!(
                "cannot set {:?} volume with communication force-use {:?}",
                stream, forced_comm
            );
            return Err(PolicyError::InvalidVolumeOperation {
                stream,
                forced: forced_comm,
            });
        }

        let mut volume = self
            .curve()
            .gain(stream, index, output, device)
            .clamp(0.0, 1.0);

        // extra attenuation on the speaker to prevent distortion
        if device == DeviceMask::SPEAKER {
            let db = self
                .config()
                .get_db(SPEAKER_ATTENUATION_KEY, SPEAKER_ATTENUATION_DEFAULT_DB);
            let factor = attenuation_factor(db);
            debug!("speaker attenuation {} dB, factor {}", db, factor);
            volume *= factor;
        }

        // optional attenuation for wired headset/headphone
        if device == DeviceMask::WIRED_HEADSET || device == DeviceMask::WIRED_HEADPHONE {
            let db = self
                .config()
                .get_db(HEADSET_ATTENUATION_KEY, HEADSET_ATTENUATION_DEFAULT_DB);
            volume *= attenuation_factor(db);
        }

        // optional attenuation for FM audio
        if stream == StreamType::Fm {
            let db = self
                .config()
                .get_db(FM_ATTENUATION_KEY, FM_ATTENUATION_DEFAULT_DB);
            volume *= attenuation_factor(db);
        }

        let primary = self.primary_output();

        // we actually push the volume if the computed value changed, the
        // force flag is set, or the stream always re-applies
        let write = {
            let out = self
                .outputs
                .get_mut(&output)
                .ok_or(PolicyError::UnknownOutput(output))?;
            let write = volume != out.cur_volume(stream)
                || stream == StreamType::VoiceCall
                || stream == StreamType::Fm
                || force;
            if write {
                out.set_cur_volume(stream, volume);
            }
            write
        };

        if write {
            let mut hw_volume = volume;
            if matches!(
                stream,
                StreamType::VoiceCall | StreamType::Dtmf | StreamType::BluetoothSco
            ) {
                // offset to reflect hardware that never reaches true zero
                // on this path; 1% is roughly the first volume step
                hw_volume = 0.01 + 0.99 * volume;
            } else if stream == StreamType::Fm {
                // FM volume travels through its own sink call, never the
                // generic stream write
                let fm_volume = volume;
                if fm_volume >= 0.0 && Some(output) == primary {
                    debug!("fm volume {} on output {}", fm_volume, output);
                    self.client().set_fm_volume(fm_volume, delay_ms);
                }
                return Ok(());
            }

            debug!(
                "stream {:?} volume {} on output {} (delay {} ms)",
                stream, hw_volume, output, delay_ms
            );
            self.client()
                .set_stream_volume(stream, hw_volume, output, delay_ms);
        }

        if stream == StreamType::VoiceCall || stream == StreamType::BluetoothSco {
            // voice volume is forced to max for SCO, the headset manages
            // its own gain
            let voice_volume = if stream == StreamType::VoiceCall {
                let max = self.streams[stream.index()].index_max.max(1);
                index as f32 / max as f32
            } else {
                1.0
            };
            if voice_volume >= 0.0 && Some(output) == primary {
                self.client().set_voice_volume(voice_volume, delay_ms);
                self.last_voice_volume = voice_volume;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use heron_system::mock::{FixedCurve, MemoryConfig, RecordingClient, SinkCall};
    use heron_system::VolumeCurve;

    const OUT: OutputId = 1;

    fn engine_with_curve(
        curve: impl VolumeCurve + 'static,
        config: MemoryConfig,
    ) -> (PolicyEngine<Arc<RecordingClient>>, Arc<RecordingClient>) {
        let client = Arc::new(RecordingClient::new());
        let mut engine = PolicyEngine::new(Arc::clone(&client), Box::new(curve), Box::new(config));
        engine.open_output(OUT);
        (engine, client)
    }

    fn engine() -> (PolicyEngine<Arc<RecordingClient>>, Arc<RecordingClient>) {
        engine_with_curve(FixedCurve(0.5), MemoryConfig::new())
    }

    fn stream_volumes(client: &RecordingClient) -> Vec<f32> {
        client
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Stream { volume, .. } => Some(volume),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_muted_stream_never_reaches_hardware() {
        let (mut engine, client) = engine();
        engine
            .set_stream_mute(StreamType::Music, true, OUT, 0)
            .unwrap();
        client.clear();

        let result =
            engine.check_and_set_volume(StreamType::Music, 5, OUT, DeviceMask::SPEAKER, 0, true);
        assert!(result.is_ok());
        assert!(client.is_empty());
    }

    #[test]
    fn test_voice_call_rejected_while_sco_forced() {
        let (mut engine, client) = engine();
        engine.set_force_use(ForceUsage::Communication, ForcedConfig::BtSco);

        let err = engine
            .check_and_set_volume(StreamType::VoiceCall, 3, OUT, DeviceMask::EARPIECE, 0, false)
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidVolumeOperation { .. }));
        assert!(client.is_empty());
    }

    #[test]
    fn test_sco_rejected_unless_sco_forced() {
        let (mut engine, client) = engine();
        let err = engine
            .check_and_set_volume(
                StreamType::BluetoothSco,
                3,
                OUT,
                DeviceMask::BLUETOOTH_SCO,
                0,
                false,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::InvalidVolumeOperation {
                stream: StreamType::BluetoothSco,
                ..
            }
        ));
        assert!(client.is_empty());
    }

    #[test]
    fn test_speaker_attenuation_default_6db() {
        let (mut engine, client) = engine();
        engine
            .check_and_set_volume(StreamType::Music, 5, OUT, DeviceMask::SPEAKER, 0, false)
            .unwrap();

        let volumes = stream_volumes(&client);
        assert_eq!(volumes.len(), 1);
        // 0.5 * 10^(-6/20)
        assert!((volumes[0] - 0.2506).abs() < 1e-3);
    }

    #[test]
    fn test_speaker_attenuation_from_config() {
        let config = MemoryConfig::new().with(SPEAKER_ATTENUATION_KEY, "20");
        let (mut engine, client) = engine_with_curve(FixedCurve(0.5), config);
        engine
            .check_and_set_volume(StreamType::Music, 5, OUT, DeviceMask::SPEAKER, 0, false)
            .unwrap();

        let volumes = stream_volumes(&client);
        assert!((volumes[0] - 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_headset_attenuation_default_is_passthrough() {
        let (mut engine, client) = engine();
        engine
            .check_and_set_volume(StreamType::Music, 5, OUT, DeviceMask::WIRED_HEADSET, 0, false)
            .unwrap();

        let volumes = stream_volumes(&client);
        assert_eq!(volumes[0], 0.5);
    }

    #[test]
    fn test_headset_attenuation_from_config() {
        let config = MemoryConfig::new().with(HEADSET_ATTENUATION_KEY, "6");
        let (mut engine, client) = engine_with_curve(FixedCurve(0.5), config);
        engine
            .check_and_set_volume(
                StreamType::Music,
                5,
                OUT,
                DeviceMask::WIRED_HEADPHONE,
                0,
                false,
            )
            .unwrap();

        let volumes = stream_volumes(&client);
        assert!((volumes[0] - 0.2506).abs() < 1e-3);
    }

    #[test]
    fn test_attenuation_skipped_for_combined_masks() {
        // attenuation applies to the exact single-device masks only
        let (mut engine, client) = engine();
        engine
            .check_and_set_volume(
                StreamType::Music,
                5,
                OUT,
                DeviceMask::SPEAKER | DeviceMask::FM,
                0,
                false,
            )
            .unwrap();

        let volumes = stream_volumes(&client);
        assert_eq!(volumes[0], 0.5);
    }

    #[test]
    fn test_unchanged_volume_writes_once() {
        let (mut engine, client) = engine();
        for _ in 0..3 {
            engine
                .check_and_set_volume(StreamType::Music, 5, OUT, DeviceMask::SPEAKER, 0, false)
                .unwrap();
        }
        assert_eq!(client.calls().len(), 1);
    }

    #[test]
    fn test_force_flag_always_writes() {
        let (mut engine, client) = engine();
        for _ in 0..3 {
            engine
                .check_and_set_volume(StreamType::Music, 5, OUT, DeviceMask::SPEAKER, 0, true)
                .unwrap();
        }
        assert_eq!(client.calls().len(), 3);
    }

    #[test]
    fn test_voice_call_always_writes() {
        let (mut engine, client) = engine();
        engine.init_stream_volume(StreamType::VoiceCall, 0, 5);
        for _ in 0..3 {
            engine
                .check_and_set_volume(StreamType::VoiceCall, 3, OUT, DeviceMask::EARPIECE, 0, false)
                .unwrap();
        }
        assert_eq!(stream_volumes(&client).len(), 3);
    }

    #[test]
    fn test_voice_call_floor_remap() {
        let (mut engine, client) = engine_with_curve(FixedCurve(0.0), MemoryConfig::new());
        engine.init_stream_volume(StreamType::VoiceCall, 0, 5);
        engine
            .check_and_set_volume(StreamType::VoiceCall, 0, OUT, DeviceMask::EARPIECE, 0, false)
            .unwrap();

        let volumes = stream_volumes(&client);
        assert!((volumes[0] - 0.01).abs() < 1e-6);

        // full scale stays full scale
        let (mut engine, client) = engine_with_curve(FixedCurve(1.0), MemoryConfig::new());
        engine.init_stream_volume(StreamType::VoiceCall, 0, 5);
        engine
            .check_and_set_volume(StreamType::VoiceCall, 5, OUT, DeviceMask::EARPIECE, 0, false)
            .unwrap();
        let volumes = stream_volumes(&client);
        assert!((volumes[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dtmf_floor_remap() {
        let (mut engine, client) = engine();
        engine
            .check_and_set_volume(StreamType::Dtmf, 5, OUT, DeviceMask::EARPIECE, 0, false)
            .unwrap();

        let volumes = stream_volumes(&client);
        assert!((volumes[0] - (0.01 + 0.99 * 0.5)).abs() < 1e-6);

        // the recorded volume is the unremapped one
        assert_eq!(engine.output(OUT).unwrap().cur_volume(StreamType::Dtmf), 0.5);
    }

    #[test]
    fn test_fm_routes_through_dedicated_sink_on_primary() {
        let (mut engine, client) = engine();
        engine
            .check_and_set_volume(StreamType::Fm, 5, OUT, DeviceMask::FM, 10, false)
            .unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            SinkCall::Fm {
                volume: 0.5,
                delay_ms: 10
            }
        );
    }

    #[test]
    fn test_fm_on_secondary_output_is_a_silent_no_op() {
        let (mut engine, client) = engine();
        engine.open_output(2);
        engine
            .check_and_set_volume(StreamType::Fm, 5, 2, DeviceMask::FM, 0, false)
            .unwrap();

        // neither the FM sink nor the generic stream write fires
        assert!(client.is_empty());
    }

    #[test]
    fn test_voice_volume_side_channel() {
        let (mut engine, client) = engine();
        engine.init_stream_volume(StreamType::VoiceCall, 0, 5);
        engine
            .check_and_set_volume(StreamType::VoiceCall, 3, OUT, DeviceMask::EARPIECE, 7, false)
            .unwrap();

        let voice: Vec<_> = client
            .calls()
            .into_iter()
            .filter(|c| matches!(c, SinkCall::Voice { .. }))
            .collect();
        assert_eq!(
            voice,
            vec![SinkCall::Voice {
                volume: 0.6,
                delay_ms: 7
            }]
        );
        assert_eq!(engine.last_voice_volume(), 0.6);
    }

    #[test]
    fn test_sco_voice_volume_is_full_scale() {
        let (mut engine, client) = engine();
        engine.set_force_use(ForceUsage::Communication, ForcedConfig::BtSco);
        engine
            .check_and_set_volume(
                StreamType::BluetoothSco,
                2,
                OUT,
                DeviceMask::BLUETOOTH_SCO,
                0,
                false,
            )
            .unwrap();

        let voice: Vec<_> = client
            .calls()
            .into_iter()
            .filter(|c| matches!(c, SinkCall::Voice { .. }))
            .collect();
        assert_eq!(
            voice,
            vec![SinkCall::Voice {
                volume: 1.0,
                delay_ms: 0
            }]
        );
        assert_eq!(engine.last_voice_volume(), 1.0);
    }

    #[test]
    fn test_voice_side_channel_skips_secondary_outputs() {
        let (mut engine, client) = engine();
        engine.open_output(2);
        engine.init_stream_volume(StreamType::VoiceCall, 0, 5);
        engine
            .check_and_set_volume(StreamType::VoiceCall, 3, 2, DeviceMask::EARPIECE, 0, false)
            .unwrap();

        assert!(client
            .calls()
            .iter()
            .all(|c| !matches!(c, SinkCall::Voice { .. })));
    }

    #[test]
    fn test_unknown_output_errors() {
        let (mut engine, _client) = engine();
        let err = engine
            .check_and_set_volume(StreamType::Music, 5, 99, DeviceMask::SPEAKER, 0, false)
            .unwrap_err();
        assert_eq!(err, PolicyError::UnknownOutput(99));
    }
}
