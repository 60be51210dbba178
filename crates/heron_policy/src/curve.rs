//! Stock Index-to-Volume Curve
//!
//! Maps a volume index to a linear gain on a fixed dB-per-step curve.
//! Platforms with calibrated per-stream curves provide their own
//! `VolumeCurve`; this one is the sane default.

use heron_system::{DeviceMask, OutputId, StreamType, VolumeCurve};

/// Logarithmic curve with a fixed attenuation per index step
///
/// Index 0 is true silence; the top index is unity gain.
#[derive(Debug, Clone, Copy)]
pub struct DefaultVolumeCurve {
    /// Highest volume index the curve is calibrated for
    pub max_index: u32,
    /// Attenuation applied per step below the top index
    pub db_per_step: f32,
}

impl Default for DefaultVolumeCurve {
    fn default() -> Self {
        Self {
            max_index: 15,
            db_per_step: 3.0,
        }
    }
}

impl VolumeCurve for DefaultVolumeCurve {
    fn gain(&self, _stream: StreamType, index: u32, _output: OutputId, _device: DeviceMask) -> f32 {
        if index == 0 {
            return 0.0;
        }
        let index = index.min(self.max_index);
        let db = (self.max_index - index) as f32 * self.db_per_step;
        10f32.powf(-db / 20.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let curve = DefaultVolumeCurve::default();
        assert_eq!(curve.gain(StreamType::Music, 0, 1, DeviceMask::SPEAKER), 0.0);
        assert_eq!(
            curve.gain(StreamType::Music, 15, 1, DeviceMask::SPEAKER),
            1.0
        );
    }

    #[test]
    fn test_monotonically_increasing() {
        let curve = DefaultVolumeCurve::default();
        let mut last = -1.0;
        for index in 0..=15 {
            let gain = curve.gain(StreamType::Music, index, 1, DeviceMask::SPEAKER);
            assert!(gain > last, "gain not increasing at index {}", index);
            assert!((0.0..=1.0).contains(&gain));
            last = gain;
        }
    }

    #[test]
    fn test_one_step_below_max() {
        let curve = DefaultVolumeCurve::default();
        let gain = curve.gain(StreamType::Music, 14, 1, DeviceMask::SPEAKER);
        // one step = 3 dB
        assert!((gain - 10f32.powf(-3.0 / 20.0)).abs() < 1e-6);
    }

    #[test]
    fn test_index_above_max_clamps() {
        let curve = DefaultVolumeCurve::default();
        assert_eq!(
            curve.gain(StreamType::Music, 99, 1, DeviceMask::SPEAKER),
            1.0
        );
    }
}
