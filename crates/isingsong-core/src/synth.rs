//! Phase trajectory → normalized mono waveform.
//!
//! `w[k] = env[k] · Σ_i sin θ_i[k]`, then `w[k] /= max_k |w[k]| + ε`.

use serde::Serialize;

use crate::error::{SimError, SimResult};
use crate::integrator::PhaseTrajectory;
use crate::schedule::AmplitudeEnvelope;

/// Guard term added to the peak before dividing.
pub const NORMALIZE_EPS: f64 = 1e-10;

/// Full-scale magnitude of a signed 16-bit sample.
pub const PCM16_FULL_SCALE: f64 = i16::MAX as f64;

/// Normalized samples in [-1, 1] at a fixed sample rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()))
    }

    /// Quantize to signed 16-bit: `round(w · 32767)`.
    pub fn to_pcm16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|s| {
                (s * PCM16_FULL_SCALE)
                    .round()
                    .clamp(-PCM16_FULL_SCALE, PCM16_FULL_SCALE) as i16
            })
            .collect()
    }
}

/// Un-normalized sample for one step.
#[inline]
pub fn raw_sample(theta: &[f64], gain: f64) -> f64 {
    theta.iter().map(|th| th.sin()).sum::<f64>() * gain
}

/// Accumulates one raw sample per step; normalizes on [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct SignalSynthesizer {
    envelope: AmplitudeEnvelope,
    raw: Vec<f64>,
}

impl SignalSynthesizer {
    pub fn new(envelope: AmplitudeEnvelope) -> Self {
        Self {
            raw: Vec::with_capacity(envelope.len()),
            envelope,
        }
    }

    /// Append the sample for step `k`. Steps must arrive in order.
    pub fn push(&mut self, k: usize, theta: &[f64]) {
        debug_assert_eq!(k, self.raw.len());
        self.raw.push(raw_sample(theta, self.envelope.gain(k)));
    }

    pub fn finish(self, sample_rate: u32) -> SimResult<Waveform> {
        Ok(Waveform {
            samples: normalize(self.raw)?,
            sample_rate,
        })
    }
}

/// Divide by `max |x| + ε`. A silent signal stays silent; a non-finite sample
/// is an error.
pub fn normalize(mut samples: Vec<f64>) -> SimResult<Vec<f64>> {
    if let Some((sample, &value)) = samples.iter().enumerate().find(|(_, s)| !s.is_finite()) {
        return Err(SimError::NonFiniteSample { sample, value });
    }
    let peak = samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
    if peak == 0.0 {
        log::warn!("synthesized signal is silent ({} samples)", samples.len());
    }
    let scale = peak + NORMALIZE_EPS;
    for s in samples.iter_mut() {
        *s /= scale;
    }
    Ok(samples)
}

/// Synthesize from a materialized trajectory.
pub fn synthesize(
    trajectory: &PhaseTrajectory,
    envelope: AmplitudeEnvelope,
    sample_rate: u32,
) -> SimResult<Waveform> {
    let mut synth = SignalSynthesizer::new(envelope);
    for (k, theta) in trajectory.iter().enumerate() {
        synth.push(k, theta);
    }
    synth.finish(sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_normalized_within_unit_range() {
        let out = normalize(vec![0.5, -3.0, 2.0, 0.0]).unwrap();
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!((out[1] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_silent_signal_does_not_divide_by_zero() {
        let out = normalize(vec![0.0; 16]).unwrap();
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_non_finite_sample_rejected() {
        let err = normalize(vec![0.5, f64::NAN, 1.0]).unwrap_err();
        assert!(matches!(err, SimError::NonFiniteSample { sample: 1, .. }), "{err}");
    }

    #[test]
    fn test_overflowing_gain_is_error_not_silence() {
        // 2 · 1e308 overflows to inf before normalization.
        let env = AmplitudeEnvelope::new(1e308, 1e308, 3);
        let mut synth = SignalSynthesizer::new(env);
        for k in 0..3 {
            synth.push(k, &[FRAC_PI_2, FRAC_PI_2]);
        }
        let err = synth.finish(100).unwrap_err();
        assert!(matches!(err, SimError::NonFiniteSample { sample: 0, .. }), "{err}");
    }

    #[test]
    fn test_raw_sample_sums_sines() {
        let s = raw_sample(&[FRAC_PI_2, FRAC_PI_2, 0.0], 0.5);
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_envelope_shapes_constant_phase() {
        // Constant phase: the normalized signal is the envelope over its max.
        let env = AmplitudeEnvelope::new(0.1, 1.0, 4);
        let mut synth = SignalSynthesizer::new(env);
        for k in 0..4 {
            synth.push(k, &[FRAC_PI_2]);
        }
        let w = synth.finish(8).unwrap();
        assert!((w.samples[0] - 0.1).abs() < 1e-9);
        assert!((w.samples[3] - 1.0).abs() < 1e-9);
        assert_eq!(w.duration_secs(), 0.5);
    }

    #[test]
    fn test_pcm16_rounds_and_saturates() {
        let w = Waveform {
            samples: vec![0.0, 1.0, -1.0, 0.5, 1.0e-5],
            sample_rate: 44_100,
        };
        assert_eq!(w.to_pcm16(), vec![0, 32767, -32767, 16384, 0]);
    }
}
