//! Run configuration.
//!
//! Every knob of a run is an explicit field here; nothing downstream reads a
//! hard-coded constant. [`SimConfig::validate`] is called by every simulation
//! entry point before the random source is touched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Upper bound on steps: one `f64` per step must stay addressable.
pub const MAX_STEPS: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// Configuration for one batch simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of oscillators N.
    pub oscillators: usize,
    /// Output sample rate in Hz; the integration step is `1 / sample_rate`.
    pub sample_rate: u32,
    /// Total simulated time D in seconds.
    pub duration_secs: f64,
    /// Lower bound of the initial frequency draw (Hz).
    pub freq_min_hz: f64,
    /// Upper bound of the initial frequency draw (Hz).
    pub freq_max_hz: f64,
    /// Targets are `initial * 2^u` with `u ~ U(0, octave_spread)`.
    pub octave_spread: f64,
    /// Noise standard deviation at t = 0 (rad/s), decaying linearly to 0.
    pub noise_max: f64,
    /// Gain of the first sample.
    pub envelope_min: f64,
    /// Gain of the last sample.
    pub envelope_max: f64,
    /// Lower bound of coupling magnitudes.
    pub coupling_min: f64,
    /// Upper bound of coupling magnitudes.
    pub coupling_max: f64,
    /// Seed for the single pseudorandom source of the run.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            oscillators: 30,
            sample_rate: 44_100,
            duration_secs: 30.0,
            freq_min_hz: 200.0,
            freq_max_hz: 400.0,
            octave_spread: 3.0,
            noise_max: 5.0,
            envelope_min: 0.1,
            envelope_max: 1.0,
            coupling_min: 0.5,
            coupling_max: 2.0,
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Number of integration steps: ⌊duration × sample_rate⌋.
    ///
    /// A small tolerance keeps products such as `4.35 * 100.0` from rounding
    /// down to one step short.
    pub fn num_steps(&self) -> usize {
        let exact = self.exact_steps();
        if !exact.is_finite() || exact <= 0.0 {
            return 0;
        }
        (exact + 1e-9).floor() as usize
    }

    fn exact_steps(&self) -> f64 {
        self.duration_secs * f64::from(self.sample_rate)
    }

    /// Fixed step size in seconds.
    pub fn dt(&self) -> f64 {
        1.0 / f64::from(self.sample_rate)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> SimResult<()> {
        if self.oscillators == 0 {
            return Err(SimError::Config("oscillators must be >= 1".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(SimError::Config("sample_rate must be > 0".to_string()));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(SimError::Config(format!(
                "duration_secs must be finite and > 0, got {}",
                self.duration_secs
            )));
        }
        if !self.freq_min_hz.is_finite() || !self.freq_max_hz.is_finite() {
            return Err(SimError::Config(format!(
                "frequency range must be finite, got [{}, {}]",
                self.freq_min_hz, self.freq_max_hz
            )));
        }
        if self.freq_min_hz < 0.0 {
            return Err(SimError::Config(format!(
                "freq_min_hz must be >= 0, got {}",
                self.freq_min_hz
            )));
        }
        if self.freq_min_hz > self.freq_max_hz {
            return Err(SimError::Config(format!(
                "freq_min_hz ({}) must not exceed freq_max_hz ({})",
                self.freq_min_hz, self.freq_max_hz
            )));
        }
        if !self.octave_spread.is_finite() || self.octave_spread < 0.0 {
            return Err(SimError::Config(format!(
                "octave_spread must be finite and >= 0, got {}",
                self.octave_spread
            )));
        }
        if !self.noise_max.is_finite() || self.noise_max < 0.0 {
            return Err(SimError::Config(format!(
                "noise_max must be finite and >= 0, got {}",
                self.noise_max
            )));
        }
        check_range("envelope", self.envelope_min, self.envelope_max)?;
        // Peak raw sample is bounded by N · envelope_max.
        if !(self.oscillators as f64 * self.envelope_max).is_finite() {
            return Err(SimError::Config(format!(
                "envelope_max {} overflows a sum of {} oscillators",
                self.envelope_max, self.oscillators
            )));
        }
        check_range("coupling", self.coupling_min, self.coupling_max)?;
        if self.exact_steps() >= MAX_STEPS as f64 {
            return Err(SimError::Config(format!(
                "duration {}s at {} Hz yields too many samples (max {MAX_STEPS})",
                self.duration_secs, self.sample_rate
            )));
        }
        if self.num_steps() == 0 {
            return Err(SimError::Config(format!(
                "duration {}s at {} Hz yields no samples",
                self.duration_secs, self.sample_rate
            )));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> SimResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SimError::Config(format!("JSON parse error: {e}")))
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

fn check_range(name: &str, lo: f64, hi: f64) -> SimResult<()> {
    if !lo.is_finite() || !hi.is_finite() || lo < 0.0 {
        return Err(SimError::Config(format!(
            "{name} range must be finite and non-negative, got [{lo}, {hi}]"
        )));
    }
    if lo > hi {
        return Err(SimError::Config(format!(
            "{name} range is inverted: [{lo}, {hi}]"
        )));
    }
    Ok(())
}
