//! Stateless schedules over the run's time grid.
//!
//!   ω_i(t) = ω0_i·(1 − t/D) + ω1_i·(t/D)     glissando
//!   σ(t)   = σ_max·(1 − t/D)                 annealing
//!   env[k] = linspace(env_min, env_max, steps)[k]   crescendo

use crate::config::SimConfig;

/// Discrete time axis: `steps` samples spaced evenly over the half-open
/// interval [0, D).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    pub steps: usize,
    pub duration: f64,
    pub dt: f64,
}

impl TimeGrid {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            steps: config.num_steps(),
            duration: config.duration_secs,
            dt: config.dt(),
        }
    }

    /// Time of step `k`: `k · D / steps`, always `< D` for `k < steps`.
    #[inline]
    pub fn time(&self, k: usize) -> f64 {
        k as f64 * self.duration / self.steps as f64
    }

    /// Elapsed fraction `t / D` at step `k`.
    #[inline]
    pub fn fraction(&self, k: usize) -> f64 {
        k as f64 / self.steps as f64
    }
}

/// Linear interpolation between per-oscillator start and end angular frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySchedule {
    omega_start: Vec<f64>,
    omega_end: Vec<f64>,
    duration: f64,
}

impl FrequencySchedule {
    pub fn new(omega_start: Vec<f64>, omega_end: Vec<f64>, duration: f64) -> Self {
        debug_assert_eq!(omega_start.len(), omega_end.len());
        Self {
            omega_start,
            omega_end,
            duration,
        }
    }

    pub fn len(&self) -> usize {
        self.omega_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.omega_start.is_empty()
    }

    /// ω_i(t) for one oscillator.
    #[inline]
    pub fn omega(&self, i: usize, t: f64) -> f64 {
        let frac = t / self.duration;
        self.omega_start[i] * (1.0 - frac) + self.omega_end[i] * frac
    }

    /// ω(t) for every oscillator, written into `out`.
    pub fn omegas_into(&self, t: f64, out: &mut [f64]) {
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.omega(i, t);
        }
    }
}

/// Linearly decaying noise standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSchedule {
    sigma_max: f64,
    duration: f64,
}

impl NoiseSchedule {
    pub fn new(sigma_max: f64, duration: f64) -> Self {
        Self {
            sigma_max,
            duration,
        }
    }

    #[inline]
    pub fn sigma(&self, t: f64) -> f64 {
        self.sigma_max * (1.0 - t / self.duration)
    }
}

/// Linear gain ramp across the sample index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeEnvelope {
    min: f64,
    max: f64,
    steps: usize,
}

impl AmplitudeEnvelope {
    pub fn new(min: f64, max: f64, steps: usize) -> Self {
        Self { min, max, steps }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.envelope_min, config.envelope_max, config.num_steps())
    }

    /// Endpoints are inclusive; a single-sample run uses `min`.
    #[inline]
    pub fn gain(&self, k: usize) -> f64 {
        if self.steps <= 1 {
            return self.min;
        }
        self.min + (self.max - self.min) * (k as f64 / (self.steps - 1) as f64)
    }

    pub fn len(&self) -> usize {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_grid_half_open() {
        let cfg = SimConfig {
            sample_rate: 8,
            duration_secs: 0.5,
            ..Default::default()
        };
        let grid = TimeGrid::from_config(&cfg);
        assert_eq!(grid.steps, 4);
        assert_eq!(grid.time(0), 0.0);
        assert!((grid.time(1) - 0.125).abs() < 1e-15);
        assert!(grid.time(grid.steps - 1) < cfg.duration_secs);
    }

    #[test]
    fn test_frequency_interpolates_endpoints() {
        let sched = FrequencySchedule::new(vec![10.0, 100.0], vec![20.0, 50.0], 2.0);
        assert_eq!(sched.omega(0, 0.0), 10.0);
        assert_eq!(sched.omega(1, 0.0), 100.0);
        assert!((sched.omega(0, 1.0) - 15.0).abs() < 1e-12);
        assert!((sched.omega(1, 1.0) - 75.0).abs() < 1e-12);
        assert!((sched.omega(0, 2.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_frequency_when_endpoints_match() {
        let sched = FrequencySchedule::new(vec![7.5], vec![7.5], 3.0);
        for t in [0.0, 0.4, 1.9, 2.99] {
            assert!((sched.omega(0, t) - 7.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_noise_decays_to_zero() {
        let noise = NoiseSchedule::new(5.0, 10.0);
        assert_eq!(noise.sigma(0.0), 5.0);
        assert!((noise.sigma(5.0) - 2.5).abs() < 1e-12);
        assert!(noise.sigma(10.0).abs() < 1e-12);
    }

    #[test]
    fn test_envelope_ramp() {
        let env = AmplitudeEnvelope::new(0.1, 1.0, 10);
        assert!((env.gain(0) - 0.1).abs() < 1e-12);
        assert!((env.gain(9) - 1.0).abs() < 1e-12);
        for k in 1..10 {
            assert!(env.gain(k) > env.gain(k - 1));
        }
    }

    #[test]
    fn test_envelope_single_sample() {
        let env = AmplitudeEnvelope::new(0.1, 1.0, 1);
        assert_eq!(env.gain(0), 0.1);
    }
}
