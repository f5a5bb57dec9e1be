//! Euler–Maruyama integrator for the annealed, gliding Kuramoto network:
//!
//!   dθ_i = ω_i(t)·dt + (1/N)·Σ_j K_ij sin(θ_j − θ_i)·dt + σ(t)·dt·z_i,   z_i ~ N(0, 1)
//!   θ_i ← (θ_i + dθ_i) mod 2π
//!
//! The coupling sum is evaluated as two dense mat-vec products over the flat
//! coupling buffer, using sin(θ_j − θ_i) = sin θ_j cos θ_i − cos θ_j sin θ_i:
//!
//!   Σ_j K_ij sin(θ_j − θ_i) = cos θ_i·(K·sin θ)_i − sin θ_i·(K·cos θ)_i
//!
//! Steps are strictly sequential. The N standard normals of a step are drawn as
//! one ordered batch before any arithmetic, so the `parallel` feature (row-split
//! mat-vec) never changes which random number lands on which oscillator.

use std::f64::consts::TAU;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_STEPS, SimConfig};
use crate::error::{SimError, SimResult};
use crate::params::{CouplingMatrix, Parameters};
use crate::schedule::{FrequencySchedule, NoiseSchedule, TimeGrid};

/// Below this many oscillators the row reduction stays on the calling thread.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_OSCILLATORS: usize = 256;

/// Reduce a phase into [0, 2π).
///
/// `rem_euclid` can round a tiny negative input up to exactly 2π; that case
/// folds back to 0.
#[inline]
pub fn wrap_phase(x: f64) -> f64 {
    let r = x.rem_euclid(TAU);
    if r >= TAU { 0.0 } else { r }
}

/// Phase vector at a given step index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    /// θ_i in [0, 2π).
    pub theta: Vec<f64>,
    /// Index into the time grid.
    pub step: usize,
}

impl PhaseState {
    pub fn new(theta: Vec<f64>) -> Self {
        Self { theta, step: 0 }
    }
}

/// Every phase vector of a run, row-major (`steps × N`).
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTrajectory {
    n: usize,
    data: Vec<f64>,
}

impl PhaseTrajectory {
    pub fn with_capacity(n: usize, steps: usize) -> Self {
        Self {
            n,
            data: Vec::with_capacity(n * steps),
        }
    }

    pub fn push(&mut self, theta: &[f64]) {
        debug_assert_eq!(theta.len(), self.n);
        self.data.extend_from_slice(theta);
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        if self.n == 0 { 0 } else { self.data.len() / self.n }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn oscillators(&self) -> usize {
        self.n
    }

    pub fn step(&self, k: usize) -> &[f64] {
        &self.data[k * self.n..(k + 1) * self.n]
    }

    pub fn last(&self) -> Option<&[f64]> {
        self.len().checked_sub(1).map(|k| self.step(k))
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.n)
    }
}

/// Pre-allocated buffers for one step.
#[derive(Debug, Clone)]
pub struct Scratch {
    sin: Vec<f64>,
    cos: Vec<f64>,
    k_sin: Vec<f64>,
    k_cos: Vec<f64>,
    noise: Vec<f64>,
}

impl Scratch {
    pub fn new(n: usize) -> Self {
        Self {
            sin: vec![0.0; n],
            cos: vec![0.0; n],
            k_sin: vec![0.0; n],
            k_cos: vec![0.0; n],
            noise: vec![0.0; n],
        }
    }
}

/// Fill `out` with one batch of standard normals, in index order.
pub fn draw_noise_batch(rng: &mut impl Rng, out: &mut [f64]) {
    for z in out.iter_mut() {
        *z = rng.sample(StandardNormal);
    }
}

/// Stochastic phase stepper. Holds only immutable run parameters; the step
/// function maps `(θ_k, z_k+1) → θ_k+1` without hidden state.
#[derive(Debug, Clone)]
pub struct Integrator {
    coupling: CouplingMatrix,
    frequencies: FrequencySchedule,
    noise: NoiseSchedule,
    grid: TimeGrid,
}

impl Integrator {
    pub fn new(
        coupling: CouplingMatrix,
        frequencies: FrequencySchedule,
        noise: NoiseSchedule,
        grid: TimeGrid,
    ) -> SimResult<Self> {
        if coupling.n() != frequencies.len() {
            return Err(SimError::Shape(format!(
                "coupling is {0}x{0} but {1} frequencies were given",
                coupling.n(),
                frequencies.len()
            )));
        }
        Ok(Self {
            coupling,
            frequencies,
            noise,
            grid,
        })
    }

    /// Wire schedules from a validated config and drawn parameters.
    pub fn from_parameters(config: &SimConfig, params: &Parameters) -> SimResult<Self> {
        let ens = &params.ensemble;
        Self::new(
            params.coupling.clone(),
            FrequencySchedule::new(
                ens.omega_start.clone(),
                ens.omega_end.clone(),
                config.duration_secs,
            ),
            NoiseSchedule::new(config.noise_max, config.duration_secs),
            TimeGrid::from_config(config),
        )
    }

    pub fn oscillators(&self) -> usize {
        self.coupling.n()
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Mean-field coupling term (1/N)·Σ_j K_ij sin(θ_j − θ_i) for every i.
    pub fn coupling_into(&self, theta: &[f64], scratch: &mut Scratch, out: &mut [f64]) {
        for (i, &th) in theta.iter().enumerate() {
            let (s, c) = th.sin_cos();
            scratch.sin[i] = s;
            scratch.cos[i] = c;
        }
        mat_vec(&self.coupling, &scratch.sin, &mut scratch.k_sin);
        mat_vec(&self.coupling, &scratch.cos, &mut scratch.k_cos);

        let inv_n = 1.0 / theta.len() as f64;
        for (i, o) in out.iter_mut().enumerate() {
            *o = (scratch.cos[i] * scratch.k_sin[i] - scratch.sin[i] * scratch.k_cos[i]) * inv_n;
        }
    }

    /// Advance `theta` (the state at step `k − 1`) to step `k`, writing into
    /// `out`. `noise` holds the N standard normals drawn for this step.
    pub fn step_into(
        &self,
        theta: &[f64],
        k: usize,
        noise: &[f64],
        scratch: &mut Scratch,
        out: &mut [f64],
    ) -> SimResult<()> {
        let n = self.oscillators();
        if theta.len() != n || noise.len() != n || out.len() != n {
            return Err(SimError::Shape(format!(
                "step expects {n} phases, noise draws and outputs, got {}, {} and {}",
                theta.len(),
                noise.len(),
                out.len()
            )));
        }

        let dt = self.grid.dt;
        let t = self.grid.time(k);
        let noise_scale = self.noise.sigma(t) * dt;

        self.coupling_into(theta, scratch, out);
        for i in 0..n {
            let d_theta = self.frequencies.omega(i, t) * dt + out[i] * dt + noise_scale * noise[i];
            let next = theta[i] + d_theta;
            if !next.is_finite() {
                return Err(SimError::Numerical {
                    step: k,
                    oscillator: i,
                    value: next,
                });
            }
            out[i] = wrap_phase(next);
        }
        Ok(())
    }

    /// Pure transition `step(state_k, noise_k+1) → state_k+1`.
    pub fn step(&self, state: &PhaseState, noise: &[f64]) -> SimResult<PhaseState> {
        let mut scratch = Scratch::new(self.oscillators());
        let mut next = vec![0.0; self.oscillators()];
        self.step_into(&state.theta, state.step + 1, noise, &mut scratch, &mut next)?;
        Ok(PhaseState {
            theta: next,
            step: state.step + 1,
        })
    }

    /// Fold the step function over the whole grid.
    ///
    /// `visit(k, θ_k)` sees every step in order, starting with the initial
    /// phases at `k = 0`. Returns the final phase vector.
    pub fn run<R, F>(&self, initial: &[f64], rng: &mut R, mut visit: F) -> SimResult<Vec<f64>>
    where
        R: Rng,
        F: FnMut(usize, &[f64]) -> SimResult<()>,
    {
        let n = self.oscillators();
        if initial.len() != n {
            return Err(SimError::Shape(format!(
                "expected {n} initial phases, got {}",
                initial.len()
            )));
        }
        let steps = self.grid.steps;
        let report_every = (steps / 10).max(1);

        let mut scratch = Scratch::new(n);
        let mut noise = vec![0.0; n];
        let mut current = initial.to_vec();
        let mut next = vec![0.0; n];

        visit(0, &current)?;
        for k in 1..steps {
            draw_noise_batch(rng, &mut noise);
            self.step_into(&current, k, &noise, &mut scratch, &mut next)?;
            std::mem::swap(&mut current, &mut next);
            visit(k, &current)?;
            if k % report_every == 0 {
                let pct = 100.0 * self.grid.fraction(k);
                log::debug!("integrated {k}/{steps} steps ({pct:.0}%)");
            }
        }
        Ok(current)
    }

    /// Run and keep every phase vector.
    pub fn trajectory(&self, initial: &[f64], rng: &mut impl Rng) -> SimResult<PhaseTrajectory> {
        let (n, steps) = (self.oscillators(), self.grid.steps);
        if n.checked_mul(steps).is_none_or(|len| len > MAX_STEPS) {
            return Err(SimError::Config(format!(
                "trajectory of {steps} steps x {n} oscillators is too large to keep; render instead"
            )));
        }
        let mut traj = PhaseTrajectory::with_capacity(n, steps);
        self.run(initial, rng, |_, theta| {
            traj.push(theta);
            Ok(())
        })?;
        Ok(traj)
    }
}

#[cfg(feature = "parallel")]
fn mat_vec(k: &CouplingMatrix, x: &[f64], out: &mut [f64]) {
    use rayon::prelude::*;

    if k.n() < PARALLEL_MIN_OSCILLATORS {
        k.mul_vec_into(x, out);
        return;
    }
    out.par_iter_mut()
        .enumerate()
        .for_each(|(i, o)| *o = crate::params::dot(k.row(i), x));
}

#[cfg(not(feature = "parallel"))]
fn mat_vec(k: &CouplingMatrix, x: &[f64], out: &mut [f64]) {
    k.mul_vec_into(x, out);
}
