//! Oscillator ensemble and coupling matrix, and the seeded draw that builds them.
//!
//! Draw order from the run's random source (fixed, so a seed pins the run):
//!   1. N initial frequencies, uniform in [f_min, f_max] Hz
//!   2. N octave exponents u, uniform in [0, octave_spread]
//!   3. N×N coupling signs, row-major
//!   4. N×N coupling magnitudes, row-major
//!   5. N initial phases, uniform in [0, 2π)

use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::integrator::wrap_phase;

/// Tolerance used when checking caller-supplied matrices for symmetry.
const SYMMETRY_TOL: f64 = 1e-12;

/// Per-oscillator glissando endpoints and starting phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    /// Angular frequency at t = 0 (rad/s).
    pub omega_start: Vec<f64>,
    /// Angular frequency approached as t → D (rad/s).
    pub omega_end: Vec<f64>,
    /// Initial phases θ(0) in [0, 2π).
    pub phases: Vec<f64>,
}

impl Ensemble {
    /// Build an ensemble from explicit values. Phases are wrapped into [0, 2π).
    pub fn new(omega_start: Vec<f64>, omega_end: Vec<f64>, phases: Vec<f64>) -> SimResult<Self> {
        let n = omega_start.len();
        if n == 0 {
            return Err(SimError::Shape("ensemble needs at least one oscillator".into()));
        }
        if omega_end.len() != n || phases.len() != n {
            return Err(SimError::Shape(format!(
                "ensemble vectors disagree: {} start, {} end, {} phases",
                n,
                omega_end.len(),
                phases.len()
            )));
        }
        if let Some(bad) = omega_start
            .iter()
            .chain(&omega_end)
            .chain(&phases)
            .find(|v| !v.is_finite())
        {
            return Err(SimError::Shape(format!("ensemble contains non-finite value {bad}")));
        }
        let phases = phases.into_iter().map(wrap_phase).collect();
        Ok(Self {
            omega_start,
            omega_end,
            phases,
        })
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

/// Dense N×N coupling matrix stored row-major in one contiguous buffer.
///
/// Invariants: symmetric, zero diagonal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingMatrix {
    n: usize,
    data: Vec<f64>,
}

impl CouplingMatrix {
    /// Build from a row-major buffer, checking shape, symmetry and diagonal.
    pub fn from_flat(n: usize, data: Vec<f64>) -> SimResult<Self> {
        if n == 0 {
            return Err(SimError::Shape("coupling matrix must be at least 1x1".into()));
        }
        if data.len() != n * n {
            return Err(SimError::Shape(format!(
                "coupling buffer has {} entries, expected {}",
                data.len(),
                n * n
            )));
        }
        let m = Self { n, data };
        for i in 0..n {
            if m.get(i, i) != 0.0 {
                return Err(SimError::Shape(format!(
                    "K[{i},{i}] = {} but the diagonal must be zero",
                    m.get(i, i)
                )));
            }
            for j in (i + 1)..n {
                let (a, b) = (m.get(i, j), m.get(j, i));
                if !a.is_finite() || !b.is_finite() {
                    return Err(SimError::Shape(format!("K[{i},{j}] is not finite")));
                }
                if (a - b).abs() > SYMMETRY_TOL {
                    return Err(SimError::Shape(format!("K[{i},{j}] = {a} != K[{j},{i}] = {b}")));
                }
            }
        }
        Ok(m)
    }

    /// Build from nested rows, e.g. `vec![vec![0.0, 1.0], vec![1.0, 0.0]]`.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> SimResult<Self> {
        let n = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(SimError::Shape(format!(
                "row {i} has {} columns, expected {n}",
                row.len()
            )));
        }
        Self::from_flat(n, rows.into_iter().flatten().collect())
    }

    /// All-zero coupling (uncoupled oscillators).
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Dense mat-vec product `out = K · x`.
    pub fn mul_vec_into(&self, x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(x.len(), self.n);
        debug_assert_eq!(out.len(), self.n);
        for (i, o) in out.iter_mut().enumerate() {
            *o = dot(self.row(i), x);
        }
    }
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Everything the initializer draws for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub ensemble: Ensemble,
    pub coupling: CouplingMatrix,
}

/// Draw the ensemble and coupling matrix from `rng` in the documented order.
pub fn draw_parameters(config: &SimConfig, rng: &mut impl Rng) -> SimResult<Parameters> {
    config.validate()?;
    let n = config.oscillators;

    let freqs_hz: Vec<f64> = (0..n)
        .map(|_| rng.random_range(config.freq_min_hz..=config.freq_max_hz))
        .collect();
    let octaves: Vec<f64> = (0..n)
        .map(|_| rng.random_range(0.0..=config.octave_spread))
        .collect();
    let omega_start: Vec<f64> = freqs_hz.iter().map(|f| TAU * f).collect();
    let omega_end: Vec<f64> = freqs_hz
        .iter()
        .zip(&octaves)
        .map(|(f, u)| TAU * f * u.exp2())
        .collect();

    let signs: Vec<f64> = (0..n * n)
        .map(|_| if rng.random_bool(0.5) { 1.0 } else { -1.0 })
        .collect();
    let magnitudes: Vec<f64> = (0..n * n)
        .map(|_| rng.random_range(config.coupling_min..=config.coupling_max))
        .collect();
    let raw: Vec<f64> = signs.iter().zip(&magnitudes).map(|(s, m)| s * m).collect();
    let coupling = symmetrize(n, &raw);

    let phases: Vec<f64> = (0..n)
        .map(|_| wrap_phase(rng.random::<f64>() * TAU))
        .collect();

    log::debug!(
        "drew {n} oscillators: f0 in [{:.1}, {:.1}] Hz, seed {}",
        freqs_hz.iter().copied().fold(f64::INFINITY, f64::min),
        freqs_hz.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        config.seed
    );

    Ok(Parameters {
        ensemble: Ensemble {
            omega_start,
            omega_end,
            phases,
        },
        coupling,
    })
}

/// `(K + Kᵗ) / 2` with the diagonal forced to zero.
fn symmetrize(n: usize, raw: &[f64]) -> CouplingMatrix {
    let mut k = CouplingMatrix::zeros(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (raw[i * n + j] + raw[j * n + i]);
            k.data[i * n + j] = avg;
            k.data[j * n + i] = avg;
        }
    }
    k
}
