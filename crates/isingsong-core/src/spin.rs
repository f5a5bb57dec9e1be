//! Spin read-out from final phases and the pairwise Ising energy.
//!
//! Both are heuristics layered on the continuous dynamics: spins are taken
//! relative to oscillator 0, and the energy uses the coupling matrix directly
//! as J. Neither claims a correspondence with a true Ising ground state.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::params::CouplingMatrix;

/// Ising spin label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spin {
    Up,
    Down,
}

impl Spin {
    #[inline]
    pub fn value(self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl std::fmt::Display for Spin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "+1"),
            Self::Down => write!(f, "-1"),
        }
    }
}

/// Ordered spin labels, one per oscillator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinAssignment(pub Vec<Spin>);

impl SpinAssignment {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels as ±1 integers.
    pub fn values(&self) -> Vec<i8> {
        self.0.iter().map(|s| s.value()).collect()
    }
}

impl std::fmt::Display for SpinAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{s}")?;
        }
        write!(f, "]")
    }
}

/// Threshold each phase relative to the first oscillator:
/// `(θ_i − θ_0) mod 2π < π` → up, otherwise down.
pub fn infer_spins(final_theta: &[f64]) -> SpinAssignment {
    let Some(&reference) = final_theta.first() else {
        return SpinAssignment(Vec::new());
    };
    SpinAssignment(
        final_theta
            .iter()
            .map(|&th| {
                if (th - reference).rem_euclid(TAU) < PI {
                    Spin::Up
                } else {
                    Spin::Down
                }
            })
            .collect(),
    )
}

/// `E = −½ Σ_i Σ_j K_ij s_i s_j`.
pub fn ising_energy(coupling: &CouplingMatrix, spins: &SpinAssignment) -> SimResult<f64> {
    if coupling.n() != spins.len() {
        return Err(SimError::Shape(format!(
            "coupling is {0}x{0} but {1} spins were given",
            coupling.n(),
            spins.len()
        )));
    }
    let s: Vec<f64> = spins.0.iter().map(|s| f64::from(s.value())).collect();
    let mut sum = 0.0;
    for (i, si) in s.iter().enumerate() {
        for (kij, sj) in coupling.row(i).iter().zip(&s) {
            sum += kij * si * sj;
        }
    }
    Ok(-0.5 * sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_spin_always_up() {
        for theta in [vec![0.0], vec![5.9, 0.1, 3.0], vec![PI, 0.0, 2.0 * PI - 1e-9]] {
            assert_eq!(infer_spins(&theta).0[0], Spin::Up);
        }
    }

    #[test]
    fn test_threshold_at_pi() {
        let spins = infer_spins(&[0.0, PI - 1e-9, PI, 6.0]);
        assert_eq!(spins.0, vec![Spin::Up, Spin::Up, Spin::Down, Spin::Down]);
    }

    #[test]
    fn test_relative_to_first_oscillator() {
        // 1.0 sits 5.28 rad ahead of 2.0 once wrapped.
        let spins = infer_spins(&[2.0, 1.0, 3.0]);
        assert_eq!(spins.0, vec![Spin::Up, Spin::Down, Spin::Up]);
    }

    #[test]
    fn test_empty_phase_vector() {
        assert!(infer_spins(&[]).is_empty());
    }

    #[test]
    fn test_energy_two_aligned() {
        let k = CouplingMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let spins = SpinAssignment(vec![Spin::Up, Spin::Up]);
        assert_eq!(ising_energy(&k, &spins).unwrap(), -1.0);
    }

    #[test]
    fn test_energy_two_opposed() {
        let k = CouplingMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let spins = SpinAssignment(vec![Spin::Up, Spin::Down]);
        assert_eq!(ising_energy(&k, &spins).unwrap(), 1.0);
    }

    #[test]
    fn test_energy_single_spin_zero() {
        let k = CouplingMatrix::zeros(1);
        assert_eq!(ising_energy(&k, &SpinAssignment(vec![Spin::Up])).unwrap(), 0.0);
    }

    #[test]
    fn test_energy_spin_count_mismatch() {
        let k = CouplingMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        for spins in [vec![Spin::Up], vec![Spin::Up; 3]] {
            let err = ising_energy(&k, &SpinAssignment(spins)).unwrap_err();
            assert!(matches!(err, SimError::Shape(_)), "{err}");
        }
    }

    #[test]
    fn test_display() {
        let spins = SpinAssignment(vec![Spin::Up, Spin::Down, Spin::Up]);
        assert_eq!(spins.to_string(), "[+1 -1 +1]");
        assert_eq!(spins.values(), vec![1, -1, 1]);
    }
}
