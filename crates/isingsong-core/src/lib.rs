//! # isingsong-core
//!
//! **Listen to a noisy oscillator network settle, then read a spin state off it.**
//!
//! N phase oscillators glide from their initial frequencies toward targets up
//! to a few octaves higher while a symmetric coupling matrix pulls them
//! together or apart and annealed Gaussian noise fades out. The sum of their
//! sines, under a rising envelope, is the audio. The final phases, thresholded
//! against oscillator 0, give ±1 spins whose pairwise energy uses the same
//! coupling matrix.
//!
//! ## Quick Start
//!
//! ```no_run
//! use isingsong_core::{SimConfig, Simulation, write_wav};
//!
//! let config = SimConfig { seed: 7, ..Default::default() };
//! let output = Simulation::new(config)?.render()?;
//! write_wav(std::path::Path::new("ising.wav"), &output.waveform)?;
//! println!("spins {} energy {}", output.spins, output.energy);
//! # Ok::<(), isingsong_core::SimError>(())
//! ```
//!
//! ## Architecture
//!
//! Seeded draw → Integrator (Euler–Maruyama, one step at a time) →
//! {Synthesizer → waveform; final phases → spins → energy}

pub mod analysis;
pub mod config;
pub mod error;
pub mod integrator;
pub mod params;
pub mod report;
pub mod schedule;
pub mod simulation;
pub mod spin;
pub mod synth;
pub mod wav;

pub use analysis::{
    SpectralResult, WaveformAnalysis, WaveformStats, analyze_waveform, order_parameter,
    spectral_analysis, waveform_stats,
};
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use integrator::{Integrator, PhaseState, PhaseTrajectory, Scratch, wrap_phase};
pub use params::{CouplingMatrix, Ensemble, Parameters, draw_parameters};
pub use report::RunReport;
pub use schedule::{AmplitudeEnvelope, FrequencySchedule, NoiseSchedule, TimeGrid};
pub use simulation::{RenderOutput, Simulation};
pub use spin::{Spin, SpinAssignment, infer_spins, ising_energy};
pub use synth::{SignalSynthesizer, Waveform, normalize, synthesize};
pub use wav::{encode_pcm16, write_wav};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
