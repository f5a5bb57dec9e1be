//! One batch run: seeded draw → integration → waveform, spins and energy.
//!
//! A [`Simulation`] owns the run's only random source. Parameters are drawn
//! from it first, then one noise batch per step, so identical seeds and
//! configs give bit-identical output.

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::analysis::order_parameter;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::integrator::{Integrator, PhaseTrajectory};
use crate::params::{CouplingMatrix, Ensemble, Parameters, draw_parameters};
use crate::schedule::AmplitudeEnvelope;
use crate::spin::{SpinAssignment, infer_spins, ising_energy};
use crate::synth::{SignalSynthesizer, Waveform, synthesize};

/// Outputs of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub waveform: Waveform,
    pub final_phases: Vec<f64>,
    pub spins: SpinAssignment,
    pub energy: f64,
    /// Kuramoto R of the final phases.
    pub order_parameter: f64,
}

/// A configured, not-yet-run simulation.
pub struct Simulation {
    config: SimConfig,
    params: Parameters,
    integrator: Integrator,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Validate `config`, seed the random source and draw all parameters.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let params = draw_parameters(&config, &mut rng)?;
        Self::assemble(config, params, rng)
    }

    /// Run with a caller-supplied ensemble and coupling matrix. The seed then
    /// drives only the per-step noise.
    pub fn from_parts(
        config: SimConfig,
        ensemble: Ensemble,
        coupling: CouplingMatrix,
    ) -> SimResult<Self> {
        config.validate()?;
        if ensemble.len() != config.oscillators || coupling.n() != config.oscillators {
            return Err(SimError::Shape(format!(
                "config has {} oscillators, ensemble {}, coupling {}x{}",
                config.oscillators,
                ensemble.len(),
                coupling.n(),
                coupling.n()
            )));
        }
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::assemble(config, Parameters { ensemble, coupling }, rng)
    }

    fn assemble(config: SimConfig, params: Parameters, rng: ChaCha8Rng) -> SimResult<Self> {
        let integrator = Integrator::from_parameters(&config, &params)?;
        Ok(Self {
            config,
            params,
            integrator,
            rng,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Integrate and keep the full phase trajectory.
    pub fn trajectory(mut self) -> SimResult<PhaseTrajectory> {
        self.log_start();
        let initial = self.params.ensemble.phases.clone();
        self.integrator.trajectory(&initial, &mut self.rng)
    }

    /// Integrate while synthesizing on the fly; only the current phase vector
    /// is kept in memory.
    pub fn render(mut self) -> SimResult<RenderOutput> {
        self.log_start();
        let started = Instant::now();
        let mut synth = SignalSynthesizer::new(AmplitudeEnvelope::from_config(&self.config));
        let initial = self.params.ensemble.phases.clone();
        let final_phases = self.integrator.run(&initial, &mut self.rng, |k, theta| {
            synth.push(k, theta);
            Ok(())
        })?;
        let waveform = synth.finish(self.config.sample_rate)?;
        let output = self.finish(waveform, final_phases)?;
        log::info!(
            "rendered in {:.2}s: energy {:.4}, R = {:.3}",
            started.elapsed().as_secs_f64(),
            output.energy,
            output.order_parameter
        );
        Ok(output)
    }

    /// Integrate, keep the trajectory, and derive the outputs from it.
    pub fn render_full(mut self) -> SimResult<(RenderOutput, PhaseTrajectory)> {
        self.log_start();
        let initial = self.params.ensemble.phases.clone();
        let trajectory = self.integrator.trajectory(&initial, &mut self.rng)?;
        let waveform = synthesize(
            &trajectory,
            AmplitudeEnvelope::from_config(&self.config),
            self.config.sample_rate,
        )?;
        let final_phases = trajectory.last().map(<[f64]>::to_vec).unwrap_or_default();
        Ok((self.finish(waveform, final_phases)?, trajectory))
    }

    fn finish(&self, waveform: Waveform, final_phases: Vec<f64>) -> SimResult<RenderOutput> {
        let spins = infer_spins(&final_phases);
        let energy = ising_energy(&self.params.coupling, &spins)?;
        Ok(RenderOutput {
            waveform,
            order_parameter: order_parameter(&final_phases),
            final_phases,
            spins,
            energy,
        })
    }

    fn log_start(&self) {
        log::info!(
            "simulating {} oscillators for {}s at {} Hz ({} steps, seed {})",
            self.config.oscillators,
            self.config.duration_secs,
            self.config.sample_rate,
            self.config.num_steps(),
            self.config.seed
        );
    }
}
