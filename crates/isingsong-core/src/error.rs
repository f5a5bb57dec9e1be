//! Error hierarchy for simulation, synthesis and persistence.

use thiserror::Error;

/// Root error type for every fallible isingsong operation.
#[derive(Error, Debug)]
pub enum SimError {
    /// Invalid configuration, rejected before any random draw.
    #[error("config error: {0}")]
    Config(String),

    /// Non-finite phase produced by the integrator.
    #[error("numerical instability at step {step}, oscillator {oscillator}: theta = {value}")]
    Numerical {
        step: usize,
        oscillator: usize,
        value: f64,
    },

    /// Non-finite sample produced by the synthesizer before normalization.
    #[error("numerical instability in waveform at sample {sample}: {value}")]
    NonFiniteSample { sample: usize, value: f64 },

    /// Caller-supplied vectors or matrices of the wrong shape, or a coupling
    /// matrix that is not symmetric with a zero diagonal.
    #[error("shape error: {0}")]
    Shape(String),

    /// WAV or report persistence failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
