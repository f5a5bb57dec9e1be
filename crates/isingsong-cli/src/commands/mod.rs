pub mod params;
pub mod render;

use std::path::Path;

use clap::Args;
use isingsong_core::{SimConfig, SimResult};

/// Simulation parameters shared by every subcommand. Flags override values
/// loaded from `--config`, which in turn override the defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct SimArgs {
    /// JSON config file (missing fields take defaults)
    #[arg(long)]
    pub config: Option<String>,

    /// Number of oscillators
    #[arg(long, short = 'n')]
    pub oscillators: Option<usize>,

    /// Sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Duration in seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Lowest initial frequency in Hz
    #[arg(long)]
    pub freq_min: Option<f64>,

    /// Highest initial frequency in Hz
    #[arg(long)]
    pub freq_max: Option<f64>,

    /// Target spread in octaves above the initial frequency
    #[arg(long)]
    pub octaves: Option<f64>,

    /// Initial noise standard deviation (rad/s), annealed to 0
    #[arg(long)]
    pub noise: Option<f64>,

    /// Envelope gain at the first sample
    #[arg(long)]
    pub envelope_min: Option<f64>,

    /// Envelope gain at the last sample
    #[arg(long)]
    pub envelope_max: Option<f64>,

    /// Smallest coupling magnitude
    #[arg(long)]
    pub coupling_min: Option<f64>,

    /// Largest coupling magnitude
    #[arg(long)]
    pub coupling_max: Option<f64>,

    /// Random seed
    #[arg(long, short)]
    pub seed: Option<u64>,
}

impl SimArgs {
    /// Resolve defaults ← config file ← flags, then validate.
    pub fn resolve(&self) -> SimResult<SimConfig> {
        let mut cfg = match &self.config {
            Some(path) => SimConfig::load(Path::new(path))?,
            None => SimConfig::default(),
        };
        macro_rules! apply {
            ($($flag:ident => $field:ident),* $(,)?) => {
                $(if let Some(v) = self.$flag { cfg.$field = v; })*
            };
        }
        apply!(
            oscillators => oscillators,
            sample_rate => sample_rate,
            duration => duration_secs,
            freq_min => freq_min_hz,
            freq_max => freq_max_hz,
            octaves => octave_spread,
            noise => noise_max,
            envelope_min => envelope_min,
            envelope_max => envelope_max,
            coupling_min => coupling_min,
            coupling_max => coupling_max,
            seed => seed,
        );
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Print `context: err` and exit non-zero.
pub fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {context}: {err}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let cfg = SimArgs::default().resolve().unwrap();
        assert_eq!(cfg, SimConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = SimArgs {
            oscillators: Some(4),
            duration: Some(2.0),
            noise: Some(0.0),
            seed: Some(99),
            ..Default::default()
        };
        let cfg = args.resolve().unwrap();
        assert_eq!(cfg.oscillators, 4);
        assert_eq!(cfg.duration_secs, 2.0);
        assert_eq!(cfg.noise_max, 0.0);
        assert_eq!(cfg.seed, 99);
        assert_eq!(cfg.sample_rate, 44_100);
    }

    #[test]
    fn test_flags_override_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg.json");
        std::fs::write(&path, r#"{"oscillators": 8, "seed": 1}"#).unwrap();

        let args = SimArgs {
            config: Some(path.display().to_string()),
            seed: Some(2),
            ..Default::default()
        };
        let cfg = args.resolve().unwrap();
        assert_eq!(cfg.oscillators, 8);
        assert_eq!(cfg.seed, 2);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = SimArgs {
            freq_min: Some(500.0),
            freq_max: Some(100.0),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
