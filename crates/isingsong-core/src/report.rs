//! Machine-readable summary of a run, written next to the audio file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::analysis::{WaveformAnalysis, analyze_waveform};
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::simulation::RenderOutput;

/// Report format version.
pub const REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: u32,
    pub isingsong_version: String,
    pub config: SimConfig,
    pub steps: usize,
    pub spins: Vec<i8>,
    pub energy: f64,
    pub order_parameter: f64,
    pub final_phases: Vec<f64>,
    pub waveform: WaveformAnalysis,
    pub audio_path: Option<String>,
}

impl RunReport {
    pub fn new(config: &SimConfig, output: &RenderOutput, audio_path: Option<&Path>) -> Self {
        Self {
            version: REPORT_VERSION,
            isingsong_version: crate::VERSION.to_string(),
            config: config.clone(),
            steps: output.waveform.len(),
            spins: output.spins.values(),
            energy: output.energy,
            order_parameter: output.order_parameter,
            final_phases: output.final_phases.clone(),
            waveform: analyze_waveform(&output.waveform),
            audio_path: audio_path.map(|p| p.display().to_string()),
        }
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> SimResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Simulation;

    #[test]
    fn test_report_round_trips_through_json() {
        let cfg = SimConfig {
            oscillators: 3,
            sample_rate: 1000,
            duration_secs: 0.1,
            seed: 5,
            ..Default::default()
        };
        let out = Simulation::new(cfg.clone()).unwrap().render().unwrap();
        let report = RunReport::new(&cfg, &out, Some(Path::new("out.wav")));

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.json");
        report.write_json(&path).unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["version"], 1);
        assert_eq!(v["steps"], 100);
        assert_eq!(v["spins"].as_array().unwrap().len(), 3);
        assert_eq!(v["spins"][0], 1);
        assert_eq!(v["config"]["seed"], 5);
        assert_eq!(v["audio_path"], "out.wav");
        assert_eq!(v["energy"].as_f64().unwrap(), out.energy);
    }
}
