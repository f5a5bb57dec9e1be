//! `isingsong render` — run once, write the WAV, report spins and energy.

use std::path::Path;

use isingsong_core::{RunReport, Simulation, write_wav};

use super::{SimArgs, fail};

pub fn run(args: &SimArgs, output: &str, report_path: Option<&str>) {
    let config = args
        .resolve()
        .unwrap_or_else(|e| fail("invalid configuration", e));

    println!(
        "Simulating {} oscillators, {:.1}s at {} Hz (seed {})...",
        config.oscillators, config.duration_secs, config.sample_rate, config.seed
    );

    let sim = Simulation::new(config.clone()).unwrap_or_else(|e| fail("setup failed", e));
    let result = sim.render().unwrap_or_else(|e| fail("simulation failed", e));

    let wav_path = Path::new(output);
    write_wav(wav_path, &result.waveform).unwrap_or_else(|e| fail("writing audio", e));

    println!("\nAudio:  {output} ({} samples)", result.waveform.len());
    println!("Final inferred spins: {}", result.spins);
    println!("Computed energy:      {:.6}", result.energy);
    println!("Order parameter R:    {:.4}", result.order_parameter);

    if let Some(path) = report_path {
        let report = RunReport::new(&config, &result, Some(wav_path));
        report
            .write_json(Path::new(path))
            .unwrap_or_else(|e| fail("writing report", e));
        println!("Report: {path}");
    }
}
