//! Diagnostics for a finished run: phase coherence and waveform statistics.
//!
//! Nothing here feeds back into the simulation; the results go into the run
//! report and the CLI summary.

use rustfft::{FftPlanner, num_complex::Complex};
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::synth::Waveform;

/// Number of spectral peaks kept in a [`SpectralResult`].
const TOP_PEAKS: usize = 5;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Single spectral bin.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralBin {
    pub frequency_hz: f64,
    pub power: f64,
}

/// FFT-based spectral summary of a waveform.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralResult {
    /// Strongest bins, descending by power (DC excluded).
    pub peaks: Vec<SpectralBin>,
    /// Wiener entropy: 1.0 = white noise, 0.0 = pure tone.
    pub flatness: f64,
    pub dominant_frequency_hz: f64,
    pub total_power: f64,
}

/// Amplitude statistics of a waveform.
#[derive(Debug, Clone, Serialize)]
pub struct WaveformStats {
    pub samples: usize,
    pub duration_secs: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub rms: f64,
    pub peak: f64,
}

/// Everything reported about a rendered waveform.
#[derive(Debug, Clone, Serialize)]
pub struct WaveformAnalysis {
    pub stats: WaveformStats,
    pub spectral: SpectralResult,
}

// ---------------------------------------------------------------------------
// Analysis functions
// ---------------------------------------------------------------------------

/// Kuramoto order parameter R = |⟨e^{iθ}⟩| ∈ [0, 1].
pub fn order_parameter(theta: &[f64]) -> f64 {
    if theta.is_empty() {
        return 0.0;
    }
    let n = theta.len() as f64;
    let (s, c) = theta
        .iter()
        .fold((0.0, 0.0), |(s, c), th| (s + th.sin(), c + th.cos()));
    ((s / n).powi(2) + (c / n).powi(2)).sqrt().clamp(0.0, 1.0)
}

/// Mean, spread, RMS and peak amplitude.
pub fn waveform_stats(waveform: &Waveform) -> WaveformStats {
    let x = &waveform.samples;
    let (mean, std_dev) = match x.len() {
        0 => (0.0, 0.0),
        1 => (x[0], 0.0),
        _ => (x.iter().mean(), x.iter().std_dev()),
    };
    let rms = if x.is_empty() {
        0.0
    } else {
        (x.iter().map(|s| s * s).sum::<f64>() / x.len() as f64).sqrt()
    };
    WaveformStats {
        samples: x.len(),
        duration_secs: waveform.duration_secs(),
        mean,
        std_dev,
        rms,
        peak: waveform.peak(),
    }
}

/// Power spectrum of the whole waveform via FFT.
pub fn spectral_analysis(waveform: &Waveform) -> SpectralResult {
    let n = waveform.samples.len();
    if n < 2 {
        return SpectralResult {
            peaks: Vec::new(),
            flatness: 0.0,
            dominant_frequency_hz: 0.0,
            total_power: 0.0,
        };
    }

    let mut buffer: Vec<Complex<f64>> = waveform
        .samples
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    // Positive frequencies, DC excluded.
    let n_freq = n / 2;
    let power_spectrum: Vec<f64> = buffer[1..=n_freq]
        .iter()
        .map(|c| c.norm_sqr() / n as f64)
        .collect();
    let total_power: f64 = power_spectrum.iter().sum();

    let arith_mean = total_power / n_freq as f64;
    let log_sum: f64 = power_spectrum
        .iter()
        .map(|&p| if p > 1e-20 { p.ln() } else { -46.0 })
        .sum();
    let geo_mean = (log_sum / n_freq as f64).exp();
    let flatness = if arith_mean > 1e-20 {
        (geo_mean / arith_mean).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let bin_hz = f64::from(waveform.sample_rate) / n as f64;
    let mut indexed: Vec<(usize, f64)> = power_spectrum.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let peaks: Vec<SpectralBin> = indexed
        .iter()
        .take(TOP_PEAKS)
        .map(|&(i, p)| SpectralBin {
            frequency_hz: (i + 1) as f64 * bin_hz,
            power: p,
        })
        .collect();
    let dominant_frequency_hz = peaks.first().map(|p| p.frequency_hz).unwrap_or(0.0);

    SpectralResult {
        peaks,
        flatness,
        dominant_frequency_hz,
        total_power,
    }
}

pub fn analyze_waveform(waveform: &Waveform) -> WaveformAnalysis {
    WaveformAnalysis {
        stats: waveform_stats(waveform),
        spectral: spectral_analysis(waveform),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{PI, TAU};

    fn tone(freq: f64, rate: u32, n: usize) -> Waveform {
        Waveform {
            samples: (0..n)
                .map(|k| (TAU * freq * k as f64 / f64::from(rate)).sin())
                .collect(),
            sample_rate: rate,
        }
    }

    #[test]
    fn test_order_parameter_synchronised() {
        assert!((order_parameter(&[0.5; 8]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_order_parameter_antiphase() {
        assert!(order_parameter(&[0.0, PI]) < 1e-12);
        assert_eq!(order_parameter(&[]), 0.0);
    }

    #[test]
    fn test_dominant_frequency_of_tone() {
        let w = tone(440.0, 8000, 8000);
        let spec = spectral_analysis(&w);
        assert!((spec.dominant_frequency_hz - 440.0).abs() < 1.0, "{}", spec.dominant_frequency_hz);
        assert!(spec.flatness < 0.1, "pure tone flatness {}", spec.flatness);
    }

    #[test]
    fn test_stats_of_tone() {
        let stats = waveform_stats(&tone(100.0, 8000, 8000));
        assert!(stats.mean.abs() < 1e-9);
        assert!((stats.rms - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        assert!((stats.peak - 1.0).abs() < 1e-6);
        assert_eq!(stats.duration_secs, 1.0);
    }

    #[test]
    fn test_short_waveforms() {
        let w = Waveform {
            samples: vec![0.25],
            sample_rate: 10,
        };
        let a = analyze_waveform(&w);
        assert_eq!(a.stats.std_dev, 0.0);
        assert!(a.spectral.peaks.is_empty());
    }
}
