//! Window and mel filterbank generation.
//!
//! The filterbank follows librosa's defaults: Slaney mel scale, Slaney area
//! normalization, `fmin = 0` and `fmax = sample_rate / 2`. Everything is
//! computed in f64 and stored as f32 so two builds of the same config produce
//! identical buffers.

use std::f64::consts::PI;

use ndarray::Array2;

/// Slaney scale: 200/3 Hz per mel below 1 kHz.
const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Periodic Hann window, `0.5 - 0.5 * cos(2 * pi * i / n)`.
pub fn hann_window(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos()) as f32)
        .collect()
}

/// Converts frequency in Hz to the Slaney mel scale.
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Converts a Slaney mel value back to Hz.
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// `num` evenly spaced values over `[start, stop]`, with `stop` exact.
fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut out: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            out[num - 1] = stop;
            out
        }
    }
}

/// Center frequencies of the one-sided FFT bins.
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    linspace(0.0, sample_rate as f64 / 2.0, n_fft / 2 + 1)
}

/// `num` frequencies equally spaced on the mel axis between `fmin` and `fmax`.
pub fn mel_frequencies(num: usize, fmin: f64, fmax: f64) -> Vec<f64> {
    linspace(hz_to_mel(fmin), hz_to_mel(fmax), num)
        .into_iter()
        .map(mel_to_hz)
        .collect()
}

/// Creates the mel filterbank matrix.
///
/// Returns `[n_mels][n_fft / 2 + 1]`. Each row is a triangular filter whose
/// edges are neighbouring mel frequencies, scaled to unit area.
pub fn mel_filter_bank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f32> {
    let fft_freqs = fft_frequencies(sample_rate, n_fft);
    let mel_f = mel_frequencies(n_mels + 2, 0.0, sample_rate as f64 / 2.0);
    let fdiff: Vec<f64> = mel_f.windows(2).map(|w| w[1] - w[0]).collect();

    let mut weights = Array2::<f32>::zeros((n_mels, fft_freqs.len()));
    for (i, mut row) in weights.rows_mut().into_iter().enumerate() {
        let enorm = 2.0 / (mel_f[i + 2] - mel_f[i]);
        for (w, &f) in row.iter_mut().zip(fft_freqs.iter()) {
            let lower = (f - mel_f[i]) / fdiff[i];
            let upper = (mel_f[i + 2] - f) / fdiff[i + 1];
            // Weights are stored as f32 before normalization.
            let tri = lower.min(upper).max(0.0) as f32;
            *w = (tri as f64 * enorm) as f32;
        }
        if row.iter().all(|&w| w == 0.0) {
            tracing::warn!(
                band = i,
                n_fft,
                n_mels,
                "empty mel filter, n_mels may be too high for n_fft"
            );
        }
    }
    weights
}
