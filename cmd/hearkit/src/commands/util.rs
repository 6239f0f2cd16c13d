//! Utility functions for CLI commands.

use std::path::Path;

use anyhow::{bail, Context as _};
use hearkit::ModelConfig;

use crate::Cli;

/// Loads the model configuration, falling back to the reference model.
pub fn get_model_config(cli: &Cli) -> anyhow::Result<ModelConfig> {
    match cli.config.as_deref() {
        Some(path) => load_model_config(path),
        None => Ok(ModelConfig::default()),
    }
}

/// Loads a model configuration from a YAML or JSON file.
pub fn load_model_config(path: &str) -> anyhow::Result<ModelConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");

    let cfg: ModelConfig = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content).with_context(|| format!("parse {path}"))?,
        _ => serde_yaml::from_str(&content).with_context(|| format!("parse {path}"))?,
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Reads a WAV file as mono f32 samples in [-1, 1].
///
/// Multi-channel files are averaged down to one channel.
pub fn read_wav_mono(path: &str) -> anyhow::Result<(Vec<f32>, u32)> {
    let reader = hound::WavReader::open(path).with_context(|| format!("open {path}"))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = int_full_scale(spec.bits_per_sample)
                .with_context(|| format!("decode {path}"))?;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<_, _>>()
                .with_context(|| format!("decode {path}"))?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("decode {path}"))?,
    };

    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };
    Ok((mono, spec.sample_rate))
}

/// Magnitude of full scale for signed integer samples of `bits` width.
fn int_full_scale(bits: u16) -> anyhow::Result<f32> {
    let Some(shift) = bits.checked_sub(1).filter(|&s| s < 32) else {
        bail!("unsupported integer sample width {bits} bits");
    };
    Ok((1i64 << shift) as f32)
}

/// Outputs result as pretty JSON.
pub fn output_json<T: serde::Serialize>(result: &T, output_path: Option<&str>) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(result)?;
    match output_path {
        Some(path) => std::fs::write(path, output).with_context(|| format!("write {path}"))?,
        None => println!("{}", output),
    }
    Ok(())
}
