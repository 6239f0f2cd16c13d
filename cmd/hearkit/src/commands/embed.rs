//! Embedding command.

use anyhow::{bail, Context as _};
use clap::Args;
use hearkit::{
    embed_audio, load_model_with_config, EmbeddingModel, ModelConfig, DEFAULT_BATCH_SIZE,
};
use ndarray::Array2;
use serde::Serialize;

use super::{get_model_config, output_json, read_wav_mono};
use crate::Cli;

/// Embed WAV files into one vector per frame.
#[derive(Args)]
pub struct EmbedCommand {
    /// Input WAV file; repeat for a batch (all files must have the same length)
    #[arg(short = 'i', long = "input", required = true)]
    inputs: Vec<String>,

    /// Seconds between frame centers
    #[arg(long, default_value_t = 0.25)]
    hop: f64,

    /// Frames per model call
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Model checkpoint (weight loading is not supported yet)
    #[arg(long, default_value = "")]
    checkpoint: String,

    /// Inference device
    #[arg(long, default_value = "cpu")]
    device: String,
}

/// JSON document written by `hearkit embed`.
#[derive(Debug, Serialize)]
struct EmbeddingOutput {
    inputs: Vec<String>,
    sample_rate: u32,
    hop_size: f64,
    embedding_size: usize,
    timestamps: Vec<f64>,
    /// `[recording][frame][embedding_size]`
    embeddings: Vec<Vec<Vec<f32>>>,
}

impl EmbedCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let result = self.embed(get_model_config(cli)?)?;
        output_json(&result, cli.output.as_deref())
    }

    fn embed(&self, config: ModelConfig) -> anyhow::Result<EmbeddingOutput> {
        let model = load_model_with_config(&self.checkpoint, &self.device, config)?;

        let audio = self.load_batch(model.sample_rate())?;
        let (embeddings, timestamps) =
            embed_audio(audio.view().into_dyn(), &model, self.hop, self.batch_size)
                .context("embed audio")?;

        tracing::info!(
            recordings = embeddings.dim().0,
            frames = embeddings.dim().1,
            "embedding done"
        );

        Ok(EmbeddingOutput {
            inputs: self.inputs.clone(),
            sample_rate: model.sample_rate(),
            hop_size: self.hop,
            embedding_size: model.embedding_size(),
            timestamps: timestamps.to_vec(),
            embeddings: embeddings
                .outer_iter()
                .map(|rec| rec.outer_iter().map(|frame| frame.to_vec()).collect())
                .collect(),
        })
    }

    /// Reads every input into a `[recordings][samples]` batch.
    fn load_batch(&self, sample_rate: u32) -> anyhow::Result<Array2<f32>> {
        let mut recordings = Vec::with_capacity(self.inputs.len());
        for path in &self.inputs {
            let (samples, sr) = read_wav_mono(path)?;
            if sr != sample_rate {
                bail!("{path}: sample rate {sr} Hz, model expects {sample_rate} Hz");
            }
            tracing::debug!(path = %path, samples = samples.len(), "read input");
            recordings.push(samples);
        }

        let n_samples = recordings.first().map_or(0, Vec::len);
        if let Some((path, rec)) = self
            .inputs
            .iter()
            .zip(&recordings)
            .find(|(_, rec)| rec.len() != n_samples)
        {
            bail!(
                "{path}: {} samples, but {} has {n_samples}; all inputs must have the same length",
                rec.len(),
                self.inputs[0]
            );
        }

        let flat: Vec<f32> = recordings.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((self.inputs.len(), n_samples), flat)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_wav(path: &Path, sample_rate: u32, n_samples: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..n_samples {
            writer.write_sample(((i % 200) as i16 - 100) * 64).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn command(inputs: &[&Path]) -> EmbedCommand {
        EmbedCommand {
            inputs: inputs.iter().map(|p| p.to_str().unwrap().to_string()).collect(),
            hop: 0.25,
            batch_size: 2,
            checkpoint: String::new(),
            device: "cpu".into(),
        }
    }

    fn small_config() -> ModelConfig {
        ModelConfig::default()
            .with_sample_rate(16000)
            .with_n_fft(512)
            .with_n_mels(40)
            .with_embedding_size(8)
    }

    #[test]
    fn load_batch_stacks_equal_length_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_wav(&a, 44100, 1000);
        write_wav(&b, 44100, 1000);

        let batch = command(&[&a, &b]).load_batch(44100).unwrap();
        assert_eq!(batch.dim(), (2, 1000));
    }

    #[test]
    fn load_batch_rejects_different_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_wav(&a, 44100, 1000);
        write_wav(&b, 44100, 999);

        let err = command(&[&a, &b]).load_batch(44100).unwrap_err();
        assert!(err.to_string().contains("same length"), "{err}");
    }

    #[test]
    fn load_batch_rejects_other_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        write_wav(&a, 16000, 1000);

        let err = command(&[&a]).load_batch(ModelConfig::default().sample_rate).unwrap_err();
        assert!(err.to_string().contains("16000 Hz"), "{err}");
    }

    #[test]
    fn output_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        // 0.5 s at 16 kHz: frames centered at 0, 0.25 and 0.5 s.
        write_wav(&a, 16000, 8000);
        write_wav(&b, 16000, 8000);

        let result = command(&[&a, &b]).embed(small_config()).unwrap();
        let got = serde_json::to_value(&result).unwrap();

        assert_eq!(got["timestamps"], serde_json::json!([0.0, 0.25, 0.5]));
        assert_eq!(got["sample_rate"], 16000);
        assert_eq!(got["embedding_size"], 8);
        let embeddings = got["embeddings"].as_array().unwrap();
        assert_eq!(embeddings.len(), 2);
        for rec in embeddings {
            let frames = rec.as_array().unwrap();
            assert_eq!(frames.len(), 3);
            assert!(frames.iter().all(|f| f.as_array().unwrap().len() == 8));
        }
    }
}
