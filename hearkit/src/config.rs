use serde::{Deserialize, Serialize};

use crate::HearError;

/// Configures a [`RandomProjectionMelEmbedding`](crate::RandomProjectionMelEmbedding).
///
/// The default is the reference configuration: 44.1 kHz input, 4096-sample
/// frames, 256 mel bands and 4096-dimensional embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Input sample rate in Hz (default: 44100).
    pub sample_rate: u32,
    /// FFT size, which is also the frame length in samples (default: 4096).
    pub n_fft: usize,
    /// Number of mel bands (default: 256).
    pub n_mels: usize,
    /// Output embedding dimension (default: 4096).
    pub embedding_size: usize,
    /// Seed for the projection matrix (default: 0).
    pub seed: u64,
    /// Floor added before the log (default: 1e-4).
    pub epsilon: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            n_fft: 4096,
            n_mels: 256,
            embedding_size: 4096,
            seed: 0,
            epsilon: 1e-4,
        }
    }
}

impl ModelConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_n_fft(mut self, n_fft: usize) -> Self {
        self.n_fft = n_fft;
        self
    }

    pub fn with_n_mels(mut self, n_mels: usize) -> Self {
        self.n_mels = n_mels;
        self
    }

    pub fn with_embedding_size(mut self, embedding_size: usize) -> Self {
        self.embedding_size = embedding_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Number of one-sided FFT bins, `n_fft / 2 + 1`.
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Checks that every size is positive and epsilon is a usable log floor.
    pub fn validate(&self) -> Result<(), HearError> {
        if self.sample_rate == 0 {
            return Err(HearError::InvalidConfig("sample_rate must be positive".into()));
        }
        if self.n_fft == 0 {
            return Err(HearError::InvalidConfig("n_fft must be positive".into()));
        }
        if self.n_mels == 0 {
            return Err(HearError::InvalidConfig("n_mels must be positive".into()));
        }
        if self.embedding_size == 0 {
            return Err(HearError::InvalidConfig(
                "embedding_size must be positive".into(),
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(HearError::InvalidConfig(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}
