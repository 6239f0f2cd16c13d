//! [`EmbeddingModel`] built from a log mel spectrum and a fixed random projection.

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayView2};
use rand::distributions::{Distribution, Standard};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::config::ModelConfig;
use crate::error::HearError;
use crate::mel::{hann_window, mel_filter_bank};
use crate::model::EmbeddingModel;

/// Untrained audio embedding: log mel spectrum followed by a random projection.
///
/// # Pipeline
///
/// 1. Frame * periodic Hann window
/// 2. One-sided FFT -> power spectrum `|X[k]|^2`
/// 3. Power spectrum x mel filterbank^T -> `[N][n_mels]`
/// 4. `ln(x + epsilon)`
/// 5. x projection `[n_mels][embedding_size]`
///
/// # Thread Safety
///
/// All buffers are fixed at construction. `embed` only reads them and
/// allocates its FFT scratch per call, so one instance can be shared across
/// threads.
pub struct RandomProjectionMelEmbedding {
    config: ModelConfig,
    window: Vec<f32>,
    mel_scale: Array2<f32>,
    projection: Array2<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl RandomProjectionMelEmbedding {
    /// Creates a model whose projection is drawn from PCG32 seeded with `config.seed`.
    pub fn new(config: ModelConfig) -> Result<Self, HearError> {
        let mut rng = Pcg32::seed_from_u64(config.seed);
        Self::with_rng(config, &mut rng)
    }

    /// Creates a model drawing projection weights from `rng`.
    ///
    /// Each weight is a uniform `[0, 1)` sample divided by `sqrt(n_mels)`,
    /// filled row by row.
    pub fn with_rng<R: Rng + ?Sized>(config: ModelConfig, rng: &mut R) -> Result<Self, HearError> {
        config.validate()?;
        let mel_scale = mel_filter_bank(config.sample_rate, config.n_fft, config.n_mels);
        let projection = random_projection(config.n_mels, config.embedding_size, rng);
        Self::from_parts(config, mel_scale, projection)
    }

    /// Creates a model from a precomputed filterbank and projection.
    ///
    /// `mel_scale` must be `[n_mels][n_fft / 2 + 1]` and `projection` must be
    /// `[n_mels][embedding_size]`.
    pub fn from_parts(
        config: ModelConfig,
        mel_scale: Array2<f32>,
        projection: Array2<f32>,
    ) -> Result<Self, HearError> {
        config.validate()?;
        let want_mel = (config.n_mels, config.num_bins());
        if mel_scale.dim() != want_mel {
            return Err(HearError::InvalidConfig(format!(
                "mel filterbank shape {:?}, expected {want_mel:?}",
                mel_scale.dim()
            )));
        }
        let want_proj = (config.n_mels, config.embedding_size);
        if projection.dim() != want_proj {
            return Err(HearError::InvalidConfig(format!(
                "projection shape {:?}, expected {want_proj:?}",
                projection.dim()
            )));
        }

        let window = hann_window(config.n_fft);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(config.n_fft);

        Ok(Self {
            config,
            window,
            mel_scale,
            projection,
            fft,
        })
    }

    /// The configuration the model was built from.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The periodic Hann window of length `n_fft`.
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// The `[n_mels][n_fft / 2 + 1]` mel filterbank.
    pub fn mel_scale(&self) -> &Array2<f32> {
        &self.mel_scale
    }

    /// The `[n_mels][embedding_size]` projection matrix.
    pub fn projection(&self) -> &Array2<f32> {
        &self.projection
    }

    /// Windowed power spectrum of every frame, `[N][n_fft / 2 + 1]`.
    fn power_spectrum(&self, frames: ArrayView2<'_, f32>) -> Array2<f32> {
        let n_fft = self.config.n_fft;
        let mut power = Array2::<f32>::zeros((frames.nrows(), self.config.num_bins()));
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for (frame, mut out) in frames.rows().into_iter().zip(power.rows_mut()) {
            for ((b, &x), &w) in buffer.iter_mut().zip(frame.iter()).zip(self.window.iter()) {
                *b = Complex::new(x * w, 0.0);
            }
            self.fft.process_with_scratch(&mut buffer, &mut scratch);
            for (p, c) in out.iter_mut().zip(buffer.iter()) {
                *p = c.norm_sqr();
            }
        }
        power
    }
}

impl fmt::Debug for RandomProjectionMelEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomProjectionMelEmbedding")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EmbeddingModel for RandomProjectionMelEmbedding {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn embedding_size(&self) -> usize {
        self.config.embedding_size
    }

    fn frame_size(&self) -> usize {
        self.config.n_fft
    }

    fn embed(&self, frames: ArrayView2<'_, f32>) -> Result<Array2<f32>, HearError> {
        if frames.ncols() != self.config.n_fft {
            return Err(HearError::InvalidInput(format!(
                "frames have {} samples, model expects {}",
                frames.ncols(),
                self.config.n_fft
            )));
        }

        let power = self.power_spectrum(frames);
        let mut mel = power.dot(&self.mel_scale.t());
        let eps = self.config.epsilon;
        mel.mapv_inplace(|v| (v + eps).ln());
        Ok(mel.dot(&self.projection))
    }
}

fn random_projection<R: Rng + ?Sized>(n_mels: usize, embedding_size: usize, rng: &mut R) -> Array2<f32> {
    let normalization = (n_mels as f64).sqrt() as f32;
    Array2::from_shape_simple_fn((n_mels, embedding_size), || {
        let v: f32 = Standard.sample(&mut *rng);
        v / normalization
    })
}
