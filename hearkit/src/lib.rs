//! Framed audio embeddings from log mel spectra and a seeded random projection.
//!
//! # Architecture
//!
//! The pipeline processes a batch of equal-length recordings in three stages:
//!
//! 1. [`frame_audio`]: `(recordings, samples)` -> centered frames every
//!    `hop_size` seconds, plus one timestamp per frame
//! 2. [`EmbeddingModel::embed`]: `(frames, frame_size)` -> `(frames, embedding_size)`
//! 3. [`embed_audio`]: flattens all frames, runs them through the model in
//!    sub-batches and reshapes to `(recordings, frames, embedding_size)`
//!
//! # Spectral Embedding
//!
//! [`RandomProjectionMelEmbedding`] is a fixed, untrained model:
//! - Periodic Hann window
//! - One-sided FFT and power spectrum
//! - Slaney mel filterbank (librosa defaults)
//! - `ln(x + epsilon)` compression
//! - Projection by a uniform random matrix scaled by `1/sqrt(n_mels)`
//!
//! ```no_run
//! use hearkit::{get_audio_embedding, load_model};
//! use ndarray::Array2;
//!
//! let model = load_model("", "cpu")?;
//! let audio = Array2::<f32>::zeros((2, 44100));
//! let (embeddings, timestamps) = get_audio_embedding(audio.view().into_dyn(), &model, 0.25, None)?;
//! assert_eq!(embeddings.dim(), (2, timestamps.len(), 4096));
//! # Ok::<(), hearkit::HearError>(())
//! ```

mod config;
mod embedding;
mod error;
pub mod frame;
mod loader;
pub mod mel;
mod model;
mod random_projection;

pub use config::ModelConfig;
pub use embedding::{embed_audio, get_audio_embedding, DEFAULT_BATCH_SIZE};
pub use error::HearError;
pub use frame::{frame_audio, frame_audio_dyn};
pub use loader::{load_model, load_model_with_config, Device};
pub use model::{validate_model, EmbeddingModel};
pub use random_projection::RandomProjectionMelEmbedding;
