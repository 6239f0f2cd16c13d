use std::fmt;
use std::str::FromStr;

use crate::config::ModelConfig;
use crate::error::HearError;
use crate::random_projection::RandomProjectionMelEmbedding;

/// Where inference runs. Only the CPU is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

impl FromStr for Device {
    type Err = HearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            _ => Err(HearError::UnsupportedDevice(s.to_string())),
        }
    }
}

/// Loads the reference model.
///
/// An empty `checkpoint_path` builds a fresh model with seeded random
/// projection weights. Loading weights from a checkpoint is not supported
/// and fails with [`HearError::NotImplemented`].
pub fn load_model(checkpoint_path: &str, device: &str) -> Result<RandomProjectionMelEmbedding, HearError> {
    load_model_with_config(checkpoint_path, device, ModelConfig::default())
}

/// Like [`load_model`], with a caller-supplied configuration.
pub fn load_model_with_config(
    checkpoint_path: &str,
    device: &str,
    config: ModelConfig,
) -> Result<RandomProjectionMelEmbedding, HearError> {
    let device: Device = device.parse()?;
    if !checkpoint_path.is_empty() {
        return Err(HearError::NotImplemented(format!(
            "loading model weights from {checkpoint_path}"
        )));
    }

    let model = RandomProjectionMelEmbedding::new(config)?;
    tracing::info!(
        %device,
        sample_rate = model.config().sample_rate,
        n_fft = model.config().n_fft,
        n_mels = model.config().n_mels,
        embedding_size = model.config().embedding_size,
        seed = model.config().seed,
        "built random projection model"
    );
    Ok(model)
}
