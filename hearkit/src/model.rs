use ndarray::{Array2, ArrayView2};

use crate::HearError;

/// Maps fixed-length audio frames to embedding vectors.
///
/// The driver in [`embed_audio`](crate::embed_audio) reads the frame length
/// and sample rate from the model instead of hardcoding them.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use. `embed` takes `&self`
/// and must not mutate model state.
pub trait EmbeddingModel: Send + Sync {
    /// Sample rate in Hz the model expects its input at.
    fn sample_rate(&self) -> u32;

    /// Dimensionality of each embedding vector (e.g., 4096).
    fn embedding_size(&self) -> usize;

    /// Number of samples per input frame.
    fn frame_size(&self) -> usize;

    /// Embeds a `[N][frame_size]` batch of frames into `[N][embedding_size]`.
    fn embed(&self, frames: ArrayView2<'_, f32>) -> Result<Array2<f32>, HearError>;

    /// HEAR `scene_embedding_size` attribute; equals [`embedding_size`](Self::embedding_size).
    fn scene_embedding_size(&self) -> usize {
        self.embedding_size()
    }

    /// HEAR `timestamp_embedding_size` attribute; equals [`embedding_size`](Self::embedding_size).
    fn timestamp_embedding_size(&self) -> usize {
        self.embedding_size()
    }
}

/// Checks that a model declares a usable embedding contract.
///
/// Returns [`HearError::TypeMismatch`] if any declared size is zero.
pub fn validate_model<M: EmbeddingModel + ?Sized>(model: &M) -> Result<(), HearError> {
    if model.sample_rate() == 0 {
        return Err(HearError::TypeMismatch("model declares sample_rate 0".into()));
    }
    if model.frame_size() == 0 {
        return Err(HearError::TypeMismatch("model declares frame_size 0".into()));
    }
    if model.embedding_size() == 0 {
        return Err(HearError::TypeMismatch(
            "model declares embedding_size 0".into(),
        ));
    }
    Ok(())
}
