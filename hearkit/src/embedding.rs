//! Batched embedding of whole recordings.

use ndarray::{Array1, Array2, Array3, ArrayViewD, Axis};

use crate::error::HearError;
use crate::frame::{as_recordings, frame_audio};
use crate::model::{validate_model, EmbeddingModel};

/// Sub-batch size used by [`get_audio_embedding`] when none is given.
pub const DEFAULT_BATCH_SIZE: usize = 512;

/// Embeds every frame of every recording.
///
/// `audio` must be `[recordings][samples]`. Frames are taken every `hop_size`
/// seconds at the model's sample rate and frame size, flattened
/// recording-major, and fed to the model in consecutive sub-batches of at
/// most `batch_size` frames. `batch_size` only bounds memory per step; it
/// never changes the result.
///
/// Returns `[recordings][frames][embedding_size]` and the frame timestamps in
/// seconds.
pub fn embed_audio<M: EmbeddingModel + ?Sized>(
    audio: ArrayViewD<'_, f32>,
    model: &M,
    hop_size: f64,
    batch_size: usize,
) -> Result<(Array3<f32>, Array1<f64>), HearError> {
    let audio = as_recordings(audio)?;
    validate_model(model)?;
    if batch_size == 0 {
        return Err(HearError::InvalidInput("batch_size must be positive".into()));
    }

    let (frames, timestamps) =
        frame_audio(audio, model.frame_size(), hop_size, model.sample_rate())?;
    let (n_recordings, n_frames, frame_size) = frames.dim();
    let embedding_size = model.embedding_size();
    let total = n_recordings * n_frames;

    // Frame f of recording r lands at row r * n_frames + f.
    let flat = frames
        .into_shape_with_order((total, frame_size))
        .map_err(|e| HearError::InvalidInput(format!("flatten frames: {e}")))?;

    let mut embeddings = Array2::<f32>::zeros((total, embedding_size));
    let batches = flat
        .axis_chunks_iter(Axis(0), batch_size)
        .zip(embeddings.axis_chunks_iter_mut(Axis(0), batch_size));
    for (i, (batch, mut out)) in batches.enumerate() {
        let emb = model.embed(batch)?;
        if emb.dim() != out.dim() {
            return Err(HearError::TypeMismatch(format!(
                "embed returned shape {:?} for a batch of {} frames, expected {:?}",
                emb.dim(),
                batch.nrows(),
                out.dim()
            )));
        }
        out.assign(&emb);
        tracing::trace!(batch = i, frames = batch.nrows(), "embedded sub-batch");
    }

    tracing::debug!(
        recordings = n_recordings,
        frames = n_frames,
        embedding_size,
        batch_size,
        "embedded audio"
    );

    let embeddings = embeddings
        .into_shape_with_order((n_recordings, n_frames, embedding_size))
        .map_err(|e| HearError::InvalidInput(format!("unflatten embeddings: {e}")))?;
    Ok((embeddings, timestamps))
}

/// Embeds audio with the default sub-batch size unless one is given.
///
/// Embeddings and timestamps start at 0 s and advance by `hop_size`. For
/// 1.1 s of audio and `hop_size = 0.25` the timestamps are
/// `[0.0, 0.25, 0.5, 0.75, 1.0]`.
pub fn get_audio_embedding<M: EmbeddingModel + ?Sized>(
    audio: ArrayViewD<'_, f32>,
    model: &M,
    hop_size: f64,
    batch_size: Option<usize>,
) -> Result<(Array3<f32>, Array1<f64>), HearError> {
    embed_audio(audio, model, hop_size, batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use ndarray::{Array, Array2, ArrayView2, IxDyn};

    /// Embeds a frame as `[first sample, sum]` and records each batch size.
    struct Probe {
        calls: Mutex<Vec<usize>>,
        embedding_size: usize,
        wrong_rows: bool,
    }

    impl Probe {
        fn new() -> Self {
            Self { calls: Mutex::new(Vec::new()), embedding_size: 2, wrong_rows: false }
        }

        fn calls(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl EmbeddingModel for Probe {
        fn sample_rate(&self) -> u32 {
            10
        }

        fn embedding_size(&self) -> usize {
            self.embedding_size
        }

        fn frame_size(&self) -> usize {
            4
        }

        fn embed(&self, frames: ArrayView2<'_, f32>) -> Result<Array2<f32>, HearError> {
            self.calls.lock().unwrap().push(frames.nrows());
            let rows = if self.wrong_rows { frames.nrows() + 1 } else { frames.nrows() };
            Ok(Array2::from_shape_fn((rows, 2), |(r, c)| {
                let r = r.min(frames.nrows().saturating_sub(1));
                if c == 0 { frames[[r, 0]] } else { frames.row(r).sum() }
            }))
        }
    }

    fn coded_audio(recordings: usize, samples: usize) -> Array2<f32> {
        Array2::from_shape_fn((recordings, samples), |(r, i)| (r * 1000 + i + 1) as f32)
    }

    #[test]
    fn partitions_in_order() {
        let probe = Probe::new();
        let audio = coded_audio(2, 20);
        // 10 Hz, hop 0.2 s -> 2 samples; padded length 24 -> 11 frames each.
        let (emb, ts) = embed_audio(audio.view().into_dyn(), &probe, 0.2, 4).unwrap();
        assert_eq!(ts.len(), 11);
        assert_eq!(emb.dim(), (2, 11, 2));
        assert_eq!(probe.calls(), vec![4, 4, 4, 4, 4, 2]);
    }

    #[test]
    fn reassembles_recording_major() {
        let probe = Probe::new();
        let audio = coded_audio(3, 17);
        let (frames, _) = frame_audio(audio.view(), 4, 0.3, 10).unwrap();
        let (emb, _) = embed_audio(audio.view().into_dyn(), &probe, 0.3, 5).unwrap();

        let (n_rec, n_frames, _) = frames.dim();
        for r in 0..n_rec {
            for f in 0..n_frames {
                assert_eq!(emb[[r, f, 0]], frames[[r, f, 0]], "[{r}, {f}] first");
                assert_eq!(emb[[r, f, 1]], frames.slice(ndarray::s![r, f, ..]).sum(), "[{r}, {f}] sum");
            }
        }
    }

    #[test]
    fn batch_size_does_not_change_result() {
        let audio = coded_audio(2, 33);
        let (base, base_ts) = embed_audio(audio.view().into_dyn(), &Probe::new(), 0.1, 1).unwrap();
        for bs in [2, 3, 7, 64, 10_000] {
            let (emb, ts) = embed_audio(audio.view().into_dyn(), &Probe::new(), 0.1, bs).unwrap();
            assert_eq!(emb, base, "batch_size {bs}");
            assert_eq!(ts, base_ts, "batch_size {bs}");
        }
    }

    #[test]
    fn rank_is_checked_before_any_work() {
        let probe = Probe::new();
        for shape in [&[40][..], &[1, 2, 40][..], &[][..]] {
            let audio = Array::<f32, _>::zeros(IxDyn(shape));
            let err = embed_audio(audio.view(), &probe, 0.1, 8).unwrap_err();
            assert!(matches!(err, HearError::InvalidInput(_)), "shape {shape:?}");
        }
        assert!(probe.calls().is_empty());
    }

    #[test]
    fn contract_is_checked_before_any_work() {
        let mut probe = Probe::new();
        probe.embedding_size = 0;
        let audio = coded_audio(1, 10);
        let err = embed_audio(audio.view().into_dyn(), &probe, 0.1, 8).unwrap_err();
        assert!(matches!(err, HearError::TypeMismatch(_)));
        assert!(probe.calls().is_empty());
    }

    #[test]
    fn wrong_output_shape_is_type_mismatch() {
        let mut probe = Probe::new();
        probe.wrong_rows = true;
        let audio = coded_audio(1, 10);
        let err = embed_audio(audio.view().into_dyn(), &probe, 0.1, 8).unwrap_err();
        assert!(matches!(err, HearError::TypeMismatch(_)));
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        let audio = coded_audio(1, 10);
        let err = embed_audio(audio.view().into_dyn(), &Probe::new(), 0.1, 0).unwrap_err();
        assert!(matches!(err, HearError::InvalidInput(_)));
    }

    #[test]
    fn no_recordings_yields_empty_tensor() {
        let probe = Probe::new();
        let audio = Array2::<f32>::zeros((0, 25));
        let (emb, ts) = embed_audio(audio.view().into_dyn(), &probe, 0.5, 8).unwrap();
        assert_eq!(emb.dim(), (0, ts.len(), 2));
        assert!(probe.calls().is_empty());
    }

    #[test]
    fn default_batch_size_is_used() {
        let probe = Probe::new();
        // 600 samples at 10 Hz with a 1-sample hop -> 601 frames.
        let audio = coded_audio(1, 600);
        let (emb, ts) = get_audio_embedding(audio.view().into_dyn(), &probe, 0.1, None).unwrap();
        assert_eq!(ts.len(), 601);
        assert_eq!(emb.dim(), (1, 601, 2));
        assert_eq!(probe.calls(), vec![DEFAULT_BATCH_SIZE, 601 - DEFAULT_BATCH_SIZE]);
    }

    #[test]
    fn works_through_trait_object() {
        let model: Box<dyn EmbeddingModel> = Box::new(Probe::new());
        let audio = coded_audio(1, 10);
        let (emb, _) = embed_audio(audio.view().into_dyn(), model.as_ref(), 0.1, 3).unwrap();
        assert_eq!(emb.dim().2, 2);
    }
}
