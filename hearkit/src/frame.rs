//! Centered framing of equal-length recordings.

use ndarray::{s, Array1, Array2, Array3, ArrayView2, ArrayViewD, Ix2};

use crate::HearError;

/// Views a dynamic-rank array as `[recordings][samples]`.
pub(crate) fn as_recordings<'a>(
    audio: ArrayViewD<'a, f32>,
) -> Result<ArrayView2<'a, f32>, HearError> {
    let ndim = audio.ndim();
    audio.into_dimensionality::<Ix2>().map_err(|_| {
        HearError::InvalidInput(format!(
            "audio must be 2D with shape (recordings, samples), got {ndim}D"
        ))
    })
}

/// Like [`frame_audio`], but accepts an array of any rank and fails with
/// [`HearError::InvalidInput`] unless it is exactly 2D.
pub fn frame_audio_dyn(
    audio: ArrayViewD<'_, f32>,
    frame_size: usize,
    hop_size: f64,
    sample_rate: u32,
) -> Result<(Array3<f32>, Array1<f64>), HearError> {
    frame_audio(as_recordings(audio)?, frame_size, hop_size, sample_rate)
}

/// Slices audio into frames centered every `hop_size` seconds.
///
/// Each recording is zero padded with `frame_size / 2` samples on the left and
/// `frame_size - frame_size / 2` on the right, so frame 0 is centered on the
/// first sample. Frame `k` starts at `round(sample_rate * k * hop_size)` in the
/// padded signal, rounding half to even. Frames are produced until the next
/// one would run past the padded signal; the first frame always fits.
///
/// Returns `[recordings][frames][frame_size]` and one timestamp (seconds) per
/// frame, shared by all recordings.
pub fn frame_audio(
    audio: ArrayView2<'_, f32>,
    frame_size: usize,
    hop_size: f64,
    sample_rate: u32,
) -> Result<(Array3<f32>, Array1<f64>), HearError> {
    if frame_size == 0 {
        return Err(HearError::InvalidInput("frame_size must be positive".into()));
    }
    if sample_rate == 0 {
        return Err(HearError::InvalidInput("sample_rate must be positive".into()));
    }
    if !(hop_size.is_finite() && hop_size > 0.0) {
        return Err(HearError::InvalidInput(format!(
            "hop_size must be finite and positive, got {hop_size}"
        )));
    }

    let (n_recordings, n_samples) = audio.dim();
    let left = frame_size / 2;
    let padded_len = n_samples + frame_size;
    check_frame_budget(n_recordings, padded_len, frame_size, hop_size, sample_rate)?;

    let mut padded = Array2::<f32>::zeros((n_recordings, padded_len));
    padded
        .slice_mut(s![.., left..left + n_samples])
        .assign(&audio);

    let starts = frame_starts(padded_len, frame_size, hop_size, sample_rate);
    let n_frames = starts.len();

    let mut frames = Array3::<f32>::zeros((n_recordings, n_frames, frame_size));
    for (k, &start) in starts.iter().enumerate() {
        frames
            .slice_mut(s![.., k, ..])
            .assign(&padded.slice(s![.., start..start + frame_size]));
    }

    let timestamps = Array1::from_iter((0..n_frames).map(|k| k as f64 * hop_size));

    tracing::debug!(
        recordings = n_recordings,
        samples = n_samples,
        frames = n_frames,
        frame_size,
        hop_size,
        "framed audio"
    );
    Ok((frames, timestamps))
}

/// Fails when the frame tensor for this hop could not be allocated.
///
/// Frame `k` fits while `round(sample_rate * k * hop_size) <= padded_len - frame_size`,
/// which bounds the frame count by `(padded_len - frame_size + 0.5) / (sample_rate * hop_size) + 1`.
fn check_frame_budget(
    n_recordings: usize,
    padded_len: usize,
    frame_size: usize,
    hop_size: f64,
    sample_rate: u32,
) -> Result<(), HearError> {
    let step = sample_rate as f64 * hop_size;
    let max_frames = ((padded_len - frame_size) as f64 + 0.5) / step + 2.0;
    let bytes = (max_frames < usize::MAX as f64)
        .then_some(max_frames as usize)
        .and_then(|n| n.checked_mul(n_recordings.max(1)))
        .and_then(|n| n.checked_mul(frame_size))
        .and_then(|n| n.checked_mul(size_of::<f32>()));
    match bytes {
        Some(b) if b <= isize::MAX as usize => Ok(()),
        _ => Err(HearError::InvalidInput(format!(
            "hop_size {hop_size} yields too many frames of {frame_size} samples"
        ))),
    }
}

/// Start offsets of every frame that fits in a padded signal of `padded_len`.
fn frame_starts(padded_len: usize, frame_size: usize, hop_size: f64, sample_rate: u32) -> Vec<usize> {
    // padded_len >= frame_size, so frame 0 always fits.
    let mut starts = vec![0usize];
    loop {
        let k = starts.len() as f64;
        let start = (sample_rate as f64 * k * hop_size).round_ties_even();
        if start + frame_size as f64 > padded_len as f64 {
            break;
        }
        starts.push(start as usize);
    }
    starts
}
