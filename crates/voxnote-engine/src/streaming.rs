use voxnote_core::{RecognitionError, RecognitionResult};

use crate::cancel::CancelFlag;

/// Incremental recognizer fed with 16-bit mono PCM.
///
/// When an utterance boundary is reached is up to the implementation; the
/// driver makes no assumption about segmentation granularity.
pub trait StreamingDecoder {
    /// Feed one chunk. Returns `Some(text)` when the decoder closed an utterance.
    fn accept(&mut self, chunk: &[i16]) -> Result<Option<String>, RecognitionError>;
    /// Signal end of input and return whatever is still pending.
    fn flush(&mut self) -> Result<Option<String>, RecognitionError>;
}

/// Feed `pcm` to `decoder` in `chunk_size` reads and collect every yielded
/// partial, then the final flush, in read order. Empty partials are dropped.
///
/// `cancel` is checked before every read; once set, no further chunk is fed
/// and the run ends with [`RecognitionError::Cancelled`].
pub fn drive_stream<D>(
    decoder: &mut D,
    pcm: &[i16],
    chunk_size: usize,
    cancel: &CancelFlag,
) -> Result<RecognitionResult, RecognitionError>
where
    D: StreamingDecoder + ?Sized,
{
    if chunk_size == 0 {
        return Err(RecognitionError::ProcessingFailed(
            "chunk size must be > 0".to_string(),
        ));
    }

    let mut result = RecognitionResult::default();
    for chunk in pcm.chunks(chunk_size) {
        if cancel.is_cancelled() {
            return Err(RecognitionError::Cancelled);
        }
        if let Some(text) = decoder.accept(chunk)? {
            if !text.is_empty() {
                result.push(text);
            }
        }
    }
    if let Some(text) = decoder.flush()? {
        if !text.is_empty() {
            result.push(text);
        }
    }
    Ok(result)
}
