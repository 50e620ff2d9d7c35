use crate::audio::{decode_wav, AudioClip};
use crate::error::VoiceError;
use std::collections::VecDeque;
use std::path::PathBuf;

/// Source of recorded utterances.
///
/// `next_clip` blocks until a clip is ready (a microphone implementation
/// would record until silence). `Ok(None)` means the source is exhausted.
pub trait AudioCapture: Send + 'static {
    fn next_clip(&mut self) -> Result<Option<AudioClip>, VoiceError>;
}

/// Replays WAV files in order, one clip per file. Useful for scripted voice
/// sessions and for testing the voice path without a microphone.
#[derive(Debug, Clone)]
pub struct WavFileCapture {
    queue: VecDeque<PathBuf>,
}

impl WavFileCapture {
    pub fn new<I: IntoIterator<Item = PathBuf>>(paths: I) -> Self {
        Self {
            queue: paths.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl AudioCapture for WavFileCapture {
    fn next_clip(&mut self) -> Result<Option<AudioClip>, VoiceError> {
        let Some(path) = self.queue.pop_front() else {
            return Ok(None);
        };
        let data = std::fs::read(&path)
            .map_err(|e| VoiceError::Capture(format!("{}: {}", path.display(), e)))?;
        decode_wav(&data).map(Some)
    }
}
