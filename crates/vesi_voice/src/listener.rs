//! Spoken-input producer: capture, transcribe, filter, enqueue.

use crate::capture::AudioCapture;
use crate::stt::{SpeechToText, TranscribeOptions};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use vesi_core::{InputOrigin, Utterance};

/// Transcripts shorter than this are background noise.
const MIN_TRANSCRIPT_CHARS: usize = 2;

pub fn is_noise(transcript: &str) -> bool {
    transcript.trim().chars().count() < MIN_TRANSCRIPT_CHARS
}

pub struct SpokenInput {
    pub capture: Box<dyn AudioCapture>,
    pub stt: Arc<dyn SpeechToText>,
    pub options: TranscribeOptions,
}

/// Run the producer until the capture is exhausted or the session stops
/// accepting input. Failed clips are logged and skipped.
pub fn spawn_spoken_input(input: SpokenInput, tx: mpsc::Sender<Utterance>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let SpokenInput {
            mut capture,
            stt,
            options,
        } = input;

        loop {
            let joined = tokio::task::spawn_blocking(move || {
                let clip = capture.next_clip();
                (capture, clip)
            })
            .await;
            let clip = match joined {
                Ok((returned, result)) => {
                    capture = returned;
                    result
                }
                Err(e) => {
                    tracing::warn!("Audio capture task failed: {}", e);
                    break;
                }
            };

            let clip = match clip {
                Ok(Some(clip)) => clip,
                Ok(None) => {
                    tracing::info!("Audio capture finished");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Audio capture error: {}", e);
                    continue;
                }
            };

            let transcript = match stt.transcribe(&clip, &options).await {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Transcription failed: {}", e);
                    continue;
                }
            };
            if is_noise(&transcript) {
                tracing::debug!("Dropping noise transcript {:?}", transcript);
                continue;
            }

            tracing::info!("You (Voice): {}", transcript);
            if tx
                .send(Utterance::new(InputOrigin::Spoken, transcript))
                .await
                .is_err()
            {
                break;
            }
        }
    })
}
