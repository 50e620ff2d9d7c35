//! Voice I/O for Vesi
//!
//! Speech-to-text and text-to-speech sit behind traits; the shipped
//! implementations talk to OpenAI-compatible HTTP servers
//! (faster-whisper-server for transcription, Kokoro-FastAPI for speech).
//! Microphone and speaker access are left to the host: audio enters as
//! [`AudioClip`]s from an [`AudioCapture`] and leaves as encoded WAV.

mod audio;
mod capture;
mod error;
mod kokoro;
mod listener;
mod stt;
mod tts;
mod whisper;

pub use audio::{decode_pcm16, decode_wav, encode_wav, AudioClip};
pub use capture::{AudioCapture, WavFileCapture};
pub use error::VoiceError;
pub use kokoro::KokoroClient;
pub use listener::{is_noise, spawn_spoken_input, SpokenInput};
pub use stt::{SpeechToText, TranscribeOptions};
pub use tts::{SpeakOptions, TextToSpeech};
pub use whisper::WhisperClient;
