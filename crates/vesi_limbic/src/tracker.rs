//! Mood tracker: owns the session's score and temperature.
//!
//! Neither value is persisted. A new tracker starts from the configured
//! defaults every process start.

use crate::feedback::{TemperatureFeedback, DEFAULT_TEMPERATURE};
use crate::mood::{MoodScore, MoodZone};
use serde::{Deserialize, Serialize};
use vesi_core::config::{LlmConfig, MoodConfig};

/// Snapshot of the feedback loop after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodReading {
    pub score: MoodScore,
    pub temperature: f32,
    pub zone: MoodZone,
    /// Lexicon delta that produced this reading.
    pub delta: i32,
}

#[derive(Debug, Clone)]
pub struct MoodTracker {
    score: MoodScore,
    temperature: f32,
    feedback: TemperatureFeedback,
}

impl Default for MoodTracker {
    fn default() -> Self {
        Self::new(MoodScore::default(), DEFAULT_TEMPERATURE, TemperatureFeedback::default())
    }
}

impl MoodTracker {
    pub fn new(score: MoodScore, temperature: f32, feedback: TemperatureFeedback) -> Self {
        Self {
            score,
            temperature,
            feedback,
        }
    }

    pub fn from_config(mood: &MoodConfig, llm: &LlmConfig) -> Self {
        Self::new(
            MoodScore::new(mood.initial_score),
            llm.temperature,
            TemperatureFeedback::from(mood),
        )
    }

    pub fn score(&self) -> MoodScore {
        self.score
    }

    /// Temperature to sample the next reply with.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn zone(&self) -> MoodZone {
        self.feedback.zone(self.score)
    }

    pub fn feedback(&self) -> &TemperatureFeedback {
        &self.feedback
    }

    /// Apply one reply's lexicon delta: clamp the score, then run the
    /// temperature rule against the new score.
    pub fn record(&mut self, delta: i32) -> MoodReading {
        let previous = self.score;
        self.score = self.score.update(delta);
        self.temperature = self.feedback.apply(self.score, self.temperature);

        let reading = self.reading(delta);
        if reading.zone != previous.zone(self.feedback.drift_threshold, self.feedback.locked_threshold) {
            tracing::info!(
                "Mood zone changed to {} (score {} -> {}, temperature {:.2})",
                reading.zone.as_str(),
                previous,
                self.score,
                self.temperature
            );
        } else {
            tracing::debug!(
                "Mood {} -> {} (delta {:+}), temperature {:.2}",
                previous,
                self.score,
                delta,
                self.temperature
            );
        }
        reading
    }

    pub fn reading(&self, delta: i32) -> MoodReading {
        MoodReading {
            score: self.score,
            temperature: self.temperature,
            zone: self.zone(),
            delta,
        }
    }
}
