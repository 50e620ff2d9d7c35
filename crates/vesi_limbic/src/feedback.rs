//! Mood → temperature feedback rule.

use crate::mood::{MoodScore, MoodZone};
use vesi_core::config::MoodConfig;

/// Starting temperature of every session.
pub const DEFAULT_TEMPERATURE: f32 = 0.95;
/// Temperature restored once the persona is locked in.
pub const CALM_TEMPERATURE: f32 = 0.85;
/// Ceiling for drift escalation.
pub const MAX_TEMPERATURE: f32 = 1.3;

const DEFAULT_STEP: f32 = 0.1;

/// Applied once per turn, after the score update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureFeedback {
    pub calm: f32,
    pub max: f32,
    pub step: f32,
    pub drift_threshold: u8,
    pub locked_threshold: u8,
}

impl Default for TemperatureFeedback {
    fn default() -> Self {
        Self {
            calm: CALM_TEMPERATURE,
            max: MAX_TEMPERATURE,
            step: DEFAULT_STEP,
            drift_threshold: 40,
            locked_threshold: 70,
        }
    }
}

impl From<&MoodConfig> for TemperatureFeedback {
    fn from(cfg: &MoodConfig) -> Self {
        Self {
            calm: cfg.calm_temperature,
            max: cfg.max_temperature,
            step: cfg.temperature_step,
            drift_threshold: cfg.drift_threshold,
            locked_threshold: cfg.locked_threshold,
        }
    }
}

impl TemperatureFeedback {
    pub fn zone(&self, score: MoodScore) -> MoodZone {
        score.zone(self.drift_threshold, self.locked_threshold)
    }

    /// Next temperature for the given (already updated) score.
    pub fn apply(&self, score: MoodScore, temperature: f32) -> f32 {
        match self.zone(score) {
            MoodZone::Drift => (temperature + self.step).min(self.max),
            MoodZone::LockedIn => self.calm,
            MoodZone::Stable => temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_drift_escalates_by_step() {
        let fb = TemperatureFeedback::default();
        assert!(approx(fb.apply(MoodScore::new(0), 0.95), 1.05));
    }

    #[test]
    fn test_drift_caps_at_max() {
        let fb = TemperatureFeedback::default();
        assert!(approx(fb.apply(MoodScore::new(10), 1.25), 1.3));
        assert!(approx(fb.apply(MoodScore::new(10), 1.3), 1.3));
    }

    #[test]
    fn test_locked_in_resets_to_calm() {
        let fb = TemperatureFeedback::default();
        assert!(approx(fb.apply(MoodScore::new(80), 1.3), CALM_TEMPERATURE));
        assert!(approx(fb.apply(MoodScore::new(71), 0.95), 0.85));
    }

    #[test]
    fn test_stable_leaves_temperature() {
        let fb = TemperatureFeedback::default();
        assert!(approx(fb.apply(MoodScore::new(40), 1.15), 1.15));
        assert!(approx(fb.apply(MoodScore::new(70), 1.15), 1.15));
    }

    #[test]
    fn test_from_config() {
        let mut cfg = MoodConfig::default();
        cfg.calm_temperature = 0.95;
        let fb = TemperatureFeedback::from(&cfg);
        assert!(approx(fb.apply(MoodScore::new(90), 1.2), 0.95));
    }
}
