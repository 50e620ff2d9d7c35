//! Bounded mood score and the zones read from it.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MOOD: u8 = 50;
const MAX_MOOD: i32 = 100;

/// Integer mood in `[0, 100]`. Only [`MoodScore::update`] moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodScore(u8);

impl Default for MoodScore {
    fn default() -> Self {
        Self(DEFAULT_MOOD)
    }
}

impl MoodScore {
    /// Clamp an arbitrary starting value into range.
    pub fn new(value: u8) -> Self {
        Self(value.min(MAX_MOOD as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// `max(0, min(100, score + delta))`.
    pub fn update(self, delta: i32) -> Self {
        let next = (self.0 as i32).saturating_add(delta).clamp(0, MAX_MOOD);
        Self(next as u8)
    }

    pub fn zone(self, drift_threshold: u8, locked_threshold: u8) -> MoodZone {
        if self.0 < drift_threshold {
            MoodZone::Drift
        } else if self.0 > locked_threshold {
            MoodZone::LockedIn
        } else {
            MoodZone::Stable
        }
    }
}

impl std::fmt::Display for MoodScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodZone {
    /// Generic-assistant replies dominate.
    Drift,
    Stable,
    /// Persona is holding.
    LockedIn,
}

impl MoodZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drift => "drift",
            Self::Stable => "stable",
            Self::LockedIn => "locked_in",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fifty() {
        assert_eq!(MoodScore::default().value(), 50);
    }

    #[test]
    fn test_update_clamps_both_ends() {
        assert_eq!(MoodScore::new(0).update(-1000).value(), 0);
        assert_eq!(MoodScore::new(100).update(1000).value(), 100);
        assert_eq!(MoodScore::new(50).update(i32::MIN).value(), 0);
        assert_eq!(MoodScore::new(50).update(i32::MAX).value(), 100);
    }

    #[test]
    fn test_update_moves_within_range() {
        assert_eq!(MoodScore::new(50).update(30).value(), 80);
        assert_eq!(MoodScore::new(50).update(-60).value(), 0);
        assert_eq!(MoodScore::new(50).update(0).value(), 50);
    }

    #[test]
    fn test_new_clamps_out_of_range() {
        assert_eq!(MoodScore::new(250).value(), 100);
    }

    #[test]
    fn test_zones_at_thresholds() {
        assert_eq!(MoodScore::new(39).zone(40, 70), MoodZone::Drift);
        assert_eq!(MoodScore::new(40).zone(40, 70), MoodZone::Stable);
        assert_eq!(MoodScore::new(70).zone(40, 70), MoodZone::Stable);
        assert_eq!(MoodScore::new(71).zone(40, 70), MoodZone::LockedIn);
    }
}
