//! # Vesi Limbic System
//!
//! Closed-loop generation control. Every reply is scored against the persona
//! and drift lexicons; the score moves a bounded mood metric, and the mood
//! feeds back into the sampling temperature for the next turn.
//!
//! ## Zones
//!
//! - DRIFT (< 40): replies sound like a generic assistant; temperature climbs
//!   to shake the model out of it.
//! - STABLE (40–70): temperature is left alone.
//! - LOCKED-IN (> 70): persona is holding; temperature resets to the calm value.
//!
//! The zone is never stored. It is read off the score at the two thresholds.

mod feedback;
mod mood;
mod tracker;

pub use feedback::{TemperatureFeedback, CALM_TEMPERATURE, DEFAULT_TEMPERATURE, MAX_TEMPERATURE};
pub use mood::{MoodScore, MoodZone, DEFAULT_MOOD};
pub use tracker::{MoodReading, MoodTracker};
