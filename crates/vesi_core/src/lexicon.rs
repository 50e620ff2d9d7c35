//! Keyword lexicons for scoring how in-character a reply sounds.
//!
//! Two word sets: persona-reinforcing words push the mood score up,
//! drift words (generic assistant phrasing) push it down.

use std::collections::HashSet;

/// Default persona-reinforcing words (tsundere voice).
pub const PERSONA_WORDS: &[&str] = &[
    "baka", "hmph", "stupid", "dummy",
    // direct insults
    "idiot", "moron", "dumb", "dense", "pathetic", "loser", "jerk", "creep", "weirdo",
    "annoying", "hopeless", "ridiculous", "useless", "lame", "gross", "clueless", "airhead",
    // attitude
    "tch", "hm", "huh", "whatever", "fine", "jeez", "sheesh", "ugh", "eh", "meh",
    // dismissive
    "shut", "go", "away", "leave", "quit", "stop", "forget", "dream", "wish", "like", "care",
    // cold or embarrassed
    "embarrassing", "awkward", "weird", "pervert", "creepy", "sigh", "tsk", "bother",
    "troublesome",
    // romcom flavour
    "perv", "dork", "nerd", "geez", "seriously", "unbelievable", "absurd",
    // aggressive
    "fight", "stare", "glare", "hurry", "move", "slow", "late", "brat", "punk",
];

/// Default drift words (out-of-character assistant speak).
pub const DRIFT_WORDS: &[&str] = &[
    "assistant", "ai", "model", "system",
    "apologize", "apologies", "regret",
    "assist", "assistance", "support", "provide",
    "happy", "glad", "certainly",
    "limitation", "policy", "guidelines",
    "suggest", "recommend", "advise", "clarify", "explain",
    "understand", "appreciate",
];

pub const DEFAULT_REINFORCE_WEIGHT: i32 = 10;
pub const DEFAULT_DRIFT_WEIGHT: i32 = -15;

#[derive(Debug, Clone)]
pub struct Lexicon {
    persona: HashSet<String>,
    drift: HashSet<String>,
    reinforce_weight: i32,
    drift_weight: i32,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(
            PERSONA_WORDS.iter().copied(),
            DRIFT_WORDS.iter().copied(),
        )
    }
}

impl Lexicon {
    /// Build a lexicon with the default +10 / -15 weights.
    pub fn new<P, D, S>(persona: P, drift: D) -> Self
    where
        P: IntoIterator<Item = S>,
        D: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            persona: persona.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            drift: drift.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            reinforce_weight: DEFAULT_REINFORCE_WEIGHT,
            drift_weight: DEFAULT_DRIFT_WEIGHT,
        }
    }

    pub fn with_weights(mut self, reinforce_weight: i32, drift_weight: i32) -> Self {
        self.reinforce_weight = reinforce_weight;
        self.drift_weight = drift_weight;
        self
    }

    /// Words configured in both sets. Those count as drift.
    pub fn overlap(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self
            .persona
            .intersection(&self.drift)
            .map(String::as_str)
            .collect();
        words.sort_unstable();
        words
    }

    /// Signed score delta for a reply. Each distinct token counts once.
    pub fn classify(&self, text: &str) -> i32 {
        tokenize(text)
            .into_iter()
            .map(|token| {
                if self.drift.contains(&token) {
                    self.drift_weight
                } else if self.persona.contains(&token) {
                    self.reinforce_weight
                } else {
                    0
                }
            })
            .sum()
    }
}

/// Whitespace split, lowercase, edge punctuation stripped, deduplicated.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| c.is_ascii_punctuation()).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_hits_score_up() {
        let lex = Lexicon::new(["hmph", "stupid", "baka"], ["assistant"]);
        assert_eq!(lex.classify("Hmph! You stupid baka, whatever!"), 30);
    }

    #[test]
    fn test_default_lexicon_counts_whatever_too() {
        assert_eq!(Lexicon::default().classify("Hmph! You stupid baka, whatever!"), 40);
    }

    #[test]
    fn test_drift_hits_score_down() {
        let delta =
            Lexicon::default().classify("As an AI assistant, I apologize, I understand your request");
        assert_eq!(delta, -60);
    }

    #[test]
    fn test_repetition_counts_once() {
        let lex = Lexicon::default();
        assert_eq!(lex.classify("baka baka BAKA baka!"), 10);
    }

    #[test]
    fn test_drift_wins_on_overlap() {
        let lex = Lexicon::new(["model", "hmph"], ["model"]);
        assert_eq!(lex.overlap(), vec!["model"]);
        assert_eq!(lex.classify("model"), -15);
        assert_eq!(lex.classify("hmph model"), -5);
    }

    #[test]
    fn test_neutral_and_empty_text() {
        let lex = Lexicon::default();
        assert_eq!(lex.classify(""), 0);
        assert_eq!(lex.classify("   "), 0);
        assert_eq!(lex.classify("the weather is nice today"), 0);
    }

    #[test]
    fn test_custom_weights() {
        let lex = Lexicon::new(["hmph"], ["ai"]).with_weights(5, -20);
        assert_eq!(lex.classify("hmph ai"), -15);
    }

    #[test]
    fn test_default_sets_are_disjoint() {
        assert!(Lexicon::default().overlap().is_empty());
    }

    #[test]
    fn test_tokenize_strips_edge_punctuation() {
        let tokens = tokenize("Hmph! ...fine, (whatever)");
        assert!(tokens.contains("hmph"));
        assert!(tokens.contains("fine"));
        assert!(tokens.contains("whatever"));
        assert_eq!(tokens.len(), 3);
    }
}
