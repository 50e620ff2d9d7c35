//! Terminal rendering of replies and the mood gauge.

use vesi_limbic::MoodZone;
use vesi_reasoning::TurnReply;

const BAR_CELLS: usize = 20;
const WRAP_WIDTH: usize = 80;
const RULE: &str = "------------------------------";

/// `[██████████----------] 50%`
pub fn bar(score: u8) -> String {
    let score = score.min(100);
    let filled = BAR_CELLS * usize::from(score) / 100;
    format!(
        "[{}{}] {}%",
        "█".repeat(filled),
        "-".repeat(BAR_CELLS - filled),
        score
    )
}

pub fn status(zone: MoodZone) -> &'static str {
    match zone {
        MoodZone::LockedIn => "Maximum persona (safe)",
        MoodZone::Drift => "WARNING - assistant drift detected!",
        MoodZone::Stable => "Stable",
    }
}

/// Greedy word wrap; words longer than the width get a line of their own.
pub fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

pub fn render(reply: &TurnReply, verbose: bool) -> String {
    if let Some(ref err) = reply.error {
        return format!("\n[System Error]: {}\n", err);
    }

    let mut out = String::new();
    out.push_str("\nVesi >\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&wrap(&reply.text, WRAP_WIDTH));
    out.push('\n');
    out.push_str(RULE);
    out.push('\n');
    if verbose {
        out.push_str(&format!(
            "DEBUG INFO: Generated {} fragments{} at temperature {:.2}.\n",
            reply.fragments,
            if reply.leaked { " (cut by leak guard)" } else { "" },
            reply.temperature
        ));
    }
    if let Some(ref err) = reply.persist_error {
        out.push_str(&format!("[System] Memory not saved: {}\n", err));
    }
    out.push_str(&format!("\nVESI PERSONALITY GAUGE: {}\n", bar(reply.mood)));
    out.push_str(&format!("STATUS: {}\n", status(reply.zone)));
    out
}
