//! Final reminder sentence assembly
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use rand::Rng;

use super::record::{TARGET_EVERYONE, TARGET_MYSELF};

const STARTERS: [&str; 2] = [" wanted me to remind you ", " asked me to remind you "];

const GRUMBLES: [&str; 2] = [" So get on that, would ya?", " It's about time you get on that."];

/// Rolls above this (out of 0..=100) add a grumble to self-reminders
const GRUMBLE_THRESHOLD: u32 = 95;

fn ends_with_terminal_punctuation(text: &str) -> bool {
    text.ends_with(['.', '!', '?'])
}

/// `@name` form of a target, mentioning every comma-separated name
fn mention(target: &str) -> String {
    target
        .split(", ")
        .map(|name| format!("@{name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the text delivered when the reminder fires
pub fn compose<R: Rng + ?Sized>(target: &str, message: &str, set_by: &str, rng: &mut R) -> String {
    let mut message = message.trim().to_string();
    if !ends_with_terminal_punctuation(&message) {
        message.push('.');
    }

    let composed = if target == TARGET_EVERYONE {
        format!("o/ everyone, {message}")
    } else if target == TARGET_MYSELF {
        format!(":-) {message}")
    } else if target == set_by {
        if rng.random_range(0..=100) > GRUMBLE_THRESHOLD {
            message.push_str(GRUMBLES[rng.random_range(0..GRUMBLES.len())]);
        }
        format!("@{target}, {message}")
    } else {
        let starter = STARTERS[rng.random_range(0..STARTERS.len())];
        let body = format!(" earlier {set_by}{starter}{message}");
        if target.contains('@') {
            format!("{target}{body}")
        } else {
            format!("{},{body}", mention(target))
        }
    };

    composed.trim_end().to_string()
}
