//! Terminal input: each line typed by the player becomes zero or more keys
//! from the command alphabet.

use shared::command::KEY_CONFIRM;
use shared::Command;

/// Keys pressed by one line of input, in order. An empty line confirms;
/// characters outside the alphabet are dropped.
pub fn keys_from_line(line: &str) -> Vec<char> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.is_empty() {
        return vec![KEY_CONFIRM];
    }

    line.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| Command::from_key(*c).is_some())
        .collect()
}

/// Help text shown once at startup.
pub fn controls() -> &'static str {
    "w/a/s/d + Enter to steer, space + Enter to dash, empty line to start or continue"
}
