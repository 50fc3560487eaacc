//! Note metadata
//!
//! Dialogue exports carry speaker and ordering details as `Label: value`
//! lines in unit notes and key notes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Order of units whose note has no `Order:` line
pub const DEFAULT_ORDER: u32 = 9999;

static SPEAKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Speaker:\s*([^\n]+)").expect("valid regex"));
static TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"Target:\s*([^\n]+)").expect("valid regex"));
static SPEAKING_TO: Lazy<Regex> = Lazy::new(|| Regex::new(r"speaking to:\s*([^,\n]+)").expect("valid regex"));
static SPEAKER_GENDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Speaker Gender:\s*([^\n]+)").expect("valid regex"));
static GENDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Gender:\s*([^,\n]+)").expect("valid regex"));
static CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Class:\s*([^\n]+)").expect("valid regex"));
static PLAYER_GENDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Player Gender:\s*([^\n]+)").expect("valid regex"));
static ORDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Order:\s*(\d+)").expect("valid regex"));
static COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(Developer Comment|CoT Comment|Comment):[ \t]*(.*?)[ \t\r]*$").expect("valid regex")
});

/// Fields extracted from a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteFields {
    pub speaker: Option<String>,
    /// Who the line is addressed to
    pub speaker_target: Option<String>,
    pub speaker_gender: Option<String>,
    pub player_class: Option<String>,
    pub player_gender: Option<String>,
    pub order: u32,
    /// Comment lines, each with its label
    pub comments: Vec<String>,
}

impl Default for NoteFields {
    fn default() -> Self {
        NoteFields {
            speaker: None,
            speaker_target: None,
            speaker_gender: None,
            player_class: None,
            player_gender: None,
            order: DEFAULT_ORDER,
            comments: Vec::new(),
        }
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

impl NoteFields {
    pub fn parse(note: &str) -> Self {
        let speaker_target = capture(&TARGET, note).or_else(|| capture(&SPEAKING_TO, note));
        let speaker_gender = capture(&SPEAKER_GENDER, note).or_else(|| capture(&GENDER, note));
        let order = ORDER
            .captures(note)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(DEFAULT_ORDER);

        let comments = COMMENT
            .captures_iter(note)
            .filter(|c| !c[2].is_empty())
            .map(|c| format!("{}: {}", &c[1], &c[2]))
            .collect();

        NoteFields {
            speaker: capture(&SPEAKER, note),
            speaker_target,
            speaker_gender,
            player_class: capture(&CLASS, note),
            player_gender: capture(&PLAYER_GENDER, note),
            order,
            comments,
        }
    }

    pub fn has_comments(&self) -> bool {
        !self.comments.is_empty()
    }
}

/// Key without its line suffix: the part before the first `/`, else before
/// the last `.`
pub fn main_key(key: &str) -> &str {
    if let Some(slash) = key.find('/') {
        return &key[..slash];
    }
    match key.rfind('.') {
        Some(dot) => &key[..dot],
        None => key,
    }
}

/// Menu labels are short UI strings rather than dialogue
pub fn is_menu_label(key: &str) -> bool {
    key.contains("MenuLabel")
}
