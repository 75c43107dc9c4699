// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 Waddle Social

//! XEP-0107 mood vocabulary.
//!
//! The catalog is the only source of [`Mood`] values, so every mood that
//! reaches the stanza builder is a known lowercase token that is safe to use
//! as an XML element name.

use std::fmt;
use std::str::FromStr;

use crate::error::InvalidMoodError;

/// User mood namespace and PEP node (XEP-0107).
pub const NS_MOOD: &str = "http://jabber.org/protocol/mood";

/// The moods defined by XEP-0107, in listing order.
const MOODS: [&str; 80] = [
    "afraid",
    "amazed",
    "angry",
    "amorous",
    "annoyed",
    "anxious",
    "aroused",
    "ashamed",
    "bored",
    "brave",
    "calm",
    "cautious",
    "cold",
    "confident",
    "confused",
    "contemplative",
    "contented",
    "cranky",
    "crazy",
    "creative",
    "curious",
    "dejected",
    "depressed",
    "disappointed",
    "disgusted",
    "dismayed",
    "distracted",
    "embarrassed",
    "envious",
    "excited",
    "flirtatious",
    "frustrated",
    "grumpy",
    "guilty",
    "happy",
    "hopeful",
    "hot",
    "humbled",
    "humiliated",
    "hungry",
    "hurt",
    "impressed",
    "in_awe",
    "in_love",
    "indignant",
    "interested",
    "intoxicated",
    "invincible",
    "jealous",
    "lonely",
    "lucky",
    "mean",
    "moody",
    "nervous",
    "neutral",
    "offended",
    "outraged",
    "playful",
    "proud",
    "relaxed",
    "relieved",
    "remorseful",
    "restless",
    "sad",
    "sarcastic",
    "serious",
    "shocked",
    "shy",
    "sick",
    "sleepy",
    "spontaneous",
    "stressed",
    "strong",
    "surprised",
    "thankful",
    "thirsty",
    "tired",
    "undefined",
    "weak",
    "worried",
];

/// Lookup over the fixed mood table.
pub struct MoodCatalog;

impl MoodCatalog {
    /// All moods in listing order.
    pub fn list() -> &'static [&'static str] {
        &MOODS
    }

    /// Case-insensitive membership test.
    pub fn is_valid(token: &str) -> bool {
        Self::canonicalize(token).is_some()
    }

    /// Canonical (lowercase) spelling of `token`, if it is a known mood.
    pub fn canonicalize(token: &str) -> Option<&'static str> {
        MOODS
            .iter()
            .copied()
            .find(|mood| mood.eq_ignore_ascii_case(token))
    }
}

/// A validated mood token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mood(&'static str);

impl Mood {
    /// Look `token` up in the catalog, ignoring case. The stored token is the
    /// canonical lowercase form.
    pub fn parse(token: &str) -> Result<Self, InvalidMoodError> {
        MoodCatalog::canonicalize(token)
            .map(Mood)
            .ok_or_else(|| InvalidMoodError {
                token: token.to_string(),
            })
    }

    /// Canonical token, used as the element name in the published stanza.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl FromStr for Mood {
    type Err = InvalidMoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::parse(s)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A mood together with its optional free-form description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodPublication {
    pub mood: Mood,
    pub text: Option<String>,
}

impl MoodPublication {
    /// A publication with no `<text>` child.
    pub fn new(mood: Mood) -> Self {
        Self { mood, text: None }
    }

    /// Attach a description. Empty text is dropped.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.is_empty() { None } else { Some(text) };
        self
    }
}
