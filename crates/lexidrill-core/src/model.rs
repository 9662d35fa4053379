//! Core data model types for lexidrill.
//!
//! Entries are the vocabulary items everything else operates on. The other
//! types here are per-request results that are never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DrillError;

/// Store-assigned entry identifier.
pub type EntryId = u64;

/// Mastery level of an entry, always within `1..=5`.
///
/// Every constructor clamps, so an out-of-range level cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "i64")]
pub struct ProficiencyLevel(u8);

impl ProficiencyLevel {
    pub const MIN: ProficiencyLevel = ProficiencyLevel(1);
    pub const MAX: ProficiencyLevel = ProficiencyLevel(5);

    /// Build a level, clamping `value` into `1..=5`.
    pub fn new(value: i64) -> Self {
        ProficiencyLevel(value.clamp(1, 5) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Sampling weight: novices are drawn five times as often as masters.
    pub fn weight(self) -> u32 {
        6 - u32::from(self.0)
    }

    /// Level after a practice attempt: one up when correct, one down when not.
    pub fn next(self, was_correct: bool) -> Self {
        next_level(self, was_correct)
    }
}

impl Default for ProficiencyLevel {
    fn default() -> Self {
        ProficiencyLevel::MIN
    }
}

impl From<i64> for ProficiencyLevel {
    fn from(value: i64) -> Self {
        ProficiencyLevel::new(value)
    }
}

impl From<ProficiencyLevel> for u8 {
    fn from(level: ProficiencyLevel) -> Self {
        level.0
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pure proficiency transition, kept apart from persistence.
pub fn next_level(current: ProficiencyLevel, was_correct: bool) -> ProficiencyLevel {
    let delta = if was_correct { 1 } else { -1 };
    ProficiencyLevel::new(i64::from(current.get()) + delta)
}

/// A single vocabulary item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// `None` until the store assigns one.
    #[serde(default)]
    pub id: Option<EntryId>,
    pub original_word: String,
    pub translation: String,
    pub language: String,
    #[serde(default)]
    pub proficiency_level: ProficiencyLevel,
    #[serde(default)]
    pub example_usage: String,
    #[serde(default)]
    pub explanation: String,
}

impl Entry {
    /// A fresh, unsaved entry at the lowest proficiency level.
    pub fn new(
        original_word: impl Into<String>,
        translation: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            original_word: original_word.into(),
            translation: translation.into(),
            language: language.into(),
            proficiency_level: ProficiencyLevel::MIN,
            example_usage: String::new(),
            explanation: String::new(),
        }
    }

    pub fn with_level(mut self, level: i64) -> Self {
        self.proficiency_level = ProficiencyLevel::new(level);
        self
    }

    pub fn with_example_usage(mut self, example: impl Into<String>) -> Self {
        self.example_usage = example.into();
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Check the non-empty invariants on the required text fields.
    pub fn validate(&self) -> Result<(), DrillError> {
        for (name, value) in [
            ("originalWord", &self.original_word),
            ("translation", &self.translation),
            ("language", &self.language),
        ] {
            if value.trim().is_empty() {
                return Err(DrillError::InvalidEntry(format!("{name} cannot be empty")));
            }
        }
        Ok(())
    }
}

/// User-editable fields of an entry, used for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub original_word: String,
    pub translation: String,
    pub language: String,
    #[serde(default)]
    pub example_usage: String,
    #[serde(default)]
    pub explanation: String,
}

impl NewEntry {
    /// Turn into an unsaved entry at level 1, rejecting blank required fields.
    pub fn into_entry(self) -> Result<Entry, DrillError> {
        let entry = Entry::new(self.original_word, self.translation, self.language)
            .with_example_usage(self.example_usage)
            .with_explanation(self.explanation);
        entry.validate()?;
        Ok(entry)
    }

    /// Overwrite the editable fields of `entry`, leaving id and level alone.
    pub fn apply_to(self, entry: &mut Entry) -> Result<(), DrillError> {
        let mut updated = entry.clone();
        updated.original_word = self.original_word;
        updated.translation = self.translation;
        updated.language = self.language;
        updated.example_usage = self.example_usage;
        updated.explanation = self.explanation;
        updated.validate()?;
        *entry = updated;
        Ok(())
    }
}

/// Outcome of validating a free-text grammar answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarValidationResult {
    pub is_correct: bool,
    pub feedback: String,
    #[serde(default)]
    pub correction: Option<String>,
    pub explanation: String,
}

/// Grammar topics a drill can ask for.
pub const GRAMMAR_TOPICS: [&str; 15] = [
    "Present Simple",
    "Present Continuous",
    "Past Simple",
    "Past Continuous",
    "Present Perfect",
    "Past Perfect",
    "Future Simple",
    "First Conditional",
    "Second Conditional",
    "Third Conditional",
    "Passive Voice",
    "Reported Speech",
    "Modal Verbs",
    "Gerunds and Infinitives",
    "Relative Clauses",
];

/// A sampled entry paired with the grammar topic to practise it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarDrill {
    pub entry: Entry,
    pub grammar_topic: String,
}

/// Result of an exact-match translation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationCheck {
    pub is_correct: bool,
    pub correct_translation: String,
    pub example_usage: String,
    pub explanation: String,
    pub message: String,
    pub proficiency_level: ProficiencyLevel,
}

/// Result of an AI-graded free translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationVerification {
    pub is_correct: bool,
    pub correct_translation: String,
    pub feedback: String,
    pub explanation: String,
}

/// Parameters for generating a practice text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeRequest {
    pub source_language: String,
    pub target_language: String,
    pub level: String,
    pub sentence_count: u32,
    #[serde(default)]
    pub topic: Option<String>,
}

/// A free translation the user wants graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub source_language: String,
    pub target_language: String,
    pub source_text: String,
    pub user_translation: String,
}
