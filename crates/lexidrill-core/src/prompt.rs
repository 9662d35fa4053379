//! Prompt templates with positional placeholders.
//!
//! Placeholders are `{0}`, `{1}`, ... and may appear in any order or more
//! than once; `{{` and `}}` produce literal braces. Templates are parsed once
//! at start-up so a malformed one fails before any request is served.

use serde::{Deserialize, Serialize};

use crate::error::DrillError;
use crate::model::{PracticeRequest, TranslationRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(usize),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
    arity: usize,
}

impl Template {
    /// Parse `text`, requiring every placeholder index to be below `arity`.
    pub fn parse(text: &str, arity: usize) -> Result<Self, DrillError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut digits = String::new();
                    let mut closed = false;
                    for (_, d) in chars.by_ref() {
                        if d == '}' {
                            closed = true;
                            break;
                        }
                        digits.push(d);
                    }
                    if !closed {
                        return Err(DrillError::Template(format!(
                            "unterminated placeholder at byte {pos}"
                        )));
                    }
                    let index: usize = digits.trim().parse().map_err(|_| {
                        DrillError::Template(format!(
                            "placeholder '{{{digits}}}' at byte {pos} is not a position"
                        ))
                    })?;
                    if index >= arity {
                        return Err(DrillError::Template(format!(
                            "placeholder {{{index}}} exceeds the {arity} available values"
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(index));
                }
                '}' => {
                    return Err(DrillError::Template(format!(
                        "unmatched '}}' at byte {pos}"
                    )));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments, arity })
    }

    /// Number of values the template was declared with.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Highest placeholder index plus one; the minimum number of values.
    pub fn required_values(&self) -> usize {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Slot(i) => Some(i + 1),
                Segment::Literal(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Substitute `values` into the placeholders.
    pub fn render<S: AsRef<str>>(&self, values: &[S]) -> Result<String, DrillError> {
        let required = self.required_values();
        if values.len() < required {
            return Err(DrillError::Template(format!(
                "template needs {required} values, got {}",
                values.len()
            )));
        }
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(i) => out.push_str(values[*i].as_ref()),
            }
        }
        Ok(out)
    }
}

/// Parse and render in one step.
pub fn build<S: AsRef<str>>(template: &str, values: &[S]) -> Result<String, DrillError> {
    Template::parse(template, values.len())?.render(values)
}

/// Default grammar validation prompt: sentence, word, translation, topic.
pub const GRAMMAR_VALIDATION_PROMPT: &str = r#"You are a language teacher checking a student's sentence.

Sentence: "{0}"
Word that must be used: "{1}" (translation: "{2}")
Grammar topic: {3}

Decide whether the sentence uses the word correctly and applies the grammar topic correctly.
Respond ONLY with a JSON object of this shape:
{{
    "isCorrect": true or false,
    "feedback": "one or two sentences of feedback for the student",
    "correction": "the corrected sentence, or the original sentence if it is already correct",
    "explanation": "a short explanation of the grammar topic"
}}"#;

/// Default practice text prompt: source, target, level, count, topic clause.
pub const PRACTICE_GENERATION_PROMPT: &str = "Write a text for a translation exercise. \
Text language: {0}. The student will translate it into {1}. \
Difficulty level: {2}. Length: {3} sentences.{4} \
The text should be natural, coherent and suited to the level.";

/// Default translation verification prompt: source language, target
/// language, source text, user translation.
pub const TRANSLATION_VERIFICATION_PROMPT: &str = r#"Check a translation from {0} into {1}.

Original text: "{2}"
Student translation: "{3}"

Respond ONLY with a JSON object of this shape:
{{
    "isCorrect": true or false,
    "correctTranslation": "a correct translation",
    "feedback": "short feedback",
    "explanation": "explanation of mistakes, or praise"
}}

Judge whether the translation is correct, natural and preserves the meaning of the original."#;

/// Template text overrides, usually read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOverrides {
    #[serde(default)]
    pub grammar_validation: Option<String>,
    #[serde(default)]
    pub practice_generation: Option<String>,
    #[serde(default)]
    pub translation_verification: Option<String>,
}

/// The parsed templates used by the practice flows.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    grammar_validation: Template,
    practice_generation: Template,
    translation_verification: Template,
}

impl PromptTemplates {
    /// Parse the built-in templates, replacing any that are overridden.
    pub fn from_overrides(overrides: &PromptOverrides) -> Result<Self, DrillError> {
        let pick = |custom: &Option<String>, default: &'static str| {
            custom.clone().unwrap_or_else(|| default.to_string())
        };
        Ok(Self {
            grammar_validation: Template::parse(
                &pick(&overrides.grammar_validation, GRAMMAR_VALIDATION_PROMPT),
                4,
            )?,
            practice_generation: Template::parse(
                &pick(&overrides.practice_generation, PRACTICE_GENERATION_PROMPT),
                5,
            )?,
            translation_verification: Template::parse(
                &pick(
                    &overrides.translation_verification,
                    TRANSLATION_VERIFICATION_PROMPT,
                ),
                4,
            )?,
        })
    }

    pub fn grammar_validation(
        &self,
        sentence: &str,
        word: &str,
        translation: &str,
        topic: &str,
    ) -> Result<String, DrillError> {
        self.grammar_validation
            .render(&[sentence, word, translation, topic])
    }

    pub fn practice_generation(&self, request: &PracticeRequest) -> Result<String, DrillError> {
        let topic_clause = match request.topic.as_deref().map(str::trim) {
            Some(topic) if !topic.is_empty() => format!(" Topic: {topic}."),
            _ => String::new(),
        };
        self.practice_generation.render(&[
            request.source_language.clone(),
            request.target_language.clone(),
            request.level.clone(),
            request.sentence_count.to_string(),
            topic_clause,
        ])
    }

    pub fn translation_verification(
        &self,
        request: &TranslationRequest,
    ) -> Result<String, DrillError> {
        self.translation_verification.render(&[
            request.source_language.as_str(),
            request.target_language.as_str(),
            request.source_text.as_str(),
            request.user_translation.as_str(),
        ])
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        // The built-in templates are covered by tests; failing here is a bug.
        Self::from_overrides(&PromptOverrides::default())
            .expect("built-in prompt templates must parse")
    }
}
