//! Interpretation of text-generator replies.
//!
//! Replies are expected to be JSON objects but are treated as untrusted:
//! fields may be missing, have the wrong type, contradict each other, or the
//! whole reply may not be JSON at all. Every path ends in a fully populated
//! result; nothing here returns an error.

use serde_json::{Map, Value};

use crate::model::{GrammarValidationResult, TranslationVerification};

/// Used when the topic has no dedicated explanation.
pub const GENERIC_EXPLANATION: &str = "Practice using this grammar structure in your sentences.\n\n\
Make sure to use the given word in your sentence and apply the grammar topic correctly.";

pub const CORRECT_FEEDBACK: &str = "Great job! Your sentence is correct.";
pub const NEEDS_WORK_FEEDBACK: &str = "Your sentence needs improvement.";
pub const UNPARSEABLE_FEEDBACK: &str = "Could not process the AI response. Please try again.";
pub const UNAVAILABLE_FEEDBACK: &str = "Error validating sentence. Please try again.";
pub const UNAVAILABLE_EXPLANATION: &str = "AI validation service is temporarily unavailable.";

/// Canned explanations keyed by normalized topic (see [`normalize_topic`]).
const TOPIC_EXPLANATIONS: &[(&str, &str)] = &[
    (
        "present-simple",
        "Present Simple is used for habits, routines, and general truths.\n\n\
         Structure: Subject + base verb (add 's' for 3rd person singular)\n\
         Examples:\n\
         • I work every day.\n\
         • She works in an office.\n\
         • They like coffee.\n\
         • He doesn't like tea.",
    ),
    (
        "present-continuous",
        "Present Continuous is used for actions happening now or around now.\n\n\
         Structure: Subject + be (am/is/are) + verb + ing\n\
         Examples:\n\
         • I am working now.\n\
         • She is reading a book.\n\
         • They are studying English.\n\
         • We are not sleeping.",
    ),
    (
        "present-perfect",
        "Present Perfect is used for actions that started in the past and continue to the present.\n\n\
         Structure: Subject + have/has + past participle\n\
         Examples:\n\
         • I have worked here for 5 years.\n\
         • She has finished her homework.\n\
         • They have never been to Paris.\n\
         • We haven't seen that movie.",
    ),
    (
        "past-simple",
        "Past Simple is used for completed actions in the past.\n\n\
         Structure: Subject + past form of verb (regular: +ed, irregular: special form)\n\
         Examples:\n\
         • I worked yesterday.\n\
         • She went to the store.\n\
         • They studied all night.\n\
         • He didn't like the movie.",
    ),
    (
        "past-perfect",
        "Past Perfect is used for actions that happened before another past action.\n\n\
         Structure: Subject + had + past participle\n\
         Examples:\n\
         • I had finished my work before she arrived.\n\
         • She had already eaten when I called.\n\
         • They had never seen such a beautiful sunset.\n\
         • We hadn't met before the party.",
    ),
    (
        "future-simple",
        "Future Simple is used for predictions and spontaneous decisions.\n\n\
         Structure: Subject + will + base verb\n\
         Examples:\n\
         • I will help you with that.\n\
         • She will be here tomorrow.\n\
         • They will probably come to the party.\n\
         • We won't be late.",
    ),
    (
        "first-conditional",
        "First Conditional is used for real possibilities in the future.\n\n\
         Structure: If + present simple, will + base verb\n\
         Examples:\n\
         • If it rains, I will stay home.\n\
         • If you study hard, you will pass the exam.\n\
         • She will be happy if you call her.\n\
         • We will go to the beach if the weather is nice.",
    ),
    (
        "second-conditional",
        "Second Conditional is used for unreal or hypothetical situations.\n\n\
         Structure: If + past simple, would + base verb\n\
         Examples:\n\
         • If I had money, I would buy a car.\n\
         • If you studied more, you would get better grades.\n\
         • She would travel the world if she could.\n\
         • We would be rich if we won the lottery.",
    ),
    (
        "passive-voice",
        "Passive Voice is used when the focus is on the action, not the doer.\n\n\
         Structure: Subject + be + past participle (+ by + agent)\n\
         Examples:\n\
         • The book was written by Shakespeare.\n\
         • The house is being built.\n\
         • The letter has been sent.\n\
         • The car was stolen last night.",
    ),
];

/// Lowercase, trim and hyphenate a topic name: "Past Simple" → "past-simple".
pub fn normalize_topic(topic: &str) -> String {
    topic
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Canned explanation for a grammar topic, or the generic practice note.
pub fn topic_explanation(topic: &str) -> &'static str {
    let key = normalize_topic(topic);
    TOPIC_EXPLANATIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, text)| *text)
        .unwrap_or(GENERIC_EXPLANATION)
}

/// What the interpreter knows about the request that produced a reply.
#[derive(Debug, Clone, Copy)]
pub struct ReplyContext<'a> {
    pub original_sentence: &'a str,
    pub grammar_topic: &'a str,
}

/// Feedback conditions that trigger the canned override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackRule {
    /// Feedback is absent or blank.
    Missing,
    /// Marked correct, but the feedback says "incorrect".
    CorrectButSaysIncorrect,
    /// Marked incorrect, but the feedback mentions "correct".
    IncorrectButSaysCorrect,
}

/// Checked in order; the first match wins.
pub const FEEDBACK_RULES: [FeedbackRule; 3] = [
    FeedbackRule::Missing,
    FeedbackRule::CorrectButSaysIncorrect,
    FeedbackRule::IncorrectButSaysCorrect,
];

impl FeedbackRule {
    pub fn matches(self, is_correct: bool, feedback: Option<&str>) -> bool {
        let text = feedback.map(str::trim).unwrap_or_default();
        match self {
            FeedbackRule::Missing => text.is_empty(),
            FeedbackRule::CorrectButSaysIncorrect => {
                is_correct && text.to_lowercase().contains("incorrect")
            }
            // Note "incorrect" contains "correct", so any verdict word trips this.
            FeedbackRule::IncorrectButSaysCorrect => {
                !is_correct && text.to_lowercase().contains("correct")
            }
        }
    }

    /// Replacement feedback for a given verdict.
    pub fn canned_feedback(is_correct: bool) -> &'static str {
        if is_correct {
            CORRECT_FEEDBACK
        } else {
            NEEDS_WORK_FEEDBACK
        }
    }
}

/// First rule that rejects `feedback`, if any.
pub fn matching_rule(is_correct: bool, feedback: Option<&str>) -> Option<FeedbackRule> {
    FEEDBACK_RULES
        .into_iter()
        .find(|rule| rule.matches(is_correct, feedback))
}

/// Keep the reply's feedback unless a rule rejects it.
pub fn resolve_feedback(is_correct: bool, feedback: Option<String>) -> String {
    match matching_rule(is_correct, feedback.as_deref()) {
        Some(rule) => {
            tracing::warn!(?rule, "replacing generator feedback with canned text");
            FeedbackRule::canned_feedback(is_correct).to_string()
        }
        None => feedback.unwrap_or_default(),
    }
}

/// How a reply was resolved; useful for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation {
    /// The reply was a JSON object and every field came from it or a fallback.
    Structured,
    /// The reply was not a JSON object; the whole result is a fallback.
    Degraded,
}

/// Interpret a grammar-validation reply.
pub fn interpret(raw_reply: &str, context: ReplyContext<'_>) -> GrammarValidationResult {
    interpret_with_outcome(raw_reply, context).0
}

/// Like [`interpret`], also reporting whether the reply parsed.
pub fn interpret_with_outcome(
    raw_reply: &str,
    context: ReplyContext<'_>,
) -> (GrammarValidationResult, Interpretation) {
    let Some(fields) = parse_object(raw_reply) else {
        tracing::warn!(
            reply_len = raw_reply.len(),
            "generator reply is not a JSON object"
        );
        return (unparseable(context), Interpretation::Degraded);
    };

    let is_correct = fields.get("isCorrect").map(truthy).unwrap_or(false);
    let feedback = resolve_feedback(is_correct, text_field(&fields, "feedback"));

    let correction = if is_correct {
        Some(context.original_sentence.to_string())
    } else {
        text_field(&fields, "correction").filter(|c| !c.trim().is_empty())
    };

    let explanation = text_field(&fields, "explanation")
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| topic_explanation(context.grammar_topic).to_string());

    (
        GrammarValidationResult {
            is_correct,
            feedback,
            correction,
            explanation,
        },
        Interpretation::Structured,
    )
}

/// Result for a reply that could not be parsed at all.
pub fn unparseable(context: ReplyContext<'_>) -> GrammarValidationResult {
    GrammarValidationResult {
        is_correct: false,
        feedback: UNPARSEABLE_FEEDBACK.to_string(),
        correction: None,
        explanation: topic_explanation(context.grammar_topic).to_string(),
    }
}

/// Result used when the generator could not be reached.
pub fn unavailable() -> GrammarValidationResult {
    GrammarValidationResult {
        is_correct: false,
        feedback: UNAVAILABLE_FEEDBACK.to_string(),
        correction: None,
        explanation: UNAVAILABLE_EXPLANATION.to_string(),
    }
}

pub const TRANSLATION_CORRECT_FEEDBACK: &str = "The translation is correct.";
pub const TRANSLATION_INCORRECT_FEEDBACK: &str = "The translation is incorrect.";

/// Interpret a translation-verification reply.
pub fn interpret_translation(raw_reply: &str, user_translation: &str) -> TranslationVerification {
    let Some(fields) = parse_object(raw_reply) else {
        tracing::warn!(
            reply_len = raw_reply.len(),
            "translation reply is not a JSON object"
        );
        return translation_unverified();
    };

    let is_correct = fields.get("isCorrect").map(truthy).unwrap_or(false);
    let feedback = text_field(&fields, "feedback").filter(|f| !f.trim().is_empty());
    let explanation = text_field(&fields, "explanation").unwrap_or_default();

    if is_correct {
        TranslationVerification {
            is_correct,
            correct_translation: user_translation.to_string(),
            feedback: feedback.unwrap_or_else(|| TRANSLATION_CORRECT_FEEDBACK.to_string()),
            explanation,
        }
    } else {
        TranslationVerification {
            is_correct,
            correct_translation: text_field(&fields, "correctTranslation")
                .unwrap_or_else(|| user_translation.to_string()),
            feedback: feedback.unwrap_or_else(|| TRANSLATION_INCORRECT_FEEDBACK.to_string()),
            explanation,
        }
    }
}

/// Result for a translation reply that could not be parsed, or never came.
pub fn translation_unverified() -> TranslationVerification {
    TranslationVerification {
        is_correct: false,
        correct_translation: "Could not verify the translation".to_string(),
        feedback: "Verification failed".to_string(),
        explanation: "Try again or check the translation yourself.".to_string(),
    }
}

/// Parse a reply as a JSON object, unwrapping a markdown code fence first.
fn parse_object(raw_reply: &str) -> Option<Map<String, Value>> {
    let payload = extract_json_payload(raw_reply);
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Strip a surrounding ```json / ``` fence if the reply has one.
///
/// Models often wrap JSON in a fenced block despite being asked not to.
/// Replies without a fence are returned trimmed.
pub fn extract_json_payload(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json", "JSON", or nothing) up to the first newline.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => return trimmed,
    };
    // Truncated replies may lack the closing fence.
    let body = match body.rfind("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Read a field as text. Null and structured values count as absent.
fn text_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTENCE: &str = "She go to school every day.";

    fn ctx(topic: &str) -> ReplyContext<'_> {
        ReplyContext {
            original_sentence: SENTENCE,
            grammar_topic: topic,
        }
    }

    #[test]
    fn well_formed_incorrect_reply_is_kept() {
        let reply = r#"{
            "isCorrect": false,
            "feedback": "The verb must agree with the subject.",
            "correction": "She goes to school every day.",
            "explanation": "Third person singular takes -s."
        }"#;
        let (result, outcome) = interpret_with_outcome(reply, ctx("Present Simple"));
        assert_eq!(outcome, Interpretation::Structured);
        assert!(!result.is_correct);
        assert_eq!(result.feedback, "The verb must agree with the subject.");
        assert_eq!(
            result.correction.as_deref(),
            Some("She goes to school every day.")
        );
        assert_eq!(result.explanation, "Third person singular takes -s.");
    }

    #[test]
    fn contradictory_correct_reply_gets_canned_feedback() {
        let reply = r#"{"isCorrect":true,"feedback":"This is incorrect"}"#;
        let result = interpret(reply, ctx("Present Simple"));
        assert!(result.is_correct);
        assert_eq!(result.feedback, CORRECT_FEEDBACK);
        assert_eq!(result.correction.as_deref(), Some(SENTENCE));
    }

    #[test]
    fn resolve_feedback_replaces_only_rejected_text() {
        assert_eq!(
            resolve_feedback(true, Some("Not incorrect at all".into())),
            CORRECT_FEEDBACK
        );
        assert_eq!(resolve_feedback(false, None), NEEDS_WORK_FEEDBACK);
        assert_eq!(
            resolve_feedback(false, Some("Use the past form.".into())),
            "Use the past form."
        );
    }

    #[test]
    fn incorrect_reply_mentioning_correct_gets_canned_feedback() {
        let reply = r#"{"isCorrect":false,"feedback":"Almost correct!","correction":"Fixed."}"#;
        let result = interpret(reply, ctx("Past Simple"));
        assert_eq!(result.feedback, NEEDS_WORK_FEEDBACK);
        assert_eq!(result.correction.as_deref(), Some("Fixed."));
    }

    #[test]
    fn correct_reply_overrides_correction_with_original() {
        let reply = r#"{"isCorrect":true,"feedback":"Well done.","correction":"Something else."}"#;
        let result = interpret(reply, ctx("Present Simple"));
        assert_eq!(result.feedback, "Well done.");
        assert_eq!(result.correction.as_deref(), Some(SENTENCE));
    }

    #[test]
    fn incorrect_reply_without_correction_stays_absent() {
        let reply = r#"{"isCorrect":false,"feedback":"Use the third person form."}"#;
        let result = interpret(reply, ctx("Present Simple"));
        assert_eq!(result.correction, None);
    }

    #[test]
    fn missing_explanation_uses_topic_table() {
        let reply = r#"{"isCorrect":false,"feedback":"Check the verb."}"#;
        let result = interpret(reply, ctx("  passive   VOICE "));
        assert!(result.explanation.starts_with("Passive Voice is used"));

        let unknown = interpret(reply, ctx("Reported Speech"));
        assert_eq!(unknown.explanation, GENERIC_EXPLANATION);
    }

    #[test]
    fn garbage_reply_degrades() {
        let (result, outcome) =
            interpret_with_outcome("Sorry, I cannot help with that.", ctx("Past Perfect"));
        assert_eq!(outcome, Interpretation::Degraded);
        assert!(!result.is_correct);
        assert!(!result.feedback.is_empty());
        assert!(!result.explanation.is_empty());
        assert_eq!(result.correction, None);
        assert!(result.explanation.starts_with("Past Perfect"));
    }

    #[test]
    fn json_that_is_not_an_object_degrades() {
        let result = interpret("[true, \"ok\"]", ctx("Present Simple"));
        assert_eq!(result.feedback, UNPARSEABLE_FEEDBACK);
    }

    #[test]
    fn empty_object_resolves_every_field() {
        let result = interpret("{}", ctx("Modal Verbs"));
        assert!(!result.is_correct);
        assert_eq!(result.feedback, NEEDS_WORK_FEEDBACK);
        assert_eq!(result.correction, None);
        assert_eq!(result.explanation, GENERIC_EXPLANATION);
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        let reply = "```json\n{\"isCorrect\": true, \"feedback\": \"Nice work.\"}\n```";
        let result = interpret(reply, ctx("Present Simple"));
        assert!(result.is_correct);
        assert_eq!(result.feedback, "Nice work.");
    }

    #[test]
    fn string_verdict_is_accepted() {
        let reply = r#"{"isCorrect":"TRUE","feedback":"Good."}"#;
        assert!(interpret(reply, ctx("x")).is_correct);
        let reply = r#"{"isCorrect":1,"feedback":"Hmm."}"#;
        assert!(!interpret(reply, ctx("x")).is_correct);
    }

    #[test]
    fn null_fields_count_as_absent() {
        let reply = r#"{"isCorrect":false,"feedback":null,"correction":null,"explanation":null}"#;
        let result = interpret(reply, ctx("Future Simple"));
        assert_eq!(result.feedback, NEEDS_WORK_FEEDBACK);
        assert_eq!(result.correction, None);
        assert!(result.explanation.starts_with("Future Simple"));
    }

    #[test]
    fn rule_table_checks() {
        assert_eq!(matching_rule(true, None), Some(FeedbackRule::Missing));
        assert_eq!(matching_rule(false, Some("   ")), Some(FeedbackRule::Missing));
        assert_eq!(
            matching_rule(true, Some("That is INCORRECT.")),
            Some(FeedbackRule::CorrectButSaysIncorrect)
        );
        assert_eq!(
            matching_rule(false, Some("Not quite correct")),
            Some(FeedbackRule::IncorrectButSaysCorrect)
        );
        assert_eq!(matching_rule(true, Some("Correct, well done")), None);
        assert_eq!(matching_rule(false, Some("Check the tense.")), None);
    }

    #[test]
    fn normalizes_topics() {
        assert_eq!(normalize_topic(" Second  Conditional "), "second-conditional");
        assert!(topic_explanation("SECOND CONDITIONAL").starts_with("Second Conditional"));
    }

    #[test]
    fn extract_payload_variants() {
        assert_eq!(extract_json_payload("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(extract_json_payload("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json_payload("```json\n{\"a\":1}"), "{\"a\":1}");
        assert_eq!(extract_json_payload("```"), "```");
    }

    #[test]
    fn unavailable_result_is_complete() {
        let result = unavailable();
        assert!(!result.is_correct);
        assert_eq!(result.feedback, UNAVAILABLE_FEEDBACK);
        assert_eq!(result.explanation, UNAVAILABLE_EXPLANATION);
        assert!(result.correction.is_none());
    }

    #[test]
    fn translation_correct_uses_user_text() {
        let reply = r#"{"isCorrect":true,"correctTranslation":"Other","feedback":"","explanation":"Good."}"#;
        let result = interpret_translation(reply, "Mam psa.");
        assert!(result.is_correct);
        assert_eq!(result.correct_translation, "Mam psa.");
        assert_eq!(result.feedback, TRANSLATION_CORRECT_FEEDBACK);
        assert_eq!(result.explanation, "Good.");
    }

    #[test]
    fn translation_incorrect_uses_reply_text() {
        let reply = r#"{"isCorrect":false,"correctTranslation":"Mam psa.","feedback":"Wrong verb."}"#;
        let result = interpret_translation(reply, "Jestem psa.");
        assert!(!result.is_correct);
        assert_eq!(result.correct_translation, "Mam psa.");
        assert_eq!(result.feedback, "Wrong verb.");
        assert_eq!(result.explanation, "");
    }

    #[test]
    fn translation_garbage_degrades() {
        let result = interpret_translation("<html>502</html>", "anything");
        assert_eq!(result, translation_unverified());
    }
}
