//! Reply parsing: turn the model's final answer into validated questions.
//!
//! Models routinely wrap JSON in a ```` ```json ```` fence even when told to
//! output only the array. Every back-tick is removed and a leftover `json`
//! language tag is dropped before deserialising. Validation then enforces
//! what the request asked for; any violation is a [`ReplyError`], which the
//! pipeline treats like malformed JSON and retries.

use crate::config::MAX_CHOICES;
use crate::error::ReplyError;
use crate::output::Question;
use crate::pipeline::conversation::ConversationReply;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_LANGUAGE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?i:json)\s*").unwrap());

/// Parse the first candidate of `reply` into a validated question list.
pub fn parse_reply(reply: &ConversationReply) -> Result<Vec<Question>, ReplyError> {
    let text = reply.first_text().ok_or(ReplyError::NoCandidates)?;
    parse_questions(text)
}

/// Parse raw reply text into a validated question list.
pub fn parse_questions(text: &str) -> Result<Vec<Question>, ReplyError> {
    let cleaned = strip_code_fences(text);

    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| ReplyError::Json(e.to_string()))?;
    if !value.is_array() {
        return Err(ReplyError::NotAnArray);
    }

    let questions: Vec<Question> =
        serde_json::from_value(value).map_err(|e| ReplyError::Json(e.to_string()))?;
    validate_questions(&questions)?;
    Ok(questions)
}

/// Remove fence markup: every back-tick, then a leading `json` tag.
pub fn strip_code_fences(text: &str) -> String {
    let without_ticks = text.replace('`', "");
    RE_LANGUAGE_TAG
        .replace(&without_ticks, "")
        .trim()
        .to_string()
}

/// Check every question against the shape the request asked for.
///
/// The list must be non-empty; each question needs text, 2–4 choices and an
/// answer present verbatim among its choices.
pub fn validate_questions(questions: &[Question]) -> Result<(), ReplyError> {
    if questions.is_empty() {
        return Err(ReplyError::Empty);
    }

    for (index, q) in questions.iter().enumerate() {
        if q.question.trim().is_empty() {
            return Err(ReplyError::EmptyQuestion { index });
        }
        if q.choices.len() > MAX_CHOICES {
            return Err(ReplyError::TooManyChoices {
                index,
                count: q.choices.len(),
                max: MAX_CHOICES,
            });
        }
        if q.choices.len() < 2 {
            return Err(ReplyError::TooFewChoices {
                index,
                count: q.choices.len(),
            });
        }
        if q.answer_index().is_none() {
            return Err(ReplyError::AnswerNotInChoices {
                index,
                answer: q.answer.clone(),
            });
        }
    }

    Ok(())
}
