//! Output types: the question model and generation results.

use crate::error::ReplyError;
use serde::{Deserialize, Serialize};

/// One multiple-choice question as produced by the model.
///
/// The wire shape is exactly the object the generation request asks for:
/// `{"question": ..., "choices": [...], "answer": ...}`. `answer` must be
/// one of `choices` verbatim; [`crate::pipeline::parse`] rejects replies
/// where it is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub choices: Vec<String>,
    pub answer: String,
}

impl Question {
    pub fn new(
        question: impl Into<String>,
        choices: Vec<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            choices,
            answer: answer.into(),
        }
    }

    /// Index of the correct choice, if the answer is among the choices.
    pub fn answer_index(&self) -> Option<usize> {
        self.choices.iter().position(|c| *c == self.answer)
    }

    /// Whether picking `choice` answers this question correctly.
    pub fn is_correct(&self, choice: usize) -> bool {
        self.choices
            .get(choice)
            .is_some_and(|text| *text == self.answer)
    }
}

/// Result of a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Validated questions in the order the model returned them.
    pub questions: Vec<Question>,
    pub stats: GenerationStats,
}

/// Per-run accounting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Files whose text was sent to the conversation.
    pub files_sent: usize,
    /// Pages extracted across all files.
    pub pages_extracted: usize,
    /// Bytes of page text sent across all data turns.
    pub chars_sent: usize,
    /// End-of-data requests issued, including the successful one.
    pub attempts: u32,
    /// Why each unsuccessful attempt was rejected, in order.
    pub failed_attempts: Vec<ReplyError>,
    /// Time spent extracting text.
    pub extract_duration_ms: u64,
    /// Time spent in conversation turns.
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capital() -> Question {
        Question::new(
            "Capital of France?",
            vec!["Berlin".into(), "Paris".into(), "Rome".into()],
            "Paris",
        )
    }

    #[test]
    fn answer_index_finds_verbatim_match() {
        assert_eq!(capital().answer_index(), Some(1));

        let mut q = capital();
        q.answer = "paris".into();
        assert_eq!(q.answer_index(), None);
    }

    #[test]
    fn is_correct_checks_text() {
        let q = capital();
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
        assert!(!q.is_correct(7));
    }

    #[test]
    fn deserialises_wire_shape() {
        let q: Question = serde_json::from_str(
            r#"{"question":"2+2?","choices":["3","4"],"answer":"4"}"#,
        )
        .expect("valid question json");
        assert_eq!(q.choices.len(), 2);
        assert_eq!(q.answer_index(), Some(1));
    }
}
