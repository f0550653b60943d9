//! Conversation prompts for the ingestion protocol.
//!
//! The protocol has exactly two fixed texts: the priming instruction that
//! opens every conversation, and the end-of-data request that closes the
//! bulk-ingestion turns and asks for the quiz. Both live here so tests can
//! inspect them without a model.

use crate::config::{Difficulty, MAX_CHOICES};

/// In-band marker that ends the data turns.
pub const END_OF_DATA_MARKER: &str = " END OF DATA ";

/// First message of every conversation.
///
/// Tells the model that bulk data follows and that it must stay silent until
/// the end-of-data marker arrives. Whatever the model replies is discarded.
pub const PRIMING_PROMPT: &str = "I will feed you large volume of data, please digest them and DO NOT reply me until I say ' END OF DATA '";

/// Build the end-of-data request for the given question count and difficulty.
///
/// The same text is re-sent unchanged on every retry.
pub fn generation_request(question_count: usize, difficulty: Difficulty) -> String {
    format!(
        "{END_OF_DATA_MARKER}\n\
Generate a quiz based on all the data I have fed you, according to the following specifications:\n\
- number of questions: {question_count}\n\
- difficulty: {difficulty}\n\
- maximum number of choices: {MAX_CHOICES}\n\
Output should (only) be an array of objects with keys 'question', 'choices', and 'answer'."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_starts_with_marker() {
        let req = generation_request(3, Difficulty::Easy);
        assert!(req.starts_with(END_OF_DATA_MARKER));
    }

    #[test]
    fn request_carries_parameters() {
        let req = generation_request(12, Difficulty::Hard);
        assert!(req.contains("number of questions: 12"));
        assert!(req.contains("difficulty: hard"));
        assert!(req.contains("maximum number of choices: 4"));
        assert!(req.contains("'question', 'choices', and 'answer'"));
    }

    #[test]
    fn priming_names_the_marker() {
        assert!(PRIMING_PROMPT.contains(END_OF_DATA_MARKER.trim()));
    }
}
