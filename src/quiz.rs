//! Quiz presentation state machine.
//!
//! [`QuizSession`] walks one generated question list: it records one choice
//! per question, only moves forward past answered questions, scores the run
//! once the last answer is in, and can restart with a fresh shuffle.
//!
//! [`QuizApp`] is the typed container for the whole front end: either the
//! user is assembling an upload batch ([`Screen::Creating`]) or playing a
//! quiz ([`Screen::Presenting`]). Nothing here renders anything, so every
//! transition is unit-testable without a terminal.
//!
//! ```text
//! Creating ──generate ok──▶ Presenting[0] ──select/advance──▶ … ──▶ Completed
//!    ▲  └─generate err (batch kept)                              │   │
//!    └───────────────────────── new_quiz ────────────────────────┘   │
//!                               Presenting[0] (shuffled) ◀── redo ───┘
//! ```

use crate::cancel::CancelToken;
use crate::config::QuizConfig;
use crate::error::QuizError;
use crate::generate::generate_with;
use crate::output::{GenerationStats, Question};
use crate::pipeline::conversation::ConversationFactory;
use crate::pipeline::extract::TextExtractor;
use crate::upload::UploadBatch;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Where a session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Viewing a question with no recorded choice.
    Unanswered,
    /// Viewing a question with a recorded choice.
    Answered,
    /// Past the last question; results are available.
    Completed,
}

/// Correct answers out of total questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    /// `correct / total`, or 0.0 for an empty quiz.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "You scored {} out of {} questions correctly.",
            self.correct, self.total
        )
    }
}

/// One line of the results review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: String,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub correct: bool,
}

/// Progress through one question list.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    answers: Vec<Option<usize>>,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            questions,
            current: 0,
            answers,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 0-indexed position; equals [`len`](Self::len) once completed.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Recorded choice per question, in question order.
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn state(&self) -> SessionState {
        if self.current >= self.questions.len() {
            SessionState::Completed
        } else if self.answers[self.current].is_some() {
            SessionState::Answered
        } else {
            SessionState::Unanswered
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state() == SessionState::Completed
    }

    /// The question being viewed, or `None` once completed.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// The visible selection for the current question.
    pub fn selected(&self) -> Option<usize> {
        self.answers.get(self.current).copied().flatten()
    }

    /// 1-indexed `(position, total)` for an "i / N" label.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current_question()
            .map(|_| (self.current + 1, self.questions.len()))
    }

    /// Fraction of the progress bar to fill while viewing a question.
    pub fn progress(&self) -> f64 {
        match self.position() {
            Some((pos, total)) => pos as f64 / total as f64,
            None => 1.0,
        }
    }

    /// Record `choice` for the current question.
    ///
    /// Returns `false` (and changes nothing) when completed or when `choice`
    /// is not one of the current question's choices.
    pub fn select_choice(&mut self, choice: usize) -> bool {
        let Some(question) = self.questions.get(self.current) else {
            return false;
        };
        if choice >= question.choices.len() {
            return false;
        }
        self.answers[self.current] = Some(choice);
        true
    }

    pub fn can_advance(&self) -> bool {
        self.state() == SessionState::Answered
    }

    pub fn can_retreat(&self) -> bool {
        self.current > 0
    }

    /// Move to the next question; a no-op unless the current one is answered.
    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        self.current += 1;
        if self.is_completed() {
            debug!("Quiz completed");
        }
        true
    }

    /// Move to the previous question, restoring its recorded choice.
    pub fn retreat(&mut self) -> bool {
        if !self.can_retreat() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Score the run; `None` until completed.
    pub fn score(&self) -> Option<Score> {
        if !self.is_completed() {
            return None;
        }
        let correct = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| a.is_some_and(|choice| q.is_correct(choice)))
            .count();
        Some(Score {
            correct,
            total: self.questions.len(),
        })
    }

    /// Per-question review; `None` until completed.
    pub fn results(&self) -> Option<Vec<QuestionResult>> {
        if !self.is_completed() {
            return None;
        }
        Some(
            self.questions
                .iter()
                .zip(&self.answers)
                .map(|(q, a)| QuestionResult {
                    question: q.question.clone(),
                    your_answer: a.and_then(|choice| q.choices.get(choice).cloned()),
                    correct_answer: q.answer.clone(),
                    correct: a.is_some_and(|choice| q.is_correct(choice)),
                })
                .collect(),
        )
    }

    /// Restart a completed quiz in a new random order.
    pub fn redo(&mut self) -> bool {
        self.redo_with(&mut rand::thread_rng())
    }

    /// [`redo`](Self::redo) with a caller-supplied RNG.
    pub fn redo_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.is_completed() {
            return false;
        }
        self.questions.shuffle(rng);
        self.current = 0;
        self.answers = vec![None; self.questions.len()];
        true
    }
}

/// The screen the front end is showing.
#[derive(Debug, Clone)]
pub enum Screen {
    /// Assembling files and parameters for a new quiz.
    Creating(UploadBatch),
    /// Playing (or reviewing) a generated quiz.
    Presenting(QuizSession),
}

/// Typed state container for the whole front end.
#[derive(Debug, Clone)]
pub struct QuizApp {
    screen: Screen,
    max_files: usize,
    max_file_size: u64,
}

impl QuizApp {
    /// Start in [`Screen::Creating`] with an empty batch limited by `config`.
    pub fn new(config: &QuizConfig) -> Self {
        Self {
            screen: Screen::Creating(UploadBatch::from_config(config)),
            max_files: config.max_files,
            max_file_size: config.max_file_size,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn is_creating(&self) -> bool {
        matches!(self.screen, Screen::Creating(_))
    }

    pub fn batch(&self) -> Option<&UploadBatch> {
        match &self.screen {
            Screen::Creating(batch) => Some(batch),
            Screen::Presenting(_) => None,
        }
    }

    pub fn batch_mut(&mut self) -> Option<&mut UploadBatch> {
        match &mut self.screen {
            Screen::Creating(batch) => Some(batch),
            Screen::Presenting(_) => None,
        }
    }

    pub fn session(&self) -> Option<&QuizSession> {
        match &self.screen {
            Screen::Presenting(session) => Some(session),
            Screen::Creating(_) => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut QuizSession> {
        match &mut self.screen {
            Screen::Presenting(session) => Some(session),
            Screen::Creating(_) => None,
        }
    }

    /// Whether a generate request would be accepted right now.
    pub fn can_generate(&self) -> bool {
        self.batch().is_some_and(|b| !b.is_empty())
    }

    /// Run the ingestion pipeline on the current batch.
    ///
    /// On success the batch is discarded and the app shows the new quiz at
    /// question 1. On failure the app stays in [`Screen::Creating`] with the
    /// batch untouched so the user can retry.
    pub async fn generate<F, X>(
        &mut self,
        config: &QuizConfig,
        factory: &F,
        extractor: &X,
        cancel: &CancelToken,
    ) -> Result<GenerationStats, QuizError>
    where
        F: ConversationFactory,
        X: TextExtractor,
    {
        let Screen::Creating(batch) = &self.screen else {
            return Err(QuizError::WrongMode {
                expected: "creating",
            });
        };

        let output = generate_with(batch, config, factory, extractor, cancel).await?;
        self.start_quiz(output.questions);
        Ok(output.stats)
    }

    /// Switch to [`Screen::Presenting`] with `questions`.
    pub fn start_quiz(&mut self, questions: Vec<Question>) {
        info!("Starting quiz with {} questions", questions.len());
        self.screen = Screen::Presenting(QuizSession::new(questions));
    }

    /// Drop the current quiz and go back to an empty batch.
    pub fn new_quiz(&mut self) {
        self.screen = Screen::Creating(UploadBatch::new(self.max_files, self.max_file_size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn q(n: usize) -> Question {
        Question::new(
            format!("Question {n}?"),
            vec![format!("right {n}"), format!("wrong {n}"), "other".into()],
            format!("right {n}"),
        )
    }

    fn quiz(len: usize) -> QuizSession {
        QuizSession::new((0..len).map(q).collect())
    }

    fn answer_all(session: &mut QuizSession, choice: usize) {
        while !session.is_completed() {
            assert!(session.select_choice(choice));
            assert!(session.advance());
        }
    }

    #[test]
    fn starts_unanswered_at_zero() {
        let s = quiz(3);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.state(), SessionState::Unanswered);
        assert_eq!(s.position(), Some((1, 3)));
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn advance_is_noop_when_unanswered() {
        let mut s = quiz(3);
        assert!(!s.advance());
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn select_is_idempotent_and_does_not_advance() {
        let mut s = quiz(3);
        assert!(s.select_choice(1));
        assert!(s.select_choice(1));
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.selected(), Some(1));
        assert_eq!(s.state(), SessionState::Answered);
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let mut s = quiz(1);
        assert!(!s.select_choice(3));
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn retreat_restores_previous_answer() {
        let mut s = quiz(3);
        s.select_choice(2);
        s.advance();
        assert_eq!(s.selected(), None);
        assert!(s.retreat());
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.selected(), Some(2));
    }

    #[test]
    fn retreat_stops_at_zero() {
        let mut s = quiz(2);
        assert!(!s.retreat());
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn completes_after_last_answer() {
        let mut s = quiz(2);
        assert_eq!(s.score(), None);
        answer_all(&mut s, 0);
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.current_index(), 2);
        assert_eq!(s.current_question(), None);
        assert!(!s.select_choice(0));
        assert!(!s.advance());
    }

    #[test]
    fn all_correct_five_question_run() {
        let mut s = quiz(5);
        answer_all(&mut s, 0);
        let score = s.score().expect("completed");
        assert_eq!(score, Score { correct: 5, total: 5 });
        assert_eq!(score.ratio(), 1.0);
    }

    #[test]
    fn mixed_run_counts_matching_text() {
        let mut s = quiz(4);
        for choice in [0, 1, 0, 2] {
            s.select_choice(choice);
            s.advance();
        }
        let score = s.score().expect("completed");
        assert_eq!(score.correct, 2);
        assert_eq!(score.ratio(), 0.5);
        assert_eq!(score.to_string(), "You scored 2 out of 4 questions correctly.");
    }

    #[test]
    fn results_review_each_question() {
        let mut s = quiz(2);
        s.select_choice(1);
        s.advance();
        s.select_choice(0);
        s.advance();

        let results = s.results().expect("completed");
        assert_eq!(results[0].your_answer.as_deref(), Some("wrong 0"));
        assert_eq!(results[0].correct_answer, "right 0");
        assert!(!results[0].correct);
        assert!(results[1].correct);
    }

    #[test]
    fn redo_preserves_questions_and_clears_answers() {
        let mut s = quiz(6);
        let mut original: Vec<Question> = s.questions().to_vec();
        original.sort_by(|a, b| a.question.cmp(&b.question));

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2 {
            answer_all(&mut s, 1);
            assert!(s.redo_with(&mut rng));

            assert_eq!(s.current_index(), 0);
            assert!(s.answers().iter().all(Option::is_none));
            assert_eq!(s.state(), SessionState::Unanswered);

            let mut now: Vec<Question> = s.questions().to_vec();
            now.sort_by(|a, b| a.question.cmp(&b.question));
            assert_eq!(now, original);
        }
    }

    #[test]
    fn redo_requires_completion() {
        let mut s = quiz(2);
        s.select_choice(0);
        assert!(!s.redo());
        assert_eq!(s.selected(), Some(0));
    }

    #[test]
    fn progress_fraction() {
        let mut s = quiz(4);
        assert_eq!(s.progress(), 0.25);
        s.select_choice(0);
        s.advance();
        assert_eq!(s.progress(), 0.5);
    }

    #[test]
    fn app_transitions() {
        let config = QuizConfig::default();
        let mut app = QuizApp::new(&config);
        assert!(app.is_creating());
        assert!(!app.can_generate());

        app.start_quiz(vec![q(0), q(1)]);
        assert!(!app.is_creating());
        assert!(app.batch().is_none());
        assert_eq!(app.session().map(QuizSession::current_index), Some(0));

        app.new_quiz();
        let batch = app.batch().expect("creating");
        assert!(batch.is_empty());
        assert_eq!(batch.max_files(), 5);
    }
}
