//! Conversation sessions: a stateful dialogue with a generative model.
//!
//! The ingestion protocol needs the model to remember every data turn until
//! the end-of-data request arrives. [`ConversationSession`] captures exactly
//! that contract (`send(text) -> candidates`) and nothing vendor-specific, so
//! the pipeline runs unchanged against a scripted stub in tests.
//!
//! The default [`ProviderConversation`] sits on top of an
//! [`edgequake_llm::LLMProvider`]. Chat-completion APIs are stateless, so the
//! session keeps the history itself and replays it on every turn.

use crate::config::QuizConfig;
use crate::error::QuizError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Default model when the Gemini provider is picked from `GEMINI_API_KEY`.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// One alternative completion of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
}

/// Everything the model returned for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationReply {
    pub candidates: Vec<Candidate>,
}

impl ConversationReply {
    /// A reply with exactly one candidate.
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate { text: text.into() }],
        }
    }

    /// Text of the first candidate, the only one the pipeline reads.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates.first().map(|c| c.text.as_str())
    }
}

/// A stateful handle to a remote model dialogue.
///
/// Every message sent earlier in the same session is context for later ones.
pub trait ConversationSession: Send {
    fn send(
        &mut self,
        text: &str,
    ) -> impl Future<Output = Result<ConversationReply, QuizError>> + Send;
}

/// Opens one fresh [`ConversationSession`] per generation attempt.
pub trait ConversationFactory: Send + Sync {
    type Session: ConversationSession;

    fn open(&self) -> Result<Self::Session, QuizError>;
}

/// [`ConversationSession`] over an `edgequake-llm` provider.
pub struct ProviderConversation {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    history: Vec<ChatMessage>,
}

impl ProviderConversation {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
            history: Vec::new(),
        }
    }

    /// Number of messages (both sides) recorded so far.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl ConversationSession for ProviderConversation {
    async fn send(&mut self, text: &str) -> Result<ConversationReply, QuizError> {
        self.history.push(ChatMessage::user(text));

        let options = build_options(self.temperature, self.max_tokens);
        let response = match self.provider.chat(&self.history, Some(&options)).await {
            Ok(response) => response,
            Err(e) => {
                // Keep user/assistant turns paired for any later send.
                self.history.pop();
                return Err(QuizError::LlmApiError {
                    message: format!("{}", e),
                });
            }
        };

        debug!(
            "Turn {}: {} input tokens, {} output tokens, {} chars",
            self.history.len(),
            response.prompt_tokens,
            response.completion_tokens,
            response.content.len()
        );

        self.history.push(ChatMessage::assistant(response.content.as_str()));
        Ok(ConversationReply::single(response.content))
    }
}

/// Factory producing [`ProviderConversation`]s that share one provider.
#[derive(Clone)]
pub struct ProviderConversationFactory {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderConversationFactory {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &QuizConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Resolve the provider from `config` and the environment.
    pub fn from_config(config: &QuizConfig) -> Result<Self, QuizError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }
}

impl ConversationFactory for ProviderConversationFactory {
    type Session = ProviderConversation;

    fn open(&self) -> Result<ProviderConversation, QuizError> {
        Ok(ProviderConversation::new(
            Arc::clone(&self.provider),
            self.temperature,
            self.max_tokens,
        ))
    }
}

/// Build `CompletionOptions` for one turn.
fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, QuizError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        QuizError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`].
/// 3. **Environment pair** `PDFQUIZ_LLM_PROVIDER` + `PDFQUIZ_MODEL`.
/// 4. **Gemini** when `GEMINI_API_KEY` is set.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
///
/// Failing every step is fatal for generation only; nothing else in the
/// crate needs a provider.
pub fn resolve_provider(config: &QuizConfig) -> Result<Arc<dyn LLMProvider>, QuizError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("PDFQUIZ_LLM_PROVIDER"),
        std::env::var("PDFQUIZ_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("gemini", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| QuizError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
