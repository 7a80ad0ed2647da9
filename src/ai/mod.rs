//! Generative-AI helpers for checkpoint feedback and short-answer validation.
//!
//! Every call here is optional: failures are logged and the caller falls back
//! to the local heuristics, the learner never sees an AI error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::Ai as AiConfig;
use crate::engine::{BucketScores, QuestionKind, QuestionSet, ScoreReport};

mod error;
pub use error::{AiError, AiResult};

mod gemini;
pub use gemini::GeminiClient;

pub mod fallback;

#[derive(Debug, Clone)]
pub struct FeedbackRequest {
    pub subtopic_title: String,
    pub score: u32,
    pub passed: bool,
    pub buckets: BucketScores,
    /// Prompts of the questions answered incorrectly.
    pub missed: Vec<String>,
}

impl FeedbackRequest {
    pub fn from_report(subtopic_title: &str, report: &ScoreReport) -> Self {
        Self {
            subtopic_title: subtopic_title.to_string(),
            score: report.score,
            passed: report.passed,
            buckets: report.buckets,
            missed: report
                .results
                .iter()
                .filter(|r| !r.is_correct)
                .map(|r| r.prompt.clone())
                .collect(),
        }
    }
}

#[async_trait]
pub trait AiProvider: Send + Sync + std::fmt::Debug {
    async fn feedback(&self, request: &FeedbackRequest) -> AiResult<String>;
    async fn semantic_match(&self, question: &str, expected: &str, answer: &str) -> AiResult<bool>;
}

#[derive(Debug, Clone, Default)]
pub struct DisabledAi;

#[async_trait]
impl AiProvider for DisabledAi {
    async fn feedback(&self, _request: &FeedbackRequest) -> AiResult<String> {
        Err(AiError::Disabled)
    }

    async fn semantic_match(&self, _q: &str, _e: &str, _a: &str) -> AiResult<bool> {
        Err(AiError::Disabled)
    }
}

pub fn provider_from_config(config: &AiConfig) -> Arc<dyn AiProvider> {
    if !config.enabled() || config.api_key().is_empty() {
        tracing::info!("ai service disabled, using local heuristics");
        return Arc::new(DisabledAi);
    }

    match GeminiClient::new(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            crate::error::log_error(&e);
            Arc::new(DisabledAi)
        }
    }
}

/// Asks the provider about every answered short-answer question. Questions
/// the provider could not judge are left out, so scoring uses the heuristic.
#[tracing::instrument(skip_all)]
pub async fn semantic_verdicts(
    ai: &dyn AiProvider,
    set: &QuestionSet,
    answers: &HashMap<Uuid, String>,
) -> HashMap<Uuid, bool> {
    let mut verdicts = HashMap::new();

    for question in set.questions.iter().filter(|q| q.kind == QuestionKind::ShortAnswer) {
        let Some(answer) = answers.get(&question.id).filter(|a| !a.trim().is_empty()) else {
            continue;
        };

        match ai
            .semantic_match(&question.prompt, &question.correct_answer, answer)
            .await
        {
            Ok(verdict) => {
                verdicts.insert(question.id, verdict);
            }
            Err(AiError::Disabled) => break,
            Err(e) => {
                tracing::warn!("semantic validation failed, using heuristic: {}", e);
            }
        }
    }

    verdicts
}

/// Provider feedback, or the local template when the provider fails.
#[tracing::instrument(skip_all)]
pub async fn feedback_or_fallback(ai: &dyn AiProvider, request: &FeedbackRequest) -> String {
    match ai.feedback(request).await {
        Ok(text) => text,
        Err(AiError::Disabled) => fallback::local_feedback(request),
        Err(e) => {
            tracing::warn!("feedback generation failed, using local feedback: {}", e);
            fallback::local_feedback(request)
        }
    }
}
