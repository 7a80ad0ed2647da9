use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::ai::{AiError, AiProvider, AiResult, FeedbackRequest};
use crate::config::Ai as AiConfig;

const FEEDBACK_TEMPERATURE: f64 = 0.3;
const VALIDATION_TEMPERATURE: f64 = 0.1;

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> AiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            api_key: config.api_key().to_string(),
        })
    }

    #[tracing::instrument(skip(self, prompt))]
    async fn generate(&self, prompt: &str, temperature: f64, max_tokens: u32) -> AiResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_tokens,
            }
        });

        tracing::debug!("sending request to {}", url);
        let res = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(AiError::BadStatus { status, body });
        }

        let body: Value = res.json().await?;
        extract_text(&body)
    }
}

fn extract_text(body: &Value) -> AiResult<String> {
    body.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AiError::UnexpectedResponse(body.to_string()))
}

/// Keeps at most the first two sentences.
pub(crate) fn two_sentences(text: &str) -> String {
    let mut out = String::new();
    let mut sentences = 0;
    for c in text.trim().chars() {
        out.push(c);
        if matches!(c, '.' | '!' | '?') {
            sentences += 1;
            if sentences == 2 {
                break;
            }
        }
    }
    out.trim().to_string()
}

pub(crate) fn parse_verdict(text: &str) -> AiResult<bool> {
    let verdict = text.trim().to_lowercase();
    if verdict.starts_with("true") || verdict.starts_with("yes") {
        Ok(true)
    } else if verdict.starts_with("false") || verdict.starts_with("no") {
        Ok(false)
    } else {
        Err(AiError::UnexpectedResponse(text.to_string()))
    }
}

fn feedback_prompt(req: &FeedbackRequest) -> String {
    let missed = if req.missed.is_empty() {
        String::from("none")
    } else {
        req.missed.join("; ")
    };

    format!(
        "You are a supportive tutor. A learner finished a checkpoint on \"{topic}\" \
         and scored {score}/100 ({status}). Foundation: {f}%, application: {a}%, synthesis: {s}%. \
         Questions they missed: {missed}.\n\
         Write exactly two sentences of feedback: first what went well, then one concrete next step. \
         No lists, no headings.",
        topic = req.subtopic_title,
        score = req.score,
        status = if req.passed { "passed" } else { "not passed" },
        f = req.buckets.foundation.percent,
        a = req.buckets.application.percent,
        s = req.buckets.synthesis.percent,
    )
}

fn validation_prompt(question: &str, expected: &str, answer: &str) -> String {
    format!(
        "Question: {question}\nReference answer: {expected}\nLearner answer: {answer}\n\
         Does the learner answer express the same meaning as the reference answer? \
         Reply with a single word: true or false."
    )
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn feedback(&self, request: &FeedbackRequest) -> AiResult<String> {
        let text = self
            .generate(&feedback_prompt(request), FEEDBACK_TEMPERATURE, 200)
            .await?;
        Ok(two_sentences(&text))
    }

    async fn semantic_match(&self, question: &str, expected: &str, answer: &str) -> AiResult<bool> {
        let text = self
            .generate(&validation_prompt(question, expected, answer), VALIDATION_TEMPERATURE, 5)
            .await?;
        parse_verdict(&text)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extract_text_from_candidates() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "  True \n" }] } }]
        });
        assert_eq!(extract_text(&body).unwrap(), "True");

        let empty = json!({ "candidates": [] });
        assert!(matches!(extract_text(&empty), Err(AiError::UnexpectedResponse(_))));
    }

    #[test]
    fn verdicts() {
        assert!(parse_verdict("true").unwrap());
        assert!(parse_verdict(" Yes, it matches").unwrap());
        assert!(!parse_verdict("FALSE.").unwrap());
        assert!(parse_verdict("maybe").is_err());
    }

    #[test]
    fn feedback_is_cut_to_two_sentences() {
        assert_eq!(
            two_sentences("Great work. Review the basics! Also extra. More."),
            "Great work. Review the basics!"
        );
        assert_eq!(two_sentences("One sentence only"), "One sentence only");
    }
}
