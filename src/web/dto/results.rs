use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    engine::{BucketScores, QuestionResult},
    model::{DatabaseResult, entity::Attempt},
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResultsRequest {
    pub attempt_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ResultsResponse {
    pub attempt_id: Uuid,
    pub subtopic_id: Uuid,
    pub subtopic_title: Option<String>,
    pub score: u32,
    pub passed: bool,
    pub correct: u32,
    pub total: u32,
    pub buckets: BucketScores,
    pub results: Vec<QuestionResult>,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

impl ResultsResponse {
    pub fn new(attempt: &Attempt, subtopic_title: Option<String>) -> DatabaseResult<Self> {
        let report = attempt.report()?;
        Ok(Self {
            attempt_id: attempt.id(),
            subtopic_id: attempt.subtopic_id(),
            subtopic_title,
            score: report.score,
            passed: report.passed,
            correct: report.correct,
            total: report.total,
            buckets: report.buckets,
            results: report.results,
            feedback: attempt.feedback().to_string(),
            created_at: *attempt.created_at(),
        })
    }
}
