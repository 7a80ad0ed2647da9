use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{BucketScores, Difficulty, Distribution, PublicQuestion, QuestionResult, QuestionSet, ScoreReport};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GenerateCheckpointRequest {
    pub subtopic_id: Uuid,
    /// Discard a pending checkpoint instead of resuming it.
    #[serde(default)]
    pub regenerate: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GenerateCheckpointResponse {
    pub subtopic_id: Uuid,
    pub count: u32,
    pub distribution: Distribution,
    pub difficulty_curve: Vec<Difficulty>,
    pub questions: Vec<PublicQuestion>,
    /// Whole-question modifier from the latest reading signals.
    pub adaptation_modifier: i32,
    /// True when a pending checkpoint was returned instead of a new one.
    pub resumed: bool,
}

impl GenerateCheckpointResponse {
    pub fn new(subtopic_id: Uuid, set: &QuestionSet, adaptation_modifier: i32, resumed: bool) -> Self {
        Self {
            subtopic_id,
            count: set.count,
            distribution: set.distribution,
            difficulty_curve: set.difficulty_curve.clone(),
            questions: set.public_questions(),
            adaptation_modifier,
            resumed,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitCheckpointRequest {
    pub subtopic_id: Uuid,
    /// Question id to answer text. Unanswered questions may be left out.
    #[serde(default)]
    pub answers: HashMap<Uuid, String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubmitCheckpointResponse {
    pub attempt_id: Uuid,
    pub score: u32,
    pub passed: bool,
    pub correct: u32,
    pub total: u32,
    pub buckets: BucketScores,
    pub results: Vec<QuestionResult>,
    pub feedback: String,
    /// Next subtopic in learning order, when there is one.
    pub next_subtopic_id: Option<Uuid>,
}

impl SubmitCheckpointResponse {
    pub fn new(attempt_id: Uuid, report: ScoreReport, feedback: String, next_subtopic_id: Option<Uuid>) -> Self {
        Self {
            attempt_id,
            score: report.score,
            passed: report.passed,
            correct: report.correct,
            total: report.total,
            buckets: report.buckets,
            results: report.results,
            feedback,
            next_subtopic_id,
        }
    }
}
