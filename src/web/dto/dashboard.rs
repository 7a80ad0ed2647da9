use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    DatabaseResult, ProgressStatus, TopicStatus,
    entity::{Attempt, ExitPoint, ResumeRow, SubtopicProgressRow, Topic, is_unlocked},
};

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
pub const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubtopicOverview {
    pub id: Uuid,
    pub title: String,
    pub order_index: i32,
    pub complexity_score: i32,
    pub status: ProgressStatus,
    pub unlocked: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TopicOverview {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub status: TopicStatus,
    pub completed_count: usize,
    pub total_count: usize,
    pub subtopics: Vec<SubtopicOverview>,
}

impl TopicOverview {
    /// Groups learning-order `rows` under `topics` and derives topic statuses.
    /// A topic without subtopics counts as completed.
    pub fn build(topics: Vec<Topic>, rows: &[SubtopicProgressRow]) -> DatabaseResult<Vec<Self>> {
        let mut overviews = Vec::with_capacity(topics.len());
        for topic in topics {
            let mut subtopics = Vec::new();
            for row in rows.iter().filter(|r| r.topic_id == topic.id()) {
                subtopics.push(SubtopicOverview {
                    id: row.subtopic_id,
                    title: row.title.clone(),
                    order_index: row.order_index,
                    complexity_score: row.complexity_score,
                    status: row.status()?,
                    unlocked: is_unlocked(rows, row.subtopic_id),
                });
            }

            let completed_count = subtopics
                .iter()
                .filter(|s| s.status == ProgressStatus::Completed)
                .count();

            overviews.push(Self {
                id: topic.id(),
                title: topic.title().to_string(),
                description: topic.description().to_string(),
                order_index: topic.order_index(),
                status: TopicStatus::Locked,
                completed_count,
                total_count: subtopics.len(),
                subtopics,
            });
        }

        let completed: Vec<bool> = overviews
            .iter()
            .map(|t| t.completed_count == t.total_count)
            .collect();
        for (overview, status) in overviews.iter_mut().zip(TopicStatus::derive(&completed)) {
            overview.status = status;
        }

        Ok(overviews)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl HistoryQuery {
    /// `(limit, offset)` with defaults applied, or a reason they are invalid.
    pub fn resolve(&self) -> Result<(i64, i64), String> {
        let limit = self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        let offset = self.offset.unwrap_or(0);
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {MAX_HISTORY_LIMIT}"));
        }
        if offset < 0 {
            return Err(String::from("offset must not be negative"));
        }
        Ok((limit, offset))
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AttemptSummary {
    pub id: Uuid,
    pub subtopic_id: Uuid,
    pub subtopic_title: Option<String>,
    pub score: i32,
    pub passed: bool,
    pub correct: u32,
    pub total: u32,
    pub created_at: DateTime<Utc>,
}

impl AttemptSummary {
    pub fn new(attempt: &Attempt, subtopic_title: Option<String>) -> DatabaseResult<Self> {
        let report = attempt.report()?;
        Ok(Self {
            id: attempt.id(),
            subtopic_id: attempt.subtopic_id(),
            subtopic_title,
            score: attempt.score(),
            passed: attempt.passed(),
            correct: report.correct,
            total: report.total,
            created_at: *attempt.created_at(),
        })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ResumePoint {
    pub topic_id: Uuid,
    pub topic_title: String,
    pub subtopic_id: Uuid,
    pub subtopic_title: String,
    pub exit_point: Option<ExitPoint>,
    pub has_pending_checkpoint: bool,
    pub updated_at: DateTime<Utc>,
}

impl ResumePoint {
    pub fn from_row(row: ResumeRow) -> DatabaseResult<Self> {
        let exit_point = row.exit_point()?;
        Ok(Self {
            topic_id: row.topic_id,
            topic_title: row.topic_title,
            subtopic_id: row.subtopic_id,
            subtopic_title: row.subtopic_title,
            exit_point,
            has_pending_checkpoint: row.has_checkpoint,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct StartTopicRequest {
    pub topic_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StartTopicResponse {
    pub topic_id: Uuid,
    pub subtopic_id: Uuid,
    pub subtopic_title: String,
    pub status: ProgressStatus,
}
