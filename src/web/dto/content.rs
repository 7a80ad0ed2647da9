use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    engine::{Adaptation, ReadingSignals},
    model::{
        DatabaseResult, ProgressStatus,
        entity::{ExitPoint, Subtopic, UserProgress},
    },
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ContentRequest {
    pub subtopic_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubtopicContent {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub title: String,
    /// Markdown body
    pub content: String,
    pub order_index: i32,
    pub complexity_score: i32,
}

impl From<Subtopic> for SubtopicContent {
    fn from(s: Subtopic) -> Self {
        Self {
            id: s.id(),
            topic_id: s.topic_id(),
            title: s.title().to_string(),
            content: s.content().to_string(),
            order_index: s.order_index(),
            complexity_score: s.complexity_score(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgressView {
    pub status: ProgressStatus,
    pub exit_point: Option<ExitPoint>,
    pub has_pending_checkpoint: bool,
}

impl ProgressView {
    pub fn from_row(row: &UserProgress) -> DatabaseResult<Self> {
        Ok(Self {
            status: row.status()?,
            exit_point: row.exit_point()?,
            has_pending_checkpoint: row.has_checkpoint(),
        })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ContentResponse {
    pub subtopic: SubtopicContent,
    pub progress: ProgressView,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SaveContentProgressRequest {
    pub subtopic_id: Uuid,
    /// Scroll offset
    pub position: i64,
    /// Client clock, milliseconds since the epoch
    pub timestamp: i64,
    pub signals: ReadingSignals,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SaveContentProgressResponse {
    /// False when a newer exit point was already stored.
    pub saved: bool,
    pub adaptation: Adaptation,
}
