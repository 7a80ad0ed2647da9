use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, ProgressStatus, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Topic {
    id: Uuid,
    title: String,
    description: String,
    order_index: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TopicCreate {
    pub title: String,
    pub description: String,
    pub order_index: Option<i32>,
}

impl ResourceTyped for Topic {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Topic
    }
}

impl Topic {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

impl Topic {
    pub async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: TopicCreate,
    ) -> DatabaseResult<Self> {
        let topic = sqlx::query_as(
            r#"
            INSERT INTO topics (id, title, description, order_index)
            VALUES ($1,$2,$3,$4)
            RETURNING id, title, description, order_index
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.order_index.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;

        Ok(topic)
    }

    /// Every topic in learning order.
    pub async fn all(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM topics ORDER BY order_index, title")
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_by_title(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        title: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM topics WHERE title = $1")
            .bind(title)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

// Utils

/// One subtopic of a topic joined with the actor's progress on it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubtopicProgressRow {
    pub topic_id: Uuid,
    pub subtopic_id: Uuid,
    pub title: String,
    pub order_index: i32,
    pub complexity_score: i32,
    pub status: String,
}

impl SubtopicProgressRow {
    /// Every subtopic in learning order (topic order, then subtopic order).
    pub async fn fetch_all(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                s.topic_id,
                s.id AS subtopic_id,
                s.title,
                s.order_index,
                s.complexity_score,
                COALESCE(up.status, 'not_started') AS status
            FROM subtopics s
            JOIN topics t ON t.id = s.topic_id
            LEFT JOIN user_progress up
                ON up.subtopic_id = s.id
                AND up.user_id = $1
            ORDER BY t.order_index, t.title, s.order_index, s.title
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }

    pub fn status(&self) -> DatabaseResult<ProgressStatus> {
        ProgressStatus::try_from(self.status.as_str())
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed.as_str()
    }

    fn is_started(&self) -> bool {
        self.status != ProgressStatus::NotStarted.as_str()
    }
}

/// A subtopic is open once touched, or when everything before it in learning
/// order is completed. Unknown ids are never open.
pub fn is_unlocked(rows: &[SubtopicProgressRow], subtopic_id: Uuid) -> bool {
    let Some(pos) = rows.iter().position(|r| r.subtopic_id == subtopic_id) else {
        return false;
    };
    rows[pos].is_started() || rows[..pos].iter().all(SubtopicProgressRow::is_completed)
}

/// First subtopic of `topic_id` that is not completed.
pub fn first_unfinished(rows: &[SubtopicProgressRow], topic_id: Uuid) -> Option<&SubtopicProgressRow> {
    rows.iter()
        .filter(|r| r.topic_id == topic_id)
        .find(|r| !r.is_completed())
}
