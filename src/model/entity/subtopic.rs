use std::collections::HashMap;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Subtopic {
    id: Uuid,
    topic_id: Uuid,
    title: String,
    content: String,
    order_index: i32,
    complexity_score: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubtopicCreate {
    pub topic_id: Uuid,
    pub title: String,
    pub content: String,
    pub order_index: Option<i32>,
    pub complexity_score: i32,
}

impl ResourceTyped for Subtopic {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Subtopic
    }
}

impl Subtopic {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic_id(&self) -> Uuid {
        self.topic_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    pub fn complexity_score(&self) -> i32 {
        self.complexity_score
    }
}

impl Subtopic {
    pub async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SubtopicCreate,
    ) -> DatabaseResult<Self> {
        let subtopic = sqlx::query_as(
            r#"
            INSERT INTO subtopics (id, topic_id, title, content, order_index, complexity_score)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING id, topic_id, title, content, order_index, complexity_score
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.topic_id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.order_index.unwrap_or(0))
        .bind(data.complexity_score)
        .fetch_one(mm.executor())
        .await?;

        Ok(subtopic)
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM subtopics WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Titles for the given subtopic ids. Unknown ids are left out.
    pub async fn titles(mm: &ModelManager, ids: &[Uuid]) -> DatabaseResult<HashMap<Uuid, String>> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, title FROM subtopics WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows.into_iter().collect())
    }
}
