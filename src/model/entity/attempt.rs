use std::collections::HashMap;

use crate::engine::{QuestionSet, ScoreReport};
use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::entity::UserProgress;
use crate::model::repo::ResourceTyped;
use crate::model::{DatabaseError, ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// One submitted checkpoint. Question, answer and score sets are stored as
/// JSON text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attempt {
    id: Uuid,
    user_id: Uuid,
    subtopic_id: Uuid,
    questions: String,
    answers: String,
    scores: String,
    score: i32,
    passed: bool,
    feedback: String,
    created_at: DateTime<Utc>,
}

pub struct AttemptCreate {
    pub user_id: Uuid,
    pub subtopic_id: Uuid,
    pub questions: QuestionSet,
    pub answers: HashMap<Uuid, String>,
    pub report: ScoreReport,
    pub feedback: String,
}

impl ResourceTyped for Attempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Attempt
    }
}

impl Attempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn subtopic_id(&self) -> Uuid {
        self.subtopic_id
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn questions(&self) -> DatabaseResult<QuestionSet> {
        Ok(serde_json::from_str(&self.questions)?)
    }

    pub fn answers(&self) -> DatabaseResult<HashMap<Uuid, String>> {
        Ok(serde_json::from_str(&self.answers)?)
    }

    pub fn report(&self) -> DatabaseResult<ScoreReport> {
        Ok(serde_json::from_str(&self.scores)?)
    }

    pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, data: AttemptCreate) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO attempts (id, user_id, subtopic_id, questions, answers, scores, score, passed, feedback)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.subtopic_id)
        .bind(serde_json::to_string(&data.questions)?)
        .bind(serde_json::to_string(&data.answers)?)
        .bind(serde_json::to_string(&data.report)?)
        .bind(data.report.score as i32)
        .bind(data.report.passed)
        .bind(&data.feedback)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    /// Stores the attempt and consumes the pending checkpoint it answers, in
    /// one transaction. A passed attempt completes the subtopic.
    ///
    /// Fails with [`DatabaseError::NotFound`] when the user has no progress on
    /// the subtopic and with [`DatabaseError::Conflict`] when the pending set
    /// is gone or no longer holds the scored questions.
    #[tracing::instrument(skip_all, fields(user_id = %data.user_id, subtopic_id = %data.subtopic_id))]
    pub async fn submit(mm: &ModelManager, data: AttemptCreate) -> DatabaseResult<Self> {
        let mut tx = mm.begin().await?;

        let progress = UserProgress::find_for_update(&mut *tx, data.user_id, data.subtopic_id)
            .await?
            .ok_or(DatabaseError::NotFound)?;

        let still_pending = progress
            .checkpoint()?
            .is_some_and(|pending| pending.same_questions(&data.questions));
        if !still_pending {
            return Err(DatabaseError::Conflict);
        }

        let passed = data.report.passed;
        let attempt = Self::insert(&mut *tx, data).await?;
        UserProgress::finish_checkpoint(&mut *tx, progress.id(), passed).await?;

        tx.commit().await?;
        Ok(attempt)
    }
}

#[async_trait]
impl CrudRepository<Attempt, AttemptCreate, Uuid> for Attempt {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AttemptCreate,
    ) -> DatabaseResult<Self> {
        Self::insert(mm.executor(), data).await
    }

    async fn update(
        self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
        _data: AttemptCreate,
    ) -> DatabaseResult<Self> {
        Err(DatabaseError::Immutable)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM attempts WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM attempts WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Actor's own attempts, newest first.
    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM attempts WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(actor.user_id())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attempts WHERE user_id = $1")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

impl_paginatable_for!(Attempt, AttemptCreate, Uuid);

#[async_trait]
impl HasOwner for Attempt {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}
