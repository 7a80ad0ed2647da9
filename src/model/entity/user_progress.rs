use crate::engine::{QuestionSet, ReadingSignals};
use crate::model::repo::ResourceTyped;
use crate::model::{DatabaseResult, ModelManager, ProgressStatus};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    Content,
    Checkpoint,
}

/// Where a user left a content or checkpoint screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExitPoint {
    #[serde(rename = "type")]
    pub kind: ExitKind,
    /// Scroll offset on content, question index on a checkpoint.
    pub position: i64,
    /// Client clock, milliseconds since the epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<ReadingSignals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptation_modifier: Option<f64>,
}

impl ExitPoint {
    /// Last write wins: `self` replaces `stored` unless `stored` is newer.
    /// Adaptation data missing from `self` is carried over from `stored`.
    /// Returns `None` when `self` is stale.
    pub fn merge_over(mut self, stored: Option<&ExitPoint>) -> Option<ExitPoint> {
        let Some(stored) = stored else {
            return Some(self);
        };
        if self.timestamp < stored.timestamp {
            return None;
        }
        if self.signals.is_none() {
            self.signals = stored.signals;
        }
        if self.adaptation_modifier.is_none() {
            self.adaptation_modifier = stored.adaptation_modifier;
        }
        Some(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProgress {
    id: Uuid,
    user_id: Uuid,
    subtopic_id: Uuid,
    status: String,
    exit_point: Option<String>,
    checkpoint: Option<String>,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for UserProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::UserProgress
    }
}

impl UserProgress {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> DatabaseResult<ProgressStatus> {
        ProgressStatus::try_from(self.status.as_str())
    }

    pub fn exit_point(&self) -> DatabaseResult<Option<ExitPoint>> {
        self.exit_point
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(Into::into)
    }

    pub fn has_checkpoint(&self) -> bool {
        self.checkpoint.is_some()
    }

    /// Question set generated for the pending checkpoint, if any.
    pub fn checkpoint(&self) -> DatabaseResult<Option<QuestionSet>> {
        self.checkpoint
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(Into::into)
    }
}

impl UserProgress {
    pub async fn find<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        subtopic_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM user_progress WHERE user_id = $1 AND subtopic_id = $2")
            .bind(user_id)
            .bind(subtopic_id)
            .fetch_optional(executor)
            .await?;
        Ok(result)
    }

    /// Locks the row for the rest of the transaction.
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        subtopic_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM user_progress WHERE user_id = $1 AND subtopic_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(subtopic_id)
        .fetch_optional(executor)
        .await?;
        Ok(result)
    }

    /// Creates the row if missing and moves `not_started` to `in_progress`.
    pub async fn mark_in_progress<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        subtopic_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO user_progress (id, user_id, subtopic_id, status)
            VALUES ($1, $2, $3, 'in_progress')
            ON CONFLICT (user_id, subtopic_id) DO UPDATE
            SET status = CASE
                    WHEN user_progress.status = 'not_started' THEN 'in_progress'
                    ELSE user_progress.status
                END,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(subtopic_id)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Saves `exit_point` unless a newer one is already stored. Returns the
    /// row and whether the write was applied.
    #[tracing::instrument(skip(mm, exit_point))]
    pub async fn save_exit_point(
        mm: &ModelManager,
        user_id: Uuid,
        subtopic_id: Uuid,
        exit_point: ExitPoint,
    ) -> DatabaseResult<(Self, bool)> {
        let mut tx = mm.begin().await?;

        // the upsert holds the row lock until commit
        let current = Self::mark_in_progress(&mut *tx, user_id, subtopic_id).await?;

        let stored = current.exit_point()?;
        let Some(merged) = exit_point.merge_over(stored.as_ref()) else {
            tx.commit().await?;
            tracing::debug!("stale exit point ignored");
            return Ok((current, false));
        };

        let row = sqlx::query_as(
            "UPDATE user_progress SET exit_point = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(serde_json::to_string(&merged)?)
        .bind(current.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((row, true))
    }

    /// Stores a freshly generated checkpoint, replacing any pending one.
    pub async fn store_checkpoint(
        mm: &ModelManager,
        user_id: Uuid,
        subtopic_id: Uuid,
        set: &QuestionSet,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.begin().await?;
        let current = Self::mark_in_progress(&mut *tx, user_id, subtopic_id).await?;

        let row = sqlx::query_as(
            "UPDATE user_progress SET checkpoint = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(serde_json::to_string(set)?)
        .bind(current.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Consumes the pending checkpoint and records the outcome. A passed
    /// checkpoint completes the subtopic; completed rows never move back.
    pub async fn finish_checkpoint<'e, E: PgExecutor<'e>>(
        executor: E,
        progress_id: Uuid,
        passed: bool,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            UPDATE user_progress
            SET checkpoint = NULL,
                status = CASE WHEN $2 THEN 'completed' ELSE status END,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(progress_id)
        .bind(passed)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }
}

// Utils

/// Most recently touched in-progress subtopic.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResumeRow {
    pub topic_id: Uuid,
    pub topic_title: String,
    pub subtopic_id: Uuid,
    pub subtopic_title: String,
    pub exit_point: Option<String>,
    pub has_checkpoint: bool,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    pub async fn find_latest(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT
                t.id AS topic_id,
                t.title AS topic_title,
                s.id AS subtopic_id,
                s.title AS subtopic_title,
                up.exit_point,
                up.checkpoint IS NOT NULL AS has_checkpoint,
                up.updated_at
            FROM user_progress up
            JOIN subtopics s ON s.id = up.subtopic_id
            JOIN topics t ON t.id = s.topic_id
            WHERE up.user_id = $1 AND up.status = 'in_progress'
            ORDER BY up.updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(actor.user_id())
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }

    pub fn exit_point(&self) -> DatabaseResult<Option<ExitPoint>> {
        self.exit_point
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(Into::into)
    }
}
