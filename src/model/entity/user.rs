use crate::model::repo::ResourceTyped;
use crate::web::AuthenticatedUser;
use crate::web::UserRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

/// Username of the shared account anonymous visitors are served as.
pub static DEMO_USERNAME: &str = "demo-user";
/// Not a valid PHC string, so nobody can sign in as the demo account.
static DEMO_PASSWORD_HASH: &str = "!demo";

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: Uuid,
    username: String,
    #[serde(skip)]
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UserEntityCreateUpdate {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::repo::ResourceType {
        crate::model::repo::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn is_demo(&self) -> bool {
        self.username == DEMO_USERNAME
    }
}

#[async_trait::async_trait]
impl CrudRepository<UserEntity, UserEntityCreateUpdate, Uuid> for UserEntity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let role = data
            .role
            .as_deref()
            .map(UserRole::from)
            .unwrap_or(UserRole::User)
            .to_string();

        let user = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, password_hash, role)
            VALUES ($1,$2,$3,$4)
            RETURNING id, username, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(&role)
        .fetch_one(mm.executor())
        .await?;

        Ok(user)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE users SET username = $1, password_hash = $2 WHERE id = $3")
            .bind(&data.username)
            .bind(&data.password_hash)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.password_hash = data.password_hash;
        self.username = data.username;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM users ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl UserEntity {
    pub async fn find_by_username(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        username: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Returns the demo account, creating it on first use.
    #[tracing::instrument(skip(mm))]
    pub async fn find_or_create_demo(mm: &ModelManager) -> DatabaseResult<Self> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role)
            VALUES ($1, $2, $3, 'user')
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(DEMO_USERNAME)
        .bind(DEMO_PASSWORD_HASH)
        .execute(mm.executor())
        .await?;

        let user = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(DEMO_USERNAME)
            .fetch_one(mm.executor())
            .await?;
        Ok(user)
    }
}
