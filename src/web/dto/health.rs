use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database: bool,
}

impl HealthResponse {
    pub fn new(database: bool) -> Self {
        Self {
            status: String::from(if database { "ok" } else { "degraded" }),
            timestamp: Utc::now(),
            database,
        }
    }
}
