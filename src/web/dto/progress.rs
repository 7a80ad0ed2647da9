use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::ExitPoint;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SaveProgressRequest {
    pub subtopic_id: Uuid,
    pub exit_point: ExitPoint,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SaveProgressResponse {
    /// False when a newer exit point was already stored.
    pub saved: bool,
    /// Exit point stored after the call.
    pub exit_point: Option<ExitPoint>,
}
