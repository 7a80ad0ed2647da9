use std::sync::Arc;

use crate::ai::AiProvider;
use crate::model::ModelManager;

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    ai: Arc<dyn AiProvider>,
    demo_user: bool,
}

impl AppState {
    pub fn new(mm: ModelManager, ai: Arc<dyn AiProvider>, demo_user: bool) -> Self {
        Self { mm, ai, demo_user }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn ai(&self) -> &dyn AiProvider {
        self.ai.as_ref()
    }

    /// Whether anonymous requests are served as the shared demo account.
    pub fn demo_user(&self) -> bool {
        self.demo_user
    }
}
