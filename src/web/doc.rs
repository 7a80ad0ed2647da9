use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Grit Flow API"),
    paths(
        crate::web::routes::user::user_signup_handler,
        crate::web::routes::user::user_signin_handler,
        crate::web::routes::user::user_verify_handler,
        crate::web::routes::health::health_handler,
        crate::web::routes::checkpoint::checkpoint_generate_handler,
        crate::web::routes::checkpoint::checkpoint_submit_handler,
        crate::web::routes::dashboard::dashboard_topics_handler,
        crate::web::routes::dashboard::dashboard_history_handler,
        crate::web::routes::dashboard::dashboard_resume_handler,
        crate::web::routes::dashboard::dashboard_start_topic_handler,
        crate::web::routes::content::content_get_handler,
        crate::web::routes::content::content_save_progress_handler,
        crate::web::routes::progress::progress_save_handler,
        crate::web::routes::results::results_get_handler,
        crate::web::routes::rpc::rpc_handler,
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;
