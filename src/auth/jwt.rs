use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub exp: i64,
}

impl UserClaims {
    pub fn user_id(&self) -> Option<Uuid> {
        self.sub.parse().ok()
    }
}

/// Signs a session token for `user_id` that expires after [`SESSION_TTL_HOURS`].
pub fn issue_session_token<K: AsRef<[u8]>>(
    user_id: Uuid,
    key: K,
) -> jsonwebtoken::errors::Result<String> {
    let claims = UserClaims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(SESSION_TTL_HOURS)).timestamp(),
    };
    let key = EncodingKey::from_secret(key.as_ref());
    jsonwebtoken::encode(&Header::default(), &claims, &key)
}

pub fn process_token<K: AsRef<[u8]>>(
    token: &str,
    key: K,
) -> jsonwebtoken::errors::Result<TokenData<UserClaims>> {
    let validation = Validation::default();
    let key = DecodingKey::from_secret(key.as_ref());

    jsonwebtoken::decode::<UserClaims>(token, &key, &validation)
}
