use sqlx::FromRow;
use uuid::Uuid;

/// A persisted refresh token. Only the SHA-256 digest of the token is kept;
/// each user holds at most one row, replaced on every mint.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub is_used: bool,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl RefreshToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= chrono::Utc::now()
    }
}
