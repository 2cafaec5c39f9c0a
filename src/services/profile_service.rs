use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Per-user profile document, merged shallowly on write. Keys the caller
/// omits are left untouched.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch(&self, uid: &str) -> Result<Option<Value>, ProfileError>;

    async fn merge(&self, uid: &str, data: Value) -> Result<(), ProfileError>;
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn fetch(&self, uid: &str) -> Result<Option<Value>, ProfileError> {
        let data: Option<Value> = sqlx::query_scalar("SELECT data FROM profiles WHERE uid = $1")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(data)
    }

    async fn merge(&self, uid: &str, data: Value) -> Result<(), ProfileError> {
        // JSONB || is a shallow merge: incoming top-level keys win,
        // everything else is preserved.
        sqlx::query(
            "INSERT INTO profiles (uid, data) VALUES ($1, $2) \
             ON CONFLICT (uid) DO UPDATE SET data = profiles.data || EXCLUDED.data, updated_at = now()",
        )
        .bind(uid)
        .bind(&data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
