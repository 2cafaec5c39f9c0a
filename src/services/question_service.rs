use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::models::question::{Question, QuestionDraft, QuestionError, ValueType};

/// Per-owner question collection. Every operation is scoped to the
/// owning principal; ids belonging to someone else behave exactly like
/// ids that do not exist.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// All of the owner's questions, newest first.
    async fn list(&self, owner: &str) -> Result<Vec<Question>, QuestionError>;

    async fn create(&self, owner: &str, draft: QuestionDraft) -> Result<Question, QuestionError>;

    async fn update(
        &self,
        owner: &str,
        id: Uuid,
        draft: QuestionDraft,
    ) -> Result<Question, QuestionError>;

    async fn delete(&self, owner: &str, id: Uuid) -> Result<(), QuestionError>;

    /// Maintenance scan: how many records carry no owner tag. Legacy
    /// imports predate per-owner scoping; such rows are unreachable
    /// through the public operations.
    async fn count_unowned(&self) -> Result<i64, QuestionError>;
}

pub struct PgQuestionStore {
    pool: PgPool,
}

const SELECT_COLUMNS: &str = "id, owner, short_name, class, prompt, value_type, created_at, updated_at";

impl PgQuestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn question_from_row(row: PgRow) -> Result<Question, QuestionError> {
        let raw_value_type: String = row.try_get("value_type")?;
        let value_type = raw_value_type.parse::<ValueType>().map_err(|_| {
            QuestionError::Storage(format!("unrecognized value_type {raw_value_type:?}"))
        })?;

        Ok(Question {
            id: row.try_get("id")?,
            owner: row.try_get("owner")?,
            short_name: row.try_get("short_name")?,
            class: row.try_get("class")?,
            prompt: row.try_get("prompt")?,
            value_type,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// The unique index on (owner, short_name) is the authoritative
    /// uniqueness check; a violation on the insert/update path means a
    /// concurrent writer won the race.
    fn map_unique_violation(err: sqlx::Error) -> QuestionError {
        let is_unique = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if is_unique {
            QuestionError::DuplicateShortName
        } else {
            QuestionError::Database(err)
        }
    }

    async fn short_name_taken(
        &self,
        owner: &str,
        short_name: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, QuestionError> {
        let taken: bool = match excluding {
            Some(id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM questions WHERE owner = $1 AND short_name = $2 AND id <> $3)",
                )
                .bind(owner)
                .bind(short_name)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM questions WHERE owner = $1 AND short_name = $2)",
                )
                .bind(owner)
                .bind(short_name)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(taken)
    }
}

#[async_trait]
impl QuestionStore for PgQuestionStore {
    async fn list(&self, owner: &str) -> Result<Vec<Question>, QuestionError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM questions WHERE owner = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::question_from_row).collect()
    }

    async fn create(&self, owner: &str, draft: QuestionDraft) -> Result<Question, QuestionError> {
        let new = draft.validate()?;

        if self.short_name_taken(owner, &new.short_name, None).await? {
            return Err(QuestionError::DuplicateShortName);
        }

        let row = sqlx::query(&format!(
            "INSERT INTO questions (id, owner, short_name, class, prompt, value_type) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SELECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&new.short_name)
        .bind(&new.class)
        .bind(&new.prompt)
        .bind(new.value_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_unique_violation)?;

        Self::question_from_row(row)
    }

    async fn update(
        &self,
        owner: &str,
        id: Uuid,
        draft: QuestionDraft,
    ) -> Result<Question, QuestionError> {
        let new = draft.validate()?;

        let current = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM questions WHERE id = $1 AND owner = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(QuestionError::NotFound)?;
        let current = Self::question_from_row(current)?;

        if new.short_name != current.short_name
            && self
                .short_name_taken(owner, &new.short_name, Some(id))
                .await?
        {
            return Err(QuestionError::DuplicateShortName);
        }

        let row = sqlx::query(&format!(
            "UPDATE questions SET short_name = $3, class = $4, prompt = $5, value_type = $6, \
             updated_at = now() WHERE id = $1 AND owner = $2 RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id)
        .bind(owner)
        .bind(&new.short_name)
        .bind(&new.class)
        .bind(&new.prompt)
        .bind(new.value_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_unique_violation)?;

        Self::question_from_row(row)
    }

    async fn delete(&self, owner: &str, id: Uuid) -> Result<(), QuestionError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(QuestionError::NotFound);
        }
        Ok(())
    }

    async fn count_unowned(&self) -> Result<i64, QuestionError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE owner IS NULL OR owner = ''")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
