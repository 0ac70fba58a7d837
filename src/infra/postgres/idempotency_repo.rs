use {
    crate::domain::{
        error::OrchestrationError,
        idempotency::{IdempotencyKey, IdempotencyRecord, IdempotencyRecordParts},
        store::IdempotencyStore,
    },
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde_json::Value,
    sqlx::{FromRow, PgPool},
};

#[derive(FromRow)]
struct IdempotencyRow {
    key: String,
    response_code: i32,
    response_body: Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdempotencyRow> for IdempotencyRecord {
    type Error = OrchestrationError;

    fn try_from(row: IdempotencyRow) -> Result<Self, Self::Error> {
        let response_code = u16::try_from(row.response_code).map_err(|_| {
            OrchestrationError::Validation(format!(
                "stored response code out of range: {}",
                row.response_code
            ))
        })?;
        Ok(IdempotencyRecord::from_parts(IdempotencyRecordParts {
            key: IdempotencyKey::new(row.key)?,
            response_code,
            response_body: row.response_body,
            created_at: row.created_at,
        }))
    }
}

pub struct PgIdempotencyStore {
    pool: PgPool,
}

impl PgIdempotencyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyStore for PgIdempotencyStore {
    async fn find(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<IdempotencyRecord>, OrchestrationError> {
        let row = sqlx::query_as::<_, IdempotencyRow>(
            r#"
            SELECT key, response_code, response_body, created_at
            FROM idempotency_keys
            WHERE key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(IdempotencyRecord::try_from).transpose()
    }

    async fn insert(&self, record: &IdempotencyRecord) -> Result<bool, OrchestrationError> {
        // The primary key arbitrates concurrent commits: whoever inserts
        // first wins, everyone else sees zero rows affected.
        let result = sqlx::query(
            r#"
            INSERT INTO idempotency_keys (key, response_code, response_body, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(record.key().as_str())
        .bind(i32::from(record.response_code()))
        .bind(record.response_body())
        .bind(record.created_at())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
