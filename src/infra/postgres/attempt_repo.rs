use {
    crate::domain::{
        attempt::{AttemptStatus, PaymentAttempt, PaymentAttemptParts},
        error::OrchestrationError,
        store::AttemptStore,
    },
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde_json::Value,
    sqlx::{FromRow, PgPool},
    uuid::Uuid,
};

#[derive(FromRow)]
struct AttemptRow {
    id: Uuid,
    transaction_id: Uuid,
    psp_reference: Option<String>,
    status: String,
    request_payload: Value,
    response_payload: Option<Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttemptRow> for PaymentAttempt {
    type Error = OrchestrationError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(PaymentAttempt::from_parts(PaymentAttemptParts {
            id: row.id,
            transaction_id: row.transaction_id,
            psp_reference: row.psp_reference,
            status: AttemptStatus::try_from(row.status.as_str())?,
            request_payload: row.request_payload,
            response_payload: row.response_payload,
            created_at: row.created_at,
        }))
    }
}

pub struct PgAttemptStore {
    pool: PgPool,
}

impl PgAttemptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttemptStore for PgAttemptStore {
    async fn append(&self, attempt: &PaymentAttempt) -> Result<(), OrchestrationError> {
        sqlx::query(
            r#"
            INSERT INTO payment_attempts
                (id, transaction_id, psp_reference, status, request_payload,
                 response_payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(attempt.id())
        .bind(attempt.transaction_id())
        .bind(attempt.psp_reference())
        .bind(attempt.status().as_str())
        .bind(attempt.request_payload())
        .bind(attempt.response_payload())
        .bind(attempt.created_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn conclude(
        &self,
        id: Uuid,
        status: &AttemptStatus,
        psp_reference: Option<&str>,
        response: &Value,
    ) -> Result<(), OrchestrationError> {
        sqlx::query(
            r#"
            UPDATE payment_attempts
            SET status = $2, psp_reference = COALESCE($3, psp_reference),
                response_payload = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(psp_reference)
        .bind(response)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<PaymentAttempt>, OrchestrationError> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT id, transaction_id, psp_reference, status, request_payload,
                   response_payload, created_at
            FROM payment_attempts
            WHERE transaction_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PaymentAttempt::try_from).collect()
    }
}
