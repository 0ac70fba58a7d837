use {
    crate::domain::{
        error::OrchestrationError,
        money::MoneyAmount,
        refund::{Refund, RefundParts},
        store::RefundStore,
    },
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    sqlx::{FromRow, PgPool},
    uuid::Uuid,
};

#[derive(FromRow)]
struct RefundRow {
    id: Uuid,
    transaction_id: Uuid,
    amount: i64,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RefundRow> for Refund {
    type Error = OrchestrationError;

    fn try_from(row: RefundRow) -> Result<Self, Self::Error> {
        Ok(Refund::from_parts(RefundParts {
            id: row.id,
            transaction_id: row.transaction_id,
            amount: MoneyAmount::new(row.amount)?,
            reason: row.reason,
            created_at: row.created_at,
        }))
    }
}

pub struct PgRefundStore {
    pool: PgPool,
}

impl PgRefundStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefundStore for PgRefundStore {
    async fn append(&self, refund: &Refund) -> Result<(), OrchestrationError> {
        sqlx::query(
            r#"
            INSERT INTO refunds (id, transaction_id, amount, reason, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(refund.id())
        .bind(refund.transaction_id())
        .bind(refund.amount().minor_units())
        .bind(refund.reason())
        .bind(refund.created_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for(&self, transaction_id: Uuid) -> Result<Vec<Refund>, OrchestrationError> {
        let rows = sqlx::query_as::<_, RefundRow>(
            r#"
            SELECT id, transaction_id, amount, reason, created_at
            FROM refunds
            WHERE transaction_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Refund::try_from).collect()
    }
}
