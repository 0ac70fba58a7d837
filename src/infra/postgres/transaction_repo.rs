use {
    crate::domain::{
        error::OrchestrationError,
        money::{Currency, Money, MoneyAmount},
        store::{StatusWrite, TransactionStore},
        transaction::{Transaction, TransactionParts, TransactionStatus},
    },
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    sqlx::{FromRow, PgPool},
    uuid::Uuid,
};

#[derive(FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: String,
    amount: i64,
    currency: String,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = OrchestrationError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction::from_parts(TransactionParts {
            id: row.id,
            user_id: row.user_id,
            money: Money::new(
                MoneyAmount::new(row.amount)?,
                Currency::try_from(row.currency.as_str())?,
            ),
            status: TransactionStatus::try_from(row.status.as_str())?,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn insert(&self, transaction: &Transaction) -> Result<(), OrchestrationError> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, user_id, amount, currency, status, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(transaction.id())
        .bind(transaction.user_id())
        .bind(transaction.money().amount().minor_units())
        .bind(transaction.money().currency().as_str())
        .bind(transaction.status().as_str())
        .bind(transaction.version())
        .bind(transaction.created_at())
        .bind(transaction.updated_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Transaction>, OrchestrationError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, amount, currency, status, version, created_at, updated_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Transaction::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        target: &TransactionStatus,
        expected_version: i64,
    ) -> Result<StatusWrite, OrchestrationError> {
        // The version predicate is the whole concurrency story: a write
        // only lands against the exact row state the caller read.
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions
            SET status = $3, version = version + 1, updated_at = now()
            WHERE id = $1 AND version = $2
            RETURNING id, user_id, amount, currency, status, version, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(target.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(StatusWrite::Applied(Transaction::try_from(row)?)),
            None => Ok(StatusWrite::Conflict),
        }
    }

    async fn find_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transaction>, OrchestrationError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, amount, currency, status, version, created_at, updated_at
            FROM transactions
            WHERE status = $1 AND created_at < $2
            ORDER BY created_at
            LIMIT $3
            "#,
        )
        .bind(TransactionStatus::Processing.as_str())
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Transaction::try_from).collect()
    }
}
