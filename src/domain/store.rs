use {
    super::attempt::{AttemptStatus, PaymentAttempt},
    super::error::OrchestrationError,
    super::idempotency::{IdempotencyKey, IdempotencyRecord},
    super::refund::Refund,
    super::transaction::{Transaction, TransactionStatus},
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde_json::Value,
    uuid::Uuid,
};

/// Outcome of a compare-and-swap status write.
#[derive(Debug)]
pub enum StatusWrite {
    /// The row still carried the expected version; the write landed and
    /// this is the refreshed transaction.
    Applied(Transaction),
    /// Somebody else advanced the row first. Re-read and decide again.
    Conflict,
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, transaction: &Transaction) -> Result<(), OrchestrationError>;

    async fn find(&self, id: Uuid) -> Result<Option<Transaction>, OrchestrationError>;

    /// Writes `target` only if the stored version still equals
    /// `expected_version`, bumping the version and refreshing
    /// `updated_at` in the same write.
    async fn update_status(
        &self,
        id: Uuid,
        target: &TransactionStatus,
        expected_version: i64,
    ) -> Result<StatusWrite, OrchestrationError>;

    /// PROCESSING transactions created strictly before `cutoff`, oldest
    /// first, at most `limit` of them.
    async fn find_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transaction>, OrchestrationError>;
}

#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn append(&self, attempt: &PaymentAttempt) -> Result<(), OrchestrationError>;

    /// Seals an attempt with the provider's verdict and raw response.
    /// A reference is only written when the provider supplied one.
    async fn conclude(
        &self,
        id: Uuid,
        status: &AttemptStatus,
        psp_reference: Option<&str>,
        response: &Value,
    ) -> Result<(), OrchestrationError>;

    async fn list_for(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<PaymentAttempt>, OrchestrationError>;
}

#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn find(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<IdempotencyRecord>, OrchestrationError>;

    /// Commits the record unless the key is already taken. Returns
    /// whether this caller won: `false` means another request committed
    /// first and its record is the one to replay. Key uniqueness is the
    /// only arbiter, so exactly one concurrent writer ever sees `true`.
    async fn insert(&self, record: &IdempotencyRecord) -> Result<bool, OrchestrationError>;
}

#[async_trait]
pub trait RefundStore: Send + Sync {
    async fn append(&self, refund: &Refund) -> Result<(), OrchestrationError>;

    async fn list_for(&self, transaction_id: Uuid) -> Result<Vec<Refund>, OrchestrationError>;
}
