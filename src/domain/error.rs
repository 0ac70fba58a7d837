use {super::transaction::TransactionStatus, thiserror::Error, uuid::Uuid};

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("transaction not found: {0}")]
    NotFound(Uuid),

    #[error("payment provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("idempotency key lost the commit race: {0}")]
    CacheConflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
