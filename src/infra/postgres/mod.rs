pub mod attempt_repo;
pub mod idempotency_repo;
pub mod refund_repo;
pub mod transaction_repo;
