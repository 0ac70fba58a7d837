pub mod attempt;
pub mod error;
pub mod idempotency;
pub mod money;
pub mod provider;
pub mod refund;
pub mod store;
pub mod transaction;
