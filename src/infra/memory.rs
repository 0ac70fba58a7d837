use {
    crate::domain::{
        attempt::{AttemptStatus, PaymentAttempt},
        error::OrchestrationError,
        idempotency::{IdempotencyKey, IdempotencyRecord},
        refund::Refund,
        store::{AttemptStore, IdempotencyStore, RefundStore, StatusWrite, TransactionStore},
        transaction::{Transaction, TransactionStatus},
    },
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde_json::Value,
    std::collections::{hash_map::Entry, HashMap},
    std::sync::Arc,
    tokio::sync::RwLock,
    uuid::Uuid,
};

/// Map-backed stores for development mode and tests. The transaction
/// store honors the same version discipline as the Postgres one, so the
/// compare-and-swap paths behave identically against either backend.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    rows: Arc<RwLock<HashMap<Uuid, Transaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, transaction: &Transaction) -> Result<(), OrchestrationError> {
        self.rows
            .write()
            .await
            .insert(transaction.id(), transaction.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Transaction>, OrchestrationError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        target: &TransactionStatus,
        expected_version: i64,
    ) -> Result<StatusWrite, OrchestrationError> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.get_mut(&id) else {
            return Ok(StatusWrite::Conflict);
        };
        if row.version() != expected_version {
            return Ok(StatusWrite::Conflict);
        }
        row.advance(target.clone());
        Ok(StatusWrite::Applied(row.clone()))
    }

    async fn find_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transaction>, OrchestrationError> {
        let rows = self.rows.read().await;
        let mut stale: Vec<Transaction> = rows
            .values()
            .filter(|t| {
                *t.status() == TransactionStatus::Processing && t.created_at() < cutoff
            })
            .cloned()
            .collect();
        stale.sort_by_key(Transaction::created_at);
        stale.truncate(limit.max(0) as usize);
        Ok(stale)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryAttemptStore {
    rows: Arc<RwLock<Vec<PaymentAttempt>>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn append(&self, attempt: &PaymentAttempt) -> Result<(), OrchestrationError> {
        self.rows.write().await.push(attempt.clone());
        Ok(())
    }

    async fn conclude(
        &self,
        id: Uuid,
        status: &AttemptStatus,
        psp_reference: Option<&str>,
        response: &Value,
    ) -> Result<(), OrchestrationError> {
        let mut rows = self.rows.write().await;
        if let Some(attempt) = rows.iter_mut().find(|a| a.id() == id) {
            attempt.conclude(status.clone(), psp_reference, response);
        }
        Ok(())
    }

    async fn list_for(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<PaymentAttempt>, OrchestrationError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|a| a.transaction_id() == transaction_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryIdempotencyStore {
    rows: Arc<RwLock<HashMap<IdempotencyKey, IdempotencyRecord>>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn find(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<IdempotencyRecord>, OrchestrationError> {
        Ok(self.rows.read().await.get(key).cloned())
    }

    async fn insert(&self, record: &IdempotencyRecord) -> Result<bool, OrchestrationError> {
        let mut rows = self.rows.write().await;
        match rows.entry(record.key().clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(true)
            }
        }
    }
}

#[derive(Default, Clone)]
pub struct InMemoryRefundStore {
    rows: Arc<RwLock<Vec<Refund>>>,
}

impl InMemoryRefundStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefundStore for InMemoryRefundStore {
    async fn append(&self, refund: &Refund) -> Result<(), OrchestrationError> {
        self.rows.write().await.push(refund.clone());
        Ok(())
    }

    async fn list_for(&self, transaction_id: Uuid) -> Result<Vec<Refund>, OrchestrationError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| r.transaction_id() == transaction_id)
            .cloned()
            .collect())
    }
}
