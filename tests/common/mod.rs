#![allow(dead_code)]

use async_trait::async_trait;
use payflow::config::ReconcilerConfig;
use payflow::domain::error::OrchestrationError;
use payflow::domain::money::{Currency, Money, MoneyAmount};
use payflow::domain::provider::{
    InitiatePayment, PspAcceptance, PspClient, PspStatus, PspStatusReport,
};
use payflow::domain::store::TransactionStore;
use payflow::domain::transaction::{Transaction, TransactionParts, TransactionStatus};
use payflow::infra::memory::{
    InMemoryAttemptStore, InMemoryIdempotencyStore, InMemoryRefundStore,
    InMemoryTransactionStore,
};
use payflow::services::orchestrator::{CreatePayment, PaymentService, PaymentServiceParams};
use payflow::services::reconciler::Reconciler;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Scriptable provider double. Records every call it receives; failure
/// modes and poll verdicts are toggled per test.
#[derive(Default)]
pub struct StubPsp {
    fail_initiate: Mutex<bool>,
    reports: Mutex<HashMap<Uuid, (String, Option<String>)>>,
    fail_status: Mutex<HashSet<Uuid>>,
    initiate_calls: Mutex<Vec<InitiatePayment>>,
    status_calls: Mutex<Vec<Uuid>>,
}

impl StubPsp {
    pub fn fail_initiations(&self, fail: bool) {
        *self.fail_initiate.lock().unwrap() = fail;
    }

    /// Script the verdict a status poll for this transaction returns.
    pub fn report(&self, transaction_id: Uuid, status: &str, psp_reference: Option<&str>) {
        self.reports.lock().unwrap().insert(
            transaction_id,
            (status.to_string(), psp_reference.map(str::to_string)),
        );
    }

    pub fn fail_status_for(&self, transaction_id: Uuid) {
        self.fail_status.lock().unwrap().insert(transaction_id);
    }

    pub fn initiate_count(&self) -> usize {
        self.initiate_calls.lock().unwrap().len()
    }

    pub fn initiations(&self) -> Vec<InitiatePayment> {
        self.initiate_calls.lock().unwrap().clone()
    }

    pub fn polled_ids(&self) -> Vec<Uuid> {
        self.status_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PspClient for StubPsp {
    async fn initiate(&self, req: &InitiatePayment) -> Result<PspAcceptance, OrchestrationError> {
        self.initiate_calls.lock().unwrap().push(req.clone());
        if *self.fail_initiate.lock().unwrap() {
            return Err(OrchestrationError::UpstreamUnavailable(
                "stubbed outage".to_string(),
            ));
        }
        Ok(PspAcceptance {
            message: Some("Processing started".to_string()),
        })
    }

    async fn query_status(
        &self,
        transaction_id: Uuid,
    ) -> Result<PspStatusReport, OrchestrationError> {
        self.status_calls.lock().unwrap().push(transaction_id);
        if self.fail_status.lock().unwrap().contains(&transaction_id) {
            return Err(OrchestrationError::UpstreamUnavailable(
                "stubbed outage".to_string(),
            ));
        }
        let reports = self.reports.lock().unwrap();
        match reports.get(&transaction_id) {
            Some((status, reference)) => Ok(PspStatusReport {
                status: PspStatus::from(status.as_str()),
                psp_reference: reference.clone(),
            }),
            None => Ok(PspStatusReport {
                status: PspStatus::from("PENDING"),
                psp_reference: None,
            }),
        }
    }
}

/// Fully wired service over in-memory stores, with handles to every
/// store so tests can inspect state directly.
pub struct TestApp {
    pub service: Arc<PaymentService>,
    pub transactions: Arc<InMemoryTransactionStore>,
    pub attempts: Arc<InMemoryAttemptStore>,
    pub idempotency: Arc<InMemoryIdempotencyStore>,
    pub refunds: Arc<InMemoryRefundStore>,
    pub psp: Arc<StubPsp>,
}

pub fn setup() -> TestApp {
    let transactions = Arc::new(InMemoryTransactionStore::new());
    let attempts = Arc::new(InMemoryAttemptStore::new());
    let idempotency = Arc::new(InMemoryIdempotencyStore::new());
    let refunds = Arc::new(InMemoryRefundStore::new());
    let psp = Arc::new(StubPsp::default());

    let service = Arc::new(PaymentService::new(PaymentServiceParams {
        transactions: transactions.clone(),
        attempts: attempts.clone(),
        idempotency: idempotency.clone(),
        refunds: refunds.clone(),
        psp: psp.clone(),
        callback_url: "http://localhost:3000/webhooks/psp".to_string(),
    }));

    TestApp {
        service,
        transactions,
        attempts,
        idempotency,
        refunds,
        psp,
    }
}

pub fn reconciler(app: &TestApp, staleness_secs: i64) -> Reconciler {
    Reconciler::new(
        app.service.clone(),
        app.transactions.clone(),
        app.psp.clone(),
        ReconcilerConfig {
            sweep_interval_secs: 1,
            staleness_secs,
            batch_size: 100,
        },
    )
}

// ── Fixtures ───────────────────────────────────────────────────────────────

pub fn usd(minor_units: i64) -> Money {
    Money::new(MoneyAmount::new(minor_units).unwrap(), Currency::Usd)
}

/// Drive a payment through the normal create path; returns its id.
pub async fn create_processing_payment(app: &TestApp, user_id: &str, amount: i64) -> Uuid {
    let receipt = app
        .service
        .create_payment(
            CreatePayment {
                user_id: user_id.to_string(),
                amount,
                currency: Currency::Usd,
            },
            None,
        )
        .await
        .expect("create failed");
    transaction_id_of(&receipt.body)
}

pub fn transaction_id_of(body: &serde_json::Value) -> Uuid {
    body.get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("body carries no transaction id")
}

/// Insert a transaction directly in the given status, bypassing the
/// create path. Used to probe transitions out of arbitrary states.
pub async fn insert_with_status(app: &TestApp, status: TransactionStatus) -> Uuid {
    let now = chrono::Utc::now();
    let transaction = Transaction::from_parts(TransactionParts {
        id: Uuid::now_v7(),
        user_id: "user-fixture".to_string(),
        money: usd(4_200),
        status,
        version: 3,
        created_at: now,
        updated_at: now,
    });
    app.transactions
        .insert(&transaction)
        .await
        .expect("insert failed");
    transaction.id()
}

/// Insert a PROCESSING transaction whose created_at lies `age_secs` in
/// the past, as the reconciler would find it.
pub async fn insert_aged_processing(app: &TestApp, age_secs: i64) -> Uuid {
    let created = chrono::Utc::now() - chrono::Duration::seconds(age_secs);
    let transaction = Transaction::from_parts(TransactionParts {
        id: Uuid::now_v7(),
        user_id: "user-stale".to_string(),
        money: usd(4_200),
        status: TransactionStatus::Processing,
        version: 1,
        created_at: created,
        updated_at: created,
    });
    app.transactions
        .insert(&transaction)
        .await
        .expect("insert failed");
    transaction.id()
}
