use {
    crate::domain::{
        attempt::{AttemptStatus, PaymentAttempt},
        error::OrchestrationError,
        idempotency::{IdempotencyKey, IdempotencyRecord},
        money::{Currency, Money, MoneyAmount},
        provider::{InitiatePayment, PspClient},
        refund::Refund,
        store::{AttemptStore, IdempotencyStore, RefundStore, StatusWrite, TransactionStore},
        transaction::{Transaction, TransactionStatus, TransitionTable},
    },
    serde_json::{json, Value},
    std::sync::Arc,
    tracing::{debug, info, warn},
    uuid::Uuid,
};

/// Inbound payment order, already shorn of transport concerns.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub user_id: String,
    pub amount: i64,
    pub currency: Currency,
}

/// What a create call hands back to the transport layer: a status code
/// and a body that are byte-for-byte stable across idempotent replays.
#[derive(Debug, Clone)]
pub struct CreateReceipt {
    pub code: u16,
    pub body: Value,
    pub replayed: bool,
}

pub struct PaymentServiceParams {
    pub transactions: Arc<dyn TransactionStore>,
    pub attempts: Arc<dyn AttemptStore>,
    pub idempotency: Arc<dyn IdempotencyStore>,
    pub refunds: Arc<dyn RefundStore>,
    pub psp: Arc<dyn PspClient>,
    pub callback_url: String,
}

/// Drives transactions through their lifecycle. All status writes go
/// through the compare-and-swap loop in [`PaymentService::transition`],
/// so concurrent writers never clobber each other.
pub struct PaymentService {
    transactions: Arc<dyn TransactionStore>,
    attempts: Arc<dyn AttemptStore>,
    idempotency: Arc<dyn IdempotencyStore>,
    refunds: Arc<dyn RefundStore>,
    psp: Arc<dyn PspClient>,
    transitions: TransitionTable,
    callback_url: String,
}

impl PaymentService {
    pub fn new(params: PaymentServiceParams) -> Self {
        Self {
            transactions: params.transactions,
            attempts: params.attempts,
            idempotency: params.idempotency,
            refunds: params.refunds,
            psp: params.psp,
            transitions: TransitionTable::new(),
            callback_url: params.callback_url,
        }
    }

    /// Creates a transaction and submits it to the provider.
    ///
    /// With an idempotency key the call is replay-safe: a key that was
    /// already concluded serves its stored response without touching the
    /// provider again. The key is only committed once the provider
    /// accepted the order, so a failed initiation leaves the key free
    /// for a retry.
    #[tracing::instrument(name = "create_payment", skip_all, fields(transaction_id = tracing::field::Empty))]
    pub async fn create_payment(
        &self,
        req: CreatePayment,
        key: Option<IdempotencyKey>,
    ) -> Result<CreateReceipt, OrchestrationError> {
        if let Some(key) = &key {
            if let Some(record) = self.idempotency.find(key).await? {
                info!(idempotency_key = %key, "duplicate create, replaying stored response");
                return Ok(CreateReceipt {
                    code: record.response_code(),
                    body: record.response_body().clone(),
                    replayed: true,
                });
            }
        }

        let amount = MoneyAmount::new(req.amount)?;
        let transaction = Transaction::new(req.user_id, Money::new(amount, req.currency));
        self.transactions.insert(&transaction).await?;
        tracing::Span::current().record(
            "transaction_id",
            tracing::field::display(transaction.id()),
        );

        let transaction = self
            .transition(transaction.id(), TransactionStatus::Processing)
            .await?;

        let initiation = InitiatePayment {
            transaction_id: transaction.id(),
            amount: transaction.money().amount().minor_units(),
            currency: transaction.money().currency().clone(),
            callback_url: self.callback_url.clone(),
        };
        let attempt =
            PaymentAttempt::initiated(transaction.id(), serde_json::to_value(&initiation)?);
        self.attempts.append(&attempt).await?;

        match self.psp.initiate(&initiation).await {
            Ok(acceptance) => {
                self.attempts
                    .conclude(
                        attempt.id(),
                        &AttemptStatus::Success,
                        None,
                        &serde_json::to_value(&acceptance)?,
                    )
                    .await?;
            }
            Err(err) => {
                self.attempts
                    .conclude(
                        attempt.id(),
                        &AttemptStatus::Failure,
                        None,
                        &json!({ "error": err.to_string() }),
                    )
                    .await?;
                warn!(
                    error = %err,
                    "provider initiation failed, transaction left PROCESSING for reconciliation"
                );
                return Err(err);
            }
        }

        let body = serde_json::to_value(&transaction)?;
        if let Some(key) = key {
            let record = IdempotencyRecord::new(key.clone(), 200, body.clone());
            if !self.idempotency.insert(&record).await? {
                // Single-flight loser: another request committed this key
                // between our lookup and our insert. Its response wins.
                let winner = self.idempotency.find(&key).await?.ok_or_else(|| {
                    OrchestrationError::CacheConflict(key.as_str().to_string())
                })?;
                info!(idempotency_key = %key, "lost idempotency commit race, serving winner's response");
                return Ok(CreateReceipt {
                    code: winner.response_code(),
                    body: winner.response_body().clone(),
                    replayed: true,
                });
            }
        }

        Ok(CreateReceipt {
            code: 200,
            body,
            replayed: false,
        })
    }

    pub async fn get_payment(&self, id: Uuid) -> Result<Transaction, OrchestrationError> {
        self.transactions
            .find(id)
            .await?
            .ok_or(OrchestrationError::NotFound(id))
    }

    /// Moves a transaction to `target` under optimistic concurrency.
    ///
    /// Requesting the status the transaction already has is a no-op that
    /// returns the current row unchanged, which is what makes webhook
    /// redelivery harmless. An illegal pair is rejected against the
    /// transition table before any write. On a version conflict the loop
    /// re-reads and decides again, so the second of two racing writers
    /// ends up observing the first one's result.
    pub async fn transition(
        &self,
        id: Uuid,
        target: TransactionStatus,
    ) -> Result<Transaction, OrchestrationError> {
        loop {
            let current = self.get_payment(id).await?;
            if *current.status() == target {
                return Ok(current);
            }
            if !self.transitions.allows(current.status(), &target) {
                return Err(OrchestrationError::IllegalTransition {
                    from: current.status().clone(),
                    to: target,
                });
            }
            match self
                .transactions
                .update_status(id, &target, current.version())
                .await?
            {
                StatusWrite::Applied(updated) => {
                    info!(
                        transaction_id = %id,
                        from = %current.status(),
                        to = %target,
                        "transaction status advanced"
                    );
                    return Ok(updated);
                }
                StatusWrite::Conflict => {
                    debug!(transaction_id = %id, "version conflict on status write, re-reading");
                }
            }
        }
    }

    /// Like [`PaymentService::transition`] but without the identity
    /// no-op: the table has no self-edges, so asking for the status the
    /// row already has is rejected. Refunds use this so a second refund
    /// of the same transaction fails instead of silently succeeding.
    async fn advance(
        &self,
        id: Uuid,
        target: TransactionStatus,
    ) -> Result<Transaction, OrchestrationError> {
        loop {
            let current = self.get_payment(id).await?;
            if !self.transitions.allows(current.status(), &target) {
                return Err(OrchestrationError::IllegalTransition {
                    from: current.status().clone(),
                    to: target,
                });
            }
            match self
                .transactions
                .update_status(id, &target, current.version())
                .await?
            {
                StatusWrite::Applied(updated) => {
                    info!(
                        transaction_id = %id,
                        from = %current.status(),
                        to = %target,
                        "transaction status advanced"
                    );
                    return Ok(updated);
                }
                StatusWrite::Conflict => {
                    debug!(transaction_id = %id, "version conflict on status write, re-reading");
                }
            }
        }
    }

    /// Refunds a successful transaction in full or in part. The status
    /// flip to REFUNDED happens before the refund row is written, so a
    /// concurrent duplicate loses at the compare-and-swap and never
    /// records a second refund.
    pub async fn refund_payment(
        &self,
        id: Uuid,
        amount: i64,
        reason: Option<String>,
    ) -> Result<Refund, OrchestrationError> {
        let amount = MoneyAmount::new(amount)?;
        let transaction = self.get_payment(id).await?;
        if amount > transaction.money().amount() {
            return Err(OrchestrationError::Validation(
                "refund amount exceeds transaction amount".to_string(),
            ));
        }

        self.advance(id, TransactionStatus::Refunded).await?;
        let refund = Refund::new(id, amount, reason);
        self.refunds.append(&refund).await?;
        info!(
            transaction_id = %id,
            refund_id = %refund.id(),
            amount = %refund.amount(),
            "refund recorded"
        );
        Ok(refund)
    }
}
