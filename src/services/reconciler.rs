use {
    super::orchestrator::PaymentService,
    crate::config::ReconcilerConfig,
    crate::domain::{
        error::OrchestrationError, provider::PspClient, store::TransactionStore,
        transaction::Transaction,
    },
    chrono::Utc,
    std::sync::Arc,
    tokio::{
        sync::watch,
        time::{sleep, Duration},
    },
    tracing::{error, info, warn},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub examined: usize,
    pub resolved: usize,
    pub failed: usize,
}

/// Safety net for transactions whose settlement webhook never arrived.
/// Each sweep polls the provider for every PROCESSING transaction older
/// than the staleness threshold and applies whatever verdict it gets.
///
/// Sweeps keep no state between runs and apply changes through the same
/// compare-and-swap transition path as webhooks, so an overlapping sweep
/// or a webhook racing a sweep cannot double-apply a verdict.
pub struct Reconciler {
    service: Arc<PaymentService>,
    transactions: Arc<dyn TransactionStore>,
    psp: Arc<dyn PspClient>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(
        service: Arc<PaymentService>,
        transactions: Arc<dyn TransactionStore>,
        psp: Arc<dyn PspClient>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            service,
            transactions,
            psp,
            config,
        }
    }

    /// One pass over the stale backlog. A transaction that fails to
    /// reconcile is counted and skipped; it stays PROCESSING and the
    /// next sweep picks it up again.
    pub async fn sweep(&self) -> Result<ReconcileStats, OrchestrationError> {
        let cutoff = Utc::now() - chrono::Duration::seconds(self.config.staleness_secs);
        let stale = self
            .transactions
            .find_stale_processing(cutoff, self.config.batch_size)
            .await?;

        let mut stats = ReconcileStats {
            examined: stale.len(),
            ..Default::default()
        };
        for transaction in &stale {
            match self.reconcile_one(transaction).await {
                Ok(true) => stats.resolved += 1,
                Ok(false) => {}
                Err(err) => {
                    stats.failed += 1;
                    warn!(
                        transaction_id = %transaction.id(),
                        error = %err,
                        "reconciliation failed for transaction, continuing sweep"
                    );
                }
            }
        }
        info!(
            examined = stats.examined,
            resolved = stats.resolved,
            failed = stats.failed,
            "reconciliation sweep finished"
        );
        Ok(stats)
    }

    async fn reconcile_one(
        &self,
        transaction: &Transaction,
    ) -> Result<bool, OrchestrationError> {
        let report = self.psp.query_status(transaction.id()).await?;
        let Some(target) = report.status.as_lifecycle() else {
            info!(
                transaction_id = %transaction.id(),
                status = %report.status,
                "provider still undecided, leaving transaction PROCESSING"
            );
            return Ok(false);
        };

        self.service.transition(transaction.id(), target).await?;
        info!(
            transaction_id = %transaction.id(),
            psp_reference = ?report.psp_reference,
            "stale transaction resolved"
        );
        Ok(true)
    }

    /// Periodic sweep loop. Returns when the shutdown channel flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.sweep_interval_secs,
            "reconciler started"
        );
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("reconciler shutting down");
                    return;
                }
                _ = sleep(Duration::from_secs(self.config.sweep_interval_secs)) => {}
            }
            if let Err(err) = self.sweep().await {
                error!(error = %err, "reconciliation sweep failed");
            }
        }
    }
}
