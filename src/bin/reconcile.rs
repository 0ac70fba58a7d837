use {
    payflow::{
        adapters::psp_http::HttpPspClient,
        config::AppConfig,
        domain::{
            provider::PspClient,
            store::{AttemptStore, IdempotencyStore, RefundStore, TransactionStore},
        },
        infra::postgres::{
            attempt_repo::PgAttemptStore, idempotency_repo::PgIdempotencyStore,
            refund_repo::PgRefundStore, transaction_repo::PgTransactionStore,
        },
        services::{
            orchestrator::{PaymentService, PaymentServiceParams},
            reconciler::Reconciler,
        },
    },
    sqlx::postgres::PgPoolOptions,
    std::{sync::Arc, time::Duration},
};

/// One-shot reconciliation sweep, for running from cron or by hand.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();
    let url = config
        .database_url
        .clone()
        .expect("DATABASE_URL must be set for the reconcile binary");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&url)
        .await
        .expect("failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let transactions: Arc<dyn TransactionStore> = Arc::new(PgTransactionStore::new(pool.clone()));
    let attempts: Arc<dyn AttemptStore> = Arc::new(PgAttemptStore::new(pool.clone()));
    let idempotency: Arc<dyn IdempotencyStore> = Arc::new(PgIdempotencyStore::new(pool.clone()));
    let refunds: Arc<dyn RefundStore> = Arc::new(PgRefundStore::new(pool));
    let psp: Arc<dyn PspClient> = Arc::new(HttpPspClient::new(
        &config.psp.base_url,
        Duration::from_secs(config.psp.timeout_secs),
    ));

    let service = Arc::new(PaymentService::new(PaymentServiceParams {
        transactions: transactions.clone(),
        attempts,
        idempotency,
        refunds,
        psp: psp.clone(),
        callback_url: config.psp.callback_url.clone(),
    }));
    let reconciler = Reconciler::new(service, transactions, psp, config.reconciler.clone());

    match reconciler.sweep().await {
        Ok(stats) => tracing::info!(
            examined = stats.examined,
            resolved = stats.resolved,
            failed = stats.failed,
            "one-shot reconciliation finished"
        ),
        Err(err) => {
            tracing::error!(error = %err, "one-shot reconciliation failed");
            std::process::exit(1);
        }
    }
}
