use {
    payflow::{
        AppState,
        adapters::{http, psp_http::HttpPspClient},
        config::AppConfig,
        domain::{
            provider::PspClient,
            store::{AttemptStore, IdempotencyStore, RefundStore, TransactionStore},
        },
        infra::{
            memory::{
                InMemoryAttemptStore, InMemoryIdempotencyStore, InMemoryRefundStore,
                InMemoryTransactionStore,
            },
            postgres::{
                attempt_repo::PgAttemptStore, idempotency_repo::PgIdempotencyStore,
                refund_repo::PgRefundStore, transaction_repo::PgTransactionStore,
            },
        },
        services::{
            orchestrator::{PaymentService, PaymentServiceParams},
            reconciler::Reconciler,
        },
    },
    sqlx::postgres::PgPoolOptions,
    std::{sync::Arc, time::Duration},
    tokio::{signal, sync::watch},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    let transactions: Arc<dyn TransactionStore>;
    let attempts: Arc<dyn AttemptStore>;
    let idempotency: Arc<dyn IdempotencyStore>;
    let refunds: Arc<dyn RefundStore>;
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(20)
                .acquire_timeout(Duration::from_secs(3))
                .connect(url)
                .await
                .expect("failed to connect to database");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("failed to run migrations");
            transactions = Arc::new(PgTransactionStore::new(pool.clone()));
            attempts = Arc::new(PgAttemptStore::new(pool.clone()));
            idempotency = Arc::new(PgIdempotencyStore::new(pool.clone()));
            refunds = Arc::new(PgRefundStore::new(pool));
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores");
            transactions = Arc::new(InMemoryTransactionStore::new());
            attempts = Arc::new(InMemoryAttemptStore::new());
            idempotency = Arc::new(InMemoryIdempotencyStore::new());
            refunds = Arc::new(InMemoryRefundStore::new());
        }
    }

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

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = Reconciler::new(
        service.clone(),
        transactions,
        psp,
        config.reconciler.clone(),
    );
    let sweeper = tokio::spawn(reconciler.run(shutdown_rx));

    let app = http::router(AppState { service });
    #[cfg(feature = "mock-psp")]
    let app = app.merge(payflow::adapters::mock_psp::router(
        payflow::adapters::mock_psp::MockPspState::from_env(),
    ));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap();
    tracing::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    shutdown_tx.send(true).ok();
    sweeper.await.ok();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
