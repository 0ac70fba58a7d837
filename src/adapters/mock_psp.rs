use {
    crate::config::env_or,
    crate::domain::provider::InitiatePayment,
    axum::{
        Json, Router,
        extract::{Path, State},
        routing::{get, post},
    },
    rand::Rng,
    serde_json::{Value, json},
    std::time::Duration,
    tokio::time::sleep,
    tracing::{info, warn},
    uuid::Uuid,
};

/// In-process stand-in for a real payment provider, compiled in behind
/// the `mock-psp` feature. Accepts payment orders, waits a moment, then
/// delivers a settlement webhook to the callback URL the order carried.
#[derive(Clone)]
pub struct MockPspState {
    client: reqwest::Client,
    min_delay_ms: u64,
    max_delay_ms: u64,
    success_rate: f64,
}

impl MockPspState {
    pub fn from_env() -> Self {
        let min_delay_ms = env_or("MOCK_PSP_MIN_DELAY_MS", 2_000);
        let max_delay_ms: u64 = env_or("MOCK_PSP_MAX_DELAY_MS", 5_000);
        let success_rate: f64 = env_or("MOCK_PSP_SUCCESS_RATE", 0.8);
        Self {
            client: reqwest::Client::new(),
            min_delay_ms,
            max_delay_ms: max_delay_ms.max(min_delay_ms),
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

pub fn router(state: MockPspState) -> Router {
    Router::new()
        .route("/mock-psp/pay", post(pay_handler))
        .route("/mock-psp/status/{transaction_id}", get(status_handler))
        .with_state(state)
}

async fn pay_handler(
    State(state): State<MockPspState>,
    Json(order): Json<InitiatePayment>,
) -> Json<Value> {
    // Roll the dice before spawning: the rng handle must not cross an
    // await point.
    let (delay_ms, reference, status) = {
        let mut rng = rand::thread_rng();
        let delay_ms = rng.gen_range(state.min_delay_ms..=state.max_delay_ms);
        let reference = format!("PSP-{}", rng.gen_range(1000..=9999));
        let status = if rng.gen_bool(state.success_rate) {
            "COMPLETED"
        } else {
            "FAILED"
        };
        (delay_ms, reference, status)
    };

    info!(
        transaction_id = %order.transaction_id,
        delay_ms,
        outcome = status,
        "mock provider accepted order"
    );
    tokio::spawn(deliver_callback(
        state.client.clone(),
        order,
        delay_ms,
        reference,
        status,
    ));

    Json(json!({"status": "ACCEPTED", "message": "Processing started"}))
}

async fn deliver_callback(
    client: reqwest::Client,
    order: InitiatePayment,
    delay_ms: u64,
    psp_reference: String,
    status: &'static str,
) {
    sleep(Duration::from_millis(delay_ms)).await;
    let body = json!({
        "transaction_id": order.transaction_id,
        "psp_reference": psp_reference,
        "status": status,
    });
    if let Err(err) = client.post(&order.callback_url).json(&body).send().await {
        warn!(
            transaction_id = %order.transaction_id,
            error = %err,
            "mock provider failed to deliver callback"
        );
    }
}

/// Deterministic verdict for status polls: half of all ids settle, half
/// fail, decided by the last byte of the id.
async fn status_handler(Path(transaction_id): Path<Uuid>) -> Json<Value> {
    if transaction_id.as_bytes()[15] % 2 == 0 {
        Json(json!({"status": "COMPLETED", "psp_reference": "PSP-RECOVERED"}))
    } else {
        Json(json!({"status": "FAILED", "psp_reference": "PSP-FAILED"}))
    }
}
