use {
    super::api_errors::ApiError,
    crate::{
        AppState,
        domain::{
            error::OrchestrationError, idempotency::IdempotencyKey, money::Currency,
            refund::Refund, transaction::Transaction,
        },
        services::{
            orchestrator::CreatePayment,
            webhook::{PspWebhook, WebhookAck, process_psp_webhook},
        },
    },
    axum::{
        Json, Router,
        extract::{DefaultBodyLimit, Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    },
    serde::Deserialize,
    std::time::Duration,
    tower_http::timeout::TimeoutLayer,
    uuid::Uuid,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/payments", post(create_payment_handler))
        .route("/payments/{payment_id}", get(get_payment_handler))
        .route(
            "/payments/{payment_id}/refunds",
            post(refund_payment_handler),
        )
        .route("/webhooks/psp", post(psp_webhook_handler))
        .layer(DefaultBodyLimit::max(64 * 1024)) // 64 KB, create and webhook bodies are tiny
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub user_id: String,
    pub amount: i64,
    pub currency: Currency,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub amount: i64,
    pub reason: Option<String>,
}

async fn create_payment_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let key = match headers.get("Idempotency-Key") {
        Some(value) => {
            let raw = value.to_str().map_err(|_| {
                OrchestrationError::Validation(
                    "Idempotency-Key header must be valid UTF-8".to_string(),
                )
            })?;
            Some(IdempotencyKey::new(raw)?)
        }
        None => None,
    };

    let order = CreatePayment {
        user_id: req.user_id,
        amount: req.amount,
        currency: req.currency,
    };
    let receipt = state.service.create_payment(order, key).await?;

    let status = StatusCode::from_u16(receipt.code).unwrap_or(StatusCode::OK);
    Ok((status, Json(receipt.body)))
}

async fn get_payment_handler(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Transaction>, ApiError> {
    let transaction = state.service.get_payment(payment_id).await?;
    Ok(Json(transaction))
}

async fn refund_payment_handler(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<Refund>, ApiError> {
    let refund = state
        .service
        .refund_payment(payment_id, req.amount, req.reason)
        .await?;
    Ok(Json(refund))
}

#[tracing::instrument(
    name = "psp_webhook",
    skip_all,
    fields(transaction_id = tracing::field::Empty, psp_status = tracing::field::Empty)
)]
async fn psp_webhook_handler(
    State(state): State<AppState>,
    Json(webhook): Json<PspWebhook>,
) -> Result<Json<WebhookAck>, ApiError> {
    // Add delivery context to the span so all subsequent logs are correlated.
    tracing::Span::current()
        .record(
            "transaction_id",
            tracing::field::display(webhook.transaction_id),
        )
        .record("psp_status", tracing::field::display(&webhook.status));

    let ack = process_psp_webhook(&state.service, webhook).await?;
    Ok(Json(ack))
}
