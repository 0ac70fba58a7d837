mod common;

use common::*;
use payflow::domain::idempotency::{IdempotencyKey, IdempotencyRecord};
use payflow::domain::money::Currency;
use payflow::domain::store::IdempotencyStore;
use payflow::domain::transaction::TransactionStatus;
use payflow::services::orchestrator::CreatePayment;
use payflow::services::webhook::{PspWebhook, WebhookAck, process_psp_webhook};
use std::sync::Arc;

// ── 1. racing_settlements_apply_exactly_once ───────────────────────────────
// 8 contradictory webhooks race on one PROCESSING transaction. The
// version counter admits exactly one settlement; every loser re-reads
// and either confirms the winner (identity) or gets an error ack.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_settlements_apply_exactly_once() {
    let app = setup();
    let id = create_processing_payment(&app, "user-1", 3_000).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = app.service.clone();
        let status = if i % 2 == 0 { "COMPLETED" } else { "FAILED" };
        handles.push(tokio::spawn(async move {
            process_psp_webhook(
                &service,
                PspWebhook {
                    transaction_id: id,
                    psp_reference: format!("PSP-{i}"),
                    status: status.to_string(),
                },
            )
            .await
            .unwrap()
        }));
    }

    let mut processed = 0;
    let mut errors = 0;
    for h in handles {
        match h.await.unwrap() {
            WebhookAck::Processed => processed += 1,
            WebhookAck::Error { .. } => errors += 1,
            other => panic!("unexpected ack: {other:?}"),
        }
    }
    assert!(processed >= 1, "at least the winning delivery is processed");
    assert_eq!(processed + errors, 8);

    let stored = app.service.get_payment(id).await.unwrap();
    assert!(
        matches!(
            *stored.status(),
            TransactionStatus::Success | TransactionStatus::Failed
        ),
        "row must settle terminally"
    );
    assert_eq!(stored.version(), 2, "exactly one settlement write");
}

// ── 2. racing_keyed_creates_serve_one_response ─────────────────────────────
// 8 tasks create with the same idempotency key. Whoever commits the key
// first defines the response; every other caller serves that same body.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_keyed_creates_serve_one_response() {
    let app = setup();
    let key = IdempotencyKey::new("order-race-1").unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = app.service.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            service
                .create_payment(
                    CreatePayment {
                        user_id: "user-2".to_string(),
                        amount: 1_500,
                        currency: Currency::Usd,
                    },
                    Some(key),
                )
                .await
                .unwrap()
        }));
    }

    let mut bodies = Vec::new();
    for h in handles {
        bodies.push(h.await.unwrap().body);
    }
    for body in &bodies[1..] {
        assert_eq!(body, &bodies[0], "every caller must see the same response");
    }

    let stored = app.idempotency.find(&key).await.unwrap().unwrap();
    assert_eq!(*stored.response_body(), bodies[0]);
}

// ── 3. record_insert_is_single_flight ──────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn record_insert_is_single_flight() {
    let app = setup();
    let key = IdempotencyKey::new("order-race-2").unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = app.idempotency.clone();
        let record =
            IdempotencyRecord::new(key.clone(), 200, serde_json::json!({"writer": i}));
        handles.push(tokio::spawn(async move { store.insert(&record).await.unwrap() }));
    }

    let mut winners = 0;
    for h in handles {
        if h.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "key uniqueness admits exactly one commit");
}

// ── 4. sweep_and_webhook_race_settles_once ─────────────────────────────────
// The reconciler and a late webhook chase the same stale transaction
// with the same verdict. Both paths go through the version check, so the
// row settles exactly once no matter who lands first.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sweep_and_webhook_race_settles_once() {
    let app = setup();
    let id = insert_aged_processing(&app, 120).await;
    app.psp.report(id, "COMPLETED", Some("PSP-RECOVERED"));

    let sweeper = Arc::new(reconciler(&app, 60));
    let service = app.service.clone();

    let sweep_task = tokio::spawn({
        let sweeper = sweeper.clone();
        async move { sweeper.sweep().await.unwrap() }
    });
    let webhook_task = tokio::spawn(async move {
        process_psp_webhook(
            &service,
            PspWebhook {
                transaction_id: id,
                psp_reference: "PSP-RECOVERED".to_string(),
                status: "COMPLETED".to_string(),
            },
        )
        .await
        .unwrap()
    });

    sweep_task.await.unwrap();
    let ack = webhook_task.await.unwrap();
    assert_eq!(ack, WebhookAck::Processed);

    let stored = app.service.get_payment(id).await.unwrap();
    assert_eq!(*stored.status(), TransactionStatus::Success);
    assert_eq!(stored.version(), 2, "both paths agree on a single write");
}
