mod common;

use common::*;
use payflow::domain::transaction::TransactionStatus;
use payflow::services::reconciler::ReconcileStats;

// ── 1. stale_transaction_is_resolved_from_poll ─────────────────────────────
// A PROCESSING transaction past the staleness threshold whose webhook
// never arrived is settled from the provider's polled verdict.

#[tokio::test]
async fn stale_transaction_is_resolved_from_poll() {
    let app = setup();
    let id = insert_aged_processing(&app, 120).await;
    app.psp.report(id, "FAILED", Some("PSP-FAILED"));

    let stats = reconciler(&app, 60).sweep().await.unwrap();

    assert_eq!(
        stats,
        ReconcileStats {
            examined: 1,
            resolved: 1,
            failed: 0
        }
    );
    let stored = app.service.get_payment(id).await.unwrap();
    assert_eq!(*stored.status(), TransactionStatus::Failed);
}

// ── 2. sweep_only_polls_stale_processing_rows ──────────────────────────────
// Fresh PROCESSING rows and settled rows are not the reconciler's
// business; the provider is polled for the stale one only.

#[tokio::test]
async fn sweep_only_polls_stale_processing_rows() {
    let app = setup();
    let stale = insert_aged_processing(&app, 300).await;
    let fresh = create_processing_payment(&app, "user-1", 500).await;
    let settled = create_processing_payment(&app, "user-2", 700).await;
    app.service
        .transition(settled, TransactionStatus::Success)
        .await
        .unwrap();
    app.psp.report(stale, "COMPLETED", Some("PSP-RECOVERED"));

    let stats = reconciler(&app, 60).sweep().await.unwrap();

    assert_eq!(stats.examined, 1);
    assert_eq!(app.psp.polled_ids(), vec![stale]);
    assert_eq!(
        *app.service.get_payment(stale).await.unwrap().status(),
        TransactionStatus::Success
    );
    assert_eq!(
        *app.service.get_payment(fresh).await.unwrap().status(),
        TransactionStatus::Processing
    );
}

// ── 3. one_failure_does_not_stop_the_sweep ─────────────────────────────────

#[tokio::test]
async fn one_failure_does_not_stop_the_sweep() {
    let app = setup();
    let broken = insert_aged_processing(&app, 300).await;
    let fine = insert_aged_processing(&app, 200).await;
    app.psp.fail_status_for(broken);
    app.psp.report(fine, "COMPLETED", Some("PSP-RECOVERED"));

    let stats = reconciler(&app, 60).sweep().await.unwrap();

    assert_eq!(
        stats,
        ReconcileStats {
            examined: 2,
            resolved: 1,
            failed: 1
        }
    );
    assert_eq!(
        *app.service.get_payment(broken).await.unwrap().status(),
        TransactionStatus::Processing,
        "the broken one waits for the next sweep"
    );
    assert_eq!(
        *app.service.get_payment(fine).await.unwrap().status(),
        TransactionStatus::Success
    );
}

// ── 4. undecided_poll_leaves_the_row_alone ─────────────────────────────────
// The stub answers PENDING when no verdict is scripted; that is outside
// the settlement vocabulary, so nothing moves.

#[tokio::test]
async fn undecided_poll_leaves_the_row_alone() {
    let app = setup();
    let id = insert_aged_processing(&app, 120).await;

    let stats = reconciler(&app, 60).sweep().await.unwrap();

    assert_eq!(
        stats,
        ReconcileStats {
            examined: 1,
            resolved: 0,
            failed: 0
        }
    );
    let stored = app.service.get_payment(id).await.unwrap();
    assert_eq!(*stored.status(), TransactionStatus::Processing);
    assert_eq!(stored.version(), 1, "undecided poll must not touch the row");
}

// ── 5. consecutive_sweeps_are_harmless ──────────────────────────────────────
// Sweeps keep no state; running twice over the same backlog settles it
// once and finds nothing the second time.

#[tokio::test]
async fn consecutive_sweeps_are_harmless() {
    let app = setup();
    let id = insert_aged_processing(&app, 120).await;
    app.psp.report(id, "COMPLETED", Some("PSP-RECOVERED"));

    let sweeper = reconciler(&app, 60);
    let first = sweeper.sweep().await.unwrap();
    let second = sweeper.sweep().await.unwrap();

    assert_eq!(first.resolved, 1);
    assert_eq!(second.examined, 0, "settled rows leave the backlog");

    let stored = app.service.get_payment(id).await.unwrap();
    assert_eq!(*stored.status(), TransactionStatus::Success);
    assert_eq!(stored.version(), 2);
}
