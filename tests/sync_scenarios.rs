mod common;

use catch_sync::test_support::application::ports::offline_store::OfflinePersistence;
use catch_sync::test_support::application::ports::submission_gateway::SubmissionRequest;
use catch_sync::test_support::application::ports::sync_runner::SyncRunner;
use catch_sync::test_support::application::services::sync_service::{SyncPolicy, SyncService};
use catch_sync::test_support::domain::entities::offline::{
    ClaimOutcome, PendingItemDraft, PendingPayload,
};
use catch_sync::test_support::domain::value_objects::{PendingItemKind, SyncQueueStatus};
use catch_sync::test_support::infrastructure::sync::{SyncTriggerLoop, WakeAck};
use catch_sync::test_support::shared::Clock;
use chrono::Duration;
use common::{
    ScriptedGateway, catch_draft, file_harness, memory_harness, wait_for_calls, waypoint,
    waypoint_draft,
};
use std::sync::Arc;
use tokio::sync::Notify;

#[tokio::test]
async fn failures_back_off_then_succeed() {
    let h = memory_harness(ScriptedGateway::failing_times(3)).await;
    let enqueued = h.store.enqueue(catch_draft("trip-a"), h.clock.now()).await.unwrap();

    let entry = h.store.get_entry(enqueued.queue_id).await.unwrap().unwrap();
    assert_eq!(entry.retry_count, 0);

    for (expected_count, delay_minutes) in [(1u32, 2i64), (2, 4), (3, 8)] {
        let attempted_at = h.clock.now();
        let result = h.service.run_once("test").await.unwrap();
        assert_eq!(result.failed_count, 1);

        let entry = h.store.get_entry(enqueued.queue_id).await.unwrap().unwrap();
        assert_eq!(entry.retry_count, expected_count);
        assert_eq!(entry.status, SyncQueueStatus::Failed);
        assert_eq!(
            entry.next_retry_at.unwrap() - attempted_at,
            Duration::minutes(delay_minutes)
        );

        h.clock.advance(Duration::minutes(delay_minutes));
    }

    let result = h.service.run_once("test").await.unwrap();
    assert_eq!(result.synced_count, 1);
    assert_eq!(result.pending_count, 0);
    assert_eq!(h.gateway.calls(), 4);

    assert!(h.store.get_entry(enqueued.queue_id).await.unwrap().is_none());
    let item = h
        .store
        .get_pending_item(PendingItemKind::Catch, enqueued.item_id)
        .await
        .unwrap()
        .unwrap();
    assert!(item.submitted);
    assert_eq!(item.submitted_at, Some(h.clock.now()));
}

#[tokio::test]
async fn manual_wake_before_retry_time_makes_no_call() {
    let h = memory_harness(ScriptedGateway::failing_times(1)).await;
    let enqueued = h
        .store
        .enqueue(waypoint_draft("user-b"), h.clock.now())
        .await
        .unwrap();
    h.service.run_once("test").await.unwrap();
    assert_eq!(h.gateway.calls(), 1);

    let (waker, trigger_loop) = SyncTriggerLoop::channel(h.service.clone(), 4);
    trigger_loop.spawn();

    h.clock.advance(Duration::minutes(1));
    let ack = waker.request_sync().await;
    assert_eq!(ack, WakeAck::ok());
    assert_eq!(h.gateway.calls(), 1);

    let entry = h.store.get_entry(enqueued.queue_id).await.unwrap().unwrap();
    assert_eq!(entry.retry_count, 1);
}

#[tokio::test]
async fn concurrent_runs_deliver_once_in_memory() {
    let h = memory_harness(
        ScriptedGateway::accepting().with_delay(std::time::Duration::from_millis(50)),
    )
    .await;
    h.store.enqueue(catch_draft("trip-c"), h.clock.now()).await.unwrap();

    let (first, second) = tokio::join!(h.service.run_once("one"), h.service.run_once("two"));
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(h.gateway.calls(), 1);
    assert_eq!(first.synced_count + second.synced_count, 1);
    assert!(h.store.list_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_runs_deliver_once_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let h = file_harness(
        &dir.path().join("offline.db"),
        ScriptedGateway::accepting().with_delay(std::time::Duration::from_millis(50)),
    )
    .await;
    for trip in ["trip-1", "trip-2", "trip-3"] {
        h.store.enqueue(catch_draft(trip), h.clock.now()).await.unwrap();
    }

    let runs = (0..4).map(|i| {
        let service = h.service.clone();
        tokio::spawn(async move { service.run_once(&format!("run-{i}")).await })
    });
    let results = futures::future::join_all(runs).await;

    let synced: u32 = results
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().synced_count)
        .sum();
    assert_eq!(synced, 3);
    assert_eq!(h.gateway.calls(), 3);
    assert!(h.store.list_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn failing_item_is_never_lost() {
    let h = memory_harness(ScriptedGateway::failing_times(50)).await;
    let enqueued = h.store.enqueue(catch_draft("trip-d"), h.clock.now()).await.unwrap();

    for _ in 0..8 {
        h.service.run_once("test").await.unwrap();
        h.clock.advance(Duration::minutes(30));
    }

    let entry = h.store.get_entry(enqueued.queue_id).await.unwrap().unwrap();
    assert_eq!(entry.retry_count, 8);
    assert!(entry.last_error.unwrap().contains("500"));

    let item = h
        .store
        .get_pending_item(PendingItemKind::Catch, enqueued.item_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!item.submitted);
    assert!(item.submitted_at.is_none());
}

#[tokio::test]
async fn rerunning_after_success_is_a_no_op() {
    let h = memory_harness(ScriptedGateway::accepting()).await;
    h.store.enqueue(catch_draft("trip-e"), h.clock.now()).await.unwrap();

    let first = h.service.run_once("test").await.unwrap();
    let second = h.service.run_once("test").await.unwrap();

    assert_eq!(first.synced_count, 1);
    assert_eq!(second.attempted(), 0);
    assert_eq!(h.gateway.calls(), 1);
}

#[tokio::test]
async fn orphaned_entries_are_removed_without_delivery() {
    let h = memory_harness(ScriptedGateway::accepting()).await;
    let missing = h.store.enqueue(catch_draft("trip-f"), h.clock.now()).await.unwrap();
    let submitted = h.store.enqueue(catch_draft("trip-g"), h.clock.now()).await.unwrap();

    sqlx::query("DELETE FROM catch_reports WHERE id = ?1")
        .bind(missing.item_id.value())
        .execute(h.store.pool())
        .await
        .unwrap();
    sqlx::query("UPDATE catch_reports SET submitted = 1, submitted_at = 1 WHERE id = ?1")
        .bind(submitted.item_id.value())
        .execute(h.store.pool())
        .await
        .unwrap();

    let result = h.service.run_once("test").await.unwrap();
    assert_eq!(result.orphaned_count, 2);
    assert_eq!(h.gateway.calls(), 0);
    assert!(h.store.list_entries().await.unwrap().is_empty());
    assert_eq!(h.service.metrics_snapshot().total_orphaned, 2);
}

#[tokio::test]
async fn abandoned_claim_is_retried_after_lease() {
    let h = memory_harness(ScriptedGateway::accepting()).await;
    let enqueued = h.store.enqueue(catch_draft("trip-h"), h.clock.now()).await.unwrap();

    // A context that died right after claiming.
    let now = h.clock.now();
    let outcome = h
        .store
        .claim_entry(enqueued.queue_id, now, now + Duration::minutes(10))
        .await
        .unwrap();
    assert!(matches!(outcome, ClaimOutcome::Claimed(_)));

    let result = h.service.run_once("test").await.unwrap();
    assert_eq!(result.attempted(), 0);

    h.clock.advance(Duration::minutes(10));
    let result = h.service.run_once("test").await.unwrap();
    assert_eq!(result.synced_count, 1);

    let entry = h.store.get_entry(enqueued.queue_id).await;
    assert!(entry.unwrap().is_none());
}

#[tokio::test]
async fn one_failing_entry_does_not_stop_the_scan() {
    let h = memory_harness(ScriptedGateway::failing_times(1)).await;
    let first = h.store.enqueue(catch_draft("trip-i"), h.clock.now()).await.unwrap();
    h.store
        .enqueue(
            PendingItemDraft::new(PendingPayload::Waypoint(waypoint("user-1")), None),
            h.clock.now(),
        )
        .await
        .unwrap();

    let result = h.service.run_once("test").await.unwrap();
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.synced_count, 1);
    assert_eq!(result.pending_count, 1);

    let requests = h.gateway.requests();
    assert!(matches!(requests[0], SubmissionRequest::Catch(_)));
    assert!(matches!(requests[1], SubmissionRequest::Waypoint(_)));

    let remaining = h.store.list_entries().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first.queue_id);
}

#[tokio::test]
async fn higher_priority_entries_go_first() {
    let h = memory_harness(ScriptedGateway::accepting()).await;
    h.store.enqueue(catch_draft("low"), h.clock.now()).await.unwrap();
    h.store
        .enqueue(
            PendingItemDraft::new(PendingPayload::Waypoint(waypoint("urgent")), Some(9)),
            h.clock.now(),
        )
        .await
        .unwrap();

    h.service.run_once("test").await.unwrap();
    let requests = h.gateway.requests();
    assert!(matches!(requests[0], SubmissionRequest::Waypoint(_)));
}

#[tokio::test]
async fn slow_upload_is_not_picked_up_again_by_the_same_worker() {
    let gate = Arc::new(Notify::new());
    let h = memory_harness(ScriptedGateway::accepting().with_gate(gate.clone())).await;
    let enqueued = h
        .store
        .enqueue(waypoint_draft("user-slow"), h.clock.now())
        .await
        .unwrap();

    let first = {
        let service = h.service.clone();
        tokio::spawn(async move { service.run_once("first").await })
    };
    wait_for_calls(&h.gateway, 1).await;

    // The upload outlives the lease.
    h.clock.advance(Duration::minutes(11));
    let second = h.service.run_once("second").await.unwrap();
    assert_eq!(second.attempted(), 0);
    assert_eq!(second.skipped_count, 1);

    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.synced_count, 1);
    assert_eq!(h.gateway.calls(), 1);
    assert!(h.store.get_entry(enqueued.queue_id).await.unwrap().is_none());
}

#[tokio::test]
async fn slow_upload_keeps_its_lease_across_workers() {
    let gate = Arc::new(Notify::new());
    let h = memory_harness(ScriptedGateway::accepting().with_gate(gate.clone())).await;
    let policy = SyncPolicy {
        heartbeat_interval: std::time::Duration::from_millis(10),
        ..SyncPolicy::default()
    };
    let uploader = Arc::new(SyncService::new(
        h.store.clone(),
        h.gateway.clone(),
        h.clock.clone(),
        policy,
    ));
    let other = Arc::new(SyncService::new(
        h.store.clone(),
        h.gateway.clone(),
        h.clock.clone(),
        policy,
    ));
    let enqueued = h.store.enqueue(catch_draft("trip-slow"), h.clock.now()).await.unwrap();

    let first = {
        let uploader = uploader.clone();
        tokio::spawn(async move { uploader.run_once("uploader").await })
    };
    wait_for_calls(&h.gateway, 1).await;

    h.clock.advance(Duration::minutes(11));
    let mut renewed = false;
    for _ in 0..200 {
        let entry = h.store.get_entry(enqueued.queue_id).await.unwrap().unwrap();
        if entry.next_retry_at.is_some_and(|at| at > h.clock.now()) {
            renewed = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert!(renewed, "lease was not renewed while the upload was in flight");

    let second = other.run_once("other").await.unwrap();
    assert_eq!(second.attempted(), 0);
    assert_eq!(h.gateway.calls(), 1);

    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.synced_count, 1);
    assert_eq!(h.gateway.calls(), 1);
    assert!(h.store.list_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn undecodable_payload_backs_off_like_a_failed_delivery() {
    let h = memory_harness(ScriptedGateway::accepting()).await;
    let enqueued = h.store.enqueue(catch_draft("trip-bad"), h.clock.now()).await.unwrap();
    sqlx::query("UPDATE catch_reports SET payload = '{}' WHERE id = ?1")
        .bind(enqueued.item_id.value())
        .execute(h.store.pool())
        .await
        .unwrap();

    for (expected_count, delay_minutes) in [(1u32, 2i64), (2, 4), (3, 8)] {
        let attempted_at = h.clock.now();
        let result = h.service.run_once("test").await.unwrap();
        assert_eq!(result.failed_count, 1);

        let entry = h.store.get_entry(enqueued.queue_id).await.unwrap().unwrap();
        assert_eq!(entry.retry_count, expected_count);
        assert_eq!(entry.status, SyncQueueStatus::Failed);
        assert!(entry.last_error.is_some());
        assert_eq!(
            entry.next_retry_at.unwrap() - attempted_at,
            Duration::minutes(delay_minutes)
        );

        h.clock.advance(Duration::minutes(delay_minutes));
    }

    assert_eq!(h.gateway.calls(), 0);
    assert_eq!(h.service.metrics_snapshot().total_failure, 3);
}
