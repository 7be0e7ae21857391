//! End-to-end pipeline behavior: parse → queue → flush → local rows → sync.

mod common;
use common::{MockRemote, memory_store};

use stationsync::db::queries::{
    close_open_visit, list_station_visits, list_visitors, select_unsynced_visitors,
    select_unsynced_visits,
};
use stationsync::ingest::handle_message;
use stationsync::models::command::CloseVisit;
use stationsync::queue::CommandQueue;
use stationsync::utils::time::format_epoch_sortable;
use stationsync::worker::persistence::flush_once;
use stationsync::worker::remote_sync::sync_once;

fn publish(queue: &CommandQueue, json: &str) {
    handle_message(json.as_bytes(), queue);
}

// ---------------------------------------------------------------------------
// Scenario A/B: entry opens a visit, exit closes exactly that visit
// ---------------------------------------------------------------------------

#[test]
fn entry_creates_visitor_and_open_visit() {
    let store = memory_store();
    let queue = CommandQueue::new();

    publish(
        &queue,
        r#"{"token":"T1","epoch":1700000000,"check":1,"location":"network"}"#,
    );
    let report = flush_once(&store, &queue).unwrap();
    assert_eq!(report.drained, 2);
    assert_eq!(report.applied, 2);
    assert_eq!(report.failed, 0);

    store
        .with_conn(|conn| {
            let visitors = list_visitors(conn)?;
            assert_eq!(visitors.len(), 1);
            assert_eq!(visitors[0].token, "T1");
            assert_eq!(visitors[0].created_at, format_epoch_sortable(1_700_000_000));

            let visits = list_station_visits(conn)?;
            assert_eq!(visits.len(), 1);
            assert_eq!(visits[0].token, "T1");
            assert_eq!(visits[0].station_id, "network");
            assert!(visits[0].is_open());
            assert!(!visits[0].synced_to_remote);
            Ok(())
        })
        .unwrap();
}

#[test]
fn exit_closes_the_open_visit() {
    let store = memory_store();
    let queue = CommandQueue::new();

    publish(
        &queue,
        r#"{"token":"T1","epoch":1700000000,"check":1,"location":"network"}"#,
    );
    publish(
        &queue,
        r#"{"token":"T1","epoch":1700000600,"check":0,"location":"network"}"#,
    );
    flush_once(&store, &queue).unwrap();

    store
        .with_conn(|conn| {
            let visits = list_station_visits(conn)?;
            assert_eq!(visits.len(), 1);
            assert_eq!(
                visits[0].check_out_time.as_deref(),
                Some(format_epoch_sortable(1_700_000_600).as_str())
            );
            assert!(!visits[0].synced_to_remote);
            Ok(())
        })
        .unwrap();
}

// ---------------------------------------------------------------------------
// P1: idempotent visitor creation
// ---------------------------------------------------------------------------

#[test]
fn duplicate_visitor_creation_keeps_first_seen_time() {
    let store = memory_store();
    let queue = CommandQueue::new();

    publish(
        &queue,
        r#"{"token":"T1","epoch":1700000000,"check":1,"location":"network"}"#,
    );
    publish(
        &queue,
        r#"{"token":"T1","epoch":1700009999,"check":1,"location":"robotics"}"#,
    );
    flush_once(&store, &queue).unwrap();

    store
        .with_conn(|conn| {
            let visitors = list_visitors(conn)?;
            assert_eq!(visitors.len(), 1);
            // the second entry did not overwrite the first sighting
            assert_eq!(visitors[0].created_at, format_epoch_sortable(1_700_000_000));
            // but it did open a second visit at the other station
            assert_eq!(list_station_visits(conn)?.len(), 2);
            Ok(())
        })
        .unwrap();
}

// ---------------------------------------------------------------------------
// P2: checkout matches only the open visit, second checkout hits nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checkout_matches_open_visit_and_clears_sync_flag() {
    let store = memory_store();
    let queue = CommandQueue::new();
    let remote = MockRemote::default();

    publish(
        &queue,
        r#"{"token":"T1","epoch":1700000000,"check":1,"location":"network"}"#,
    );
    flush_once(&store, &queue).unwrap();

    // mark everything synced so the flag-clearing is observable
    let report = sync_once(&store, &remote, 200).await;
    assert!(report.is_clean());
    store
        .with_conn(|conn| {
            assert!(select_unsynced_visits(conn, 200)?.is_empty());
            Ok(())
        })
        .unwrap();

    publish(
        &queue,
        r#"{"token":"T1","epoch":1700000600,"check":0,"location":"network"}"#,
    );
    flush_once(&store, &queue).unwrap();

    store
        .with_conn(|conn| {
            let visits = list_station_visits(conn)?;
            assert_eq!(visits.len(), 1);
            assert!(visits[0].check_out_time.is_some());
            assert!(!visits[0].synced_to_remote);

            // no open row left: a second checkout affects zero rows
            let affected = close_open_visit(
                conn,
                &CloseVisit {
                    check_out_time: format_epoch_sortable(1_700_000_700),
                    token: "T1".to_string(),
                    station_id: "network".to_string(),
                },
            )?;
            assert_eq!(affected, 0);
            Ok(())
        })
        .unwrap();
}

// ---------------------------------------------------------------------------
// P3: per-command containment inside a flush
// ---------------------------------------------------------------------------

#[test]
fn failing_command_does_not_abort_the_flush() {
    let store = memory_store();
    let queue = CommandQueue::new();

    // A trigger that rejects one specific token stands in for a constraint
    // violation mid-flush.
    store
        .with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_boom BEFORE INSERT ON station_visits
                 WHEN NEW.token = 'BOOM'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )?;
            Ok(())
        })
        .unwrap();

    publish(
        &queue,
        r#"{"token":"OK1","epoch":1700000000,"check":1,"location":"network"}"#,
    );
    publish(
        &queue,
        r#"{"token":"BOOM","epoch":1700000001,"check":1,"location":"network"}"#,
    );
    publish(
        &queue,
        r#"{"token":"OK2","epoch":1700000002,"check":1,"location":"network"}"#,
    );

    let report = flush_once(&store, &queue).unwrap();
    assert_eq!(report.drained, 6);
    assert_eq!(report.failed, 1);
    assert_eq!(report.applied, 5);

    store
        .with_conn(|conn| {
            // the two good visits committed, the rejected one is absent
            let visits = list_station_visits(conn)?;
            let tokens: Vec<&str> = visits.iter().map(|v| v.token.as_str()).collect();
            assert_eq!(visits.len(), 2);
            assert!(tokens.contains(&"OK1"));
            assert!(tokens.contains(&"OK2"));
            // the visitor row for BOOM still landed (its own command succeeded)
            assert_eq!(list_visitors(conn)?.len(), 3);
            Ok(())
        })
        .unwrap();
}

// ---------------------------------------------------------------------------
// P4 + P5: sync idempotence and retry on failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_sync_run_makes_no_remote_calls() {
    let store = memory_store();
    let queue = CommandQueue::new();
    let remote = MockRemote::default();

    publish(
        &queue,
        r#"{"token":"T1","epoch":1700000000,"check":1,"location":"network"}"#,
    );
    flush_once(&store, &queue).unwrap();

    let first = sync_once(&store, &remote, 200).await;
    assert_eq!(first.visitors_synced, 1);
    assert_eq!(first.visits_synced, 1);

    let second = sync_once(&store, &remote, 200).await;
    assert!(second.is_clean());
    assert_eq!(second.visitors_synced, 0);
    assert_eq!(second.visits_synced, 0);
    assert_eq!(remote.visitor_batch_count(), 1);
    assert_eq!(remote.visit_batch_count(), 1);
}

#[tokio::test]
async fn failed_sync_leaves_rows_unsynced_and_retries() {
    let store = memory_store();
    let queue = CommandQueue::new();
    let remote = MockRemote::default();

    publish(
        &queue,
        r#"{"token":"T1","epoch":1700000000,"check":1,"location":"network"}"#,
    );
    flush_once(&store, &queue).unwrap();

    remote.set_failing(true);
    let failed = sync_once(&store, &remote, 200).await;
    assert_eq!(failed.failed_tables, 2);
    store
        .with_conn(|conn| {
            assert_eq!(select_unsynced_visitors(conn, 200)?.len(), 1);
            assert_eq!(select_unsynced_visits(conn, 200)?.len(), 1);
            Ok(())
        })
        .unwrap();

    // next tick: same rows are re-selected and re-submitted
    remote.set_failing(false);
    let retried = sync_once(&store, &remote, 200).await;
    assert_eq!(retried.visitors_synced, 1);
    assert_eq!(retried.visits_synced, 1);
    let batches = remote.visitor_batches.lock().unwrap();
    assert_eq!(batches[0][0].token, "T1");
}

#[tokio::test]
async fn sync_respects_batch_size() {
    let store = memory_store();
    let queue = CommandQueue::new();
    let remote = MockRemote::default();

    for i in 0..5 {
        publish(
            &queue,
            &format!(
                r#"{{"token":"T{}","epoch":{},"check":1,"location":"network"}}"#,
                i,
                1_700_000_000 + i
            ),
        );
    }
    flush_once(&store, &queue).unwrap();

    let first = sync_once(&store, &remote, 2).await;
    assert_eq!(first.visitors_synced, 2);
    let second = sync_once(&store, &remote, 2).await;
    assert_eq!(second.visitors_synced, 2);
    let third = sync_once(&store, &remote, 2).await;
    assert_eq!(third.visitors_synced, 1);
}

// ---------------------------------------------------------------------------
// Scenario C: registration applies unconditionally
// ---------------------------------------------------------------------------

#[test]
fn registration_sets_fields_and_reward_stamp() {
    let store = memory_store();
    let queue = CommandQueue::new();

    publish(
        &queue,
        r#"{"token":"T1","epoch":1700000000,"check":1,"location":"network"}"#,
    );
    // no eligibility gating here: register lands regardless of how many
    // stations the token completed
    publish(
        &queue,
        r#"{"eventType":"register","token":"T1","fullname":"Ada L","age":17,"gender":"F","school":"KMITL","email":"a@b.c","phone":"0812345678","epoch":1700001000}"#,
    );
    flush_once(&store, &queue).unwrap();

    store
        .with_conn(|conn| {
            let visitors = list_visitors(conn)?;
            assert_eq!(visitors.len(), 1);
            let v = &visitors[0];
            assert!(v.is_registered());
            assert_eq!(v.fullname.as_deref(), Some("Ada L"));
            assert_eq!(v.age, Some(17));
            let stamp = format_epoch_sortable(1_700_001_000);
            assert_eq!(v.registered_at.as_deref(), Some(stamp.as_str()));
            assert_eq!(v.reward_claimed_at.as_deref(), Some(stamp.as_str()));
            assert!(!v.synced_to_remote);
            Ok(())
        })
        .unwrap();
}

// ---------------------------------------------------------------------------
// Malformed input and fallback read ordering
// ---------------------------------------------------------------------------

#[test]
fn malformed_messages_are_dropped_without_queueing() {
    let queue = CommandQueue::new();

    publish(&queue, "not json at all");
    publish(&queue, r#"{"token":"T1"}"#);
    publish(&queue, r#"{"token":"T1","epoch":1700000000,"check":42}"#);

    assert!(queue.is_empty());
}

#[test]
fn fallback_reads_are_newest_first() {
    let store = memory_store();
    let queue = CommandQueue::new();

    publish(
        &queue,
        r#"{"token":"OLD","epoch":1700000000,"check":1,"location":"network"}"#,
    );
    publish(
        &queue,
        r#"{"token":"NEW","epoch":1700090000,"check":1,"location":"robotics"}"#,
    );
    flush_once(&store, &queue).unwrap();

    store
        .with_conn(|conn| {
            let visitors = list_visitors(conn)?;
            assert_eq!(visitors[0].token, "NEW");
            assert_eq!(visitors[1].token, "OLD");

            let visits = list_station_visits(conn)?;
            assert_eq!(visits[0].station_id, "robotics");
            Ok(())
        })
        .unwrap();
}

// Empty flush never opens a transaction and reports a no-op.
#[test]
fn empty_flush_is_a_noop() {
    let store = memory_store();
    let queue = CommandQueue::new();

    let report = flush_once(&store, &queue).unwrap();
    assert_eq!(report.drained, 0);
    assert_eq!(report.applied, 0);
}
