//! Poll scheduling, diffing and race safety
//!
//! Tick tests run on a paused clock, so intervals elapse instantly and
//! deterministically.

use std::time::Duration;

use feedwatch::TargetKind;
use feedwatch::actors::{MonitorEvent, TickOutcome};
use feedwatch::analysis::{ActivitySummary, WordCategory};
use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test]
async fn test_initial_fetch_is_never_counted() {
    let (engine, _feed, _store) = engine(vec![Step::Items(posts(&["a", "b", "c", "d"]))]);
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();

    engine.start_monitoring(id).await.unwrap();

    let target = engine.get_target(id).await.unwrap();
    assert_eq!(target.activities.len(), 4);
    assert_eq!(target.new_activity_count, 0);
    assert!(target.last_fetch_time.is_some());
}

#[tokio::test]
async fn test_diff_counts_only_unseen_ids() {
    let now = chrono::Utc::now();
    let minutes = |m: i64| now - chrono::Duration::minutes(m);

    let (engine, _feed, _store) = engine(vec![
        Step::Items(vec![post("a", minutes(30)), post("b", minutes(20)), post("c", minutes(10))]),
        Step::Items(vec![
            post("b", minutes(20)),
            post("e", minutes(1)),
            post("c", minutes(10)),
            post("d", minutes(5)),
        ]),
    ]);
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();
    engine.start_monitoring(id).await.unwrap();

    let outcome = engine.poll_now(id).await.unwrap();
    assert_eq!(outcome, TickOutcome::Applied { new_items: 2 });

    let target = engine.get_target(id).await.unwrap();
    assert_eq!(ids(&target.activities), vec!["e", "d", "c", "b"]);
    assert_eq!(target.new_activity_count, 2);
}

#[tokio::test]
async fn test_duplicate_ids_are_collapsed() {
    let (engine, _feed, _store) = engine(vec![Step::Items(posts(&["a", "a", "b", "a"]))]);
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();
    engine.start_monitoring(id).await.unwrap();
    engine.poll_now(id).await.unwrap();

    let target = engine.get_target(id).await.unwrap();
    assert_eq!(ids(&target.activities), vec!["a", "b"]);
}

#[tokio::test]
async fn test_summaries_follow_activities() {
    let now = chrono::Utc::now();
    let (engine, _feed, _store) = engine(vec![Step::Items(vec![
        post("p1", now),
        comment("c1", now),
        comment("c2", now),
    ])]);
    let id = engine.add_target("someone", TargetKind::Person).await.unwrap();
    engine.start_monitoring(id).await.unwrap();

    let target = engine.get_target(id).await.unwrap();
    assert_eq!(
        target.activity_summary,
        ActivitySummary::ByKind {
            posts: 1,
            comments: 2
        }
    );

    assert!(target.word_summary.len() >= 3);
    for category in [WordCategory::High, WordCategory::Medium, WordCategory::Low] {
        assert!(target.word_summary.iter().any(|w| w.category == category));
    }
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_data() {
    let (engine, _feed, _store) = engine(vec![
        Step::Items(posts(&["a", "b"])),
        Step::Fail("rate limited".to_string()),
        Step::Items(posts(&["c", "a", "b"])),
    ]);
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();
    engine.start_monitoring(id).await.unwrap();

    let outcome = engine.poll_now(id).await.unwrap();
    assert!(matches!(outcome, TickOutcome::Failed { ref error } if error.contains("rate limited")));

    let target = engine.get_target(id).await.unwrap();
    assert_eq!(target.activities.len(), 2);
    assert!(!target.is_fetching);
    assert!(target.last_error.is_some());

    // next tick recovers and counts against the data kept through the failure
    assert_eq!(
        engine.poll_now(id).await.unwrap(),
        TickOutcome::Applied { new_items: 1 }
    );
    assert!(engine.get_target(id).await.unwrap().last_error.is_none());
}

#[tokio::test]
async fn test_failed_initial_fetch_still_schedules_polling() {
    let (engine, feed, _store) = engine(vec![
        Step::Fail("scraper down".to_string()),
        Step::Items(posts(&["a"])),
    ]);
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();

    engine.start_monitoring(id).await.unwrap();
    let target = engine.get_target(id).await.unwrap();
    assert!(target.is_monitoring);
    assert!(target.last_error.is_some());

    // still no baseline, so the first successful fetch counts nothing
    assert_eq!(
        engine.poll_now(id).await.unwrap(),
        TickOutcome::Applied { new_items: 0 }
    );
    assert_eq!(feed.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_every_interval() {
    let (engine, feed, _store) = engine(vec![
        Step::Items(posts(&["a"])),
        Step::Items(posts(&["b", "a"])),
        Step::Items(posts(&["c", "b", "a"])),
    ]);
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();
    engine.start_monitoring(id).await.unwrap();
    assert_eq!(feed.calls(), 1);

    tokio::time::sleep(TEST_INTERVAL / 2).await;
    assert_eq!(feed.calls(), 1);

    tokio::time::sleep(TEST_INTERVAL).await;
    assert_eq!(feed.calls(), 2);

    tokio::time::sleep(TEST_INTERVAL).await;
    assert_eq!(feed.calls(), 3);

    let target = engine.get_target(id).await.unwrap();
    assert_eq!(target.new_activity_count, 2);
    assert_eq!(ids(&target.activities), vec!["c", "b", "a"]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_ticking() {
    let (engine, feed, _store) = engine(vec![Step::Items(posts(&["a"]))]);
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();
    engine.start_monitoring(id).await.unwrap();

    engine.stop_monitoring(id).await.unwrap();
    tokio::time::sleep(TEST_INTERVAL * 4).await;

    assert_eq!(feed.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tick_skipped_while_fetch_in_flight() {
    let feed = ScriptedFeed::gated(vec![Step::Items(posts(&["a"]))]);
    let engine = engine_with(feed.clone(), RecordingStore::new());
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();

    let starting = tokio::spawn({
        let engine = engine.clone();
        async move { engine.start_monitoring(id).await }
    });
    feed.wait_for_fetch().await;
    feed.release(1);
    starting.await.unwrap().unwrap();

    // first tick blocks inside the feed
    tokio::time::sleep(TEST_INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(feed.calls(), 2);
    assert!(engine.get_target(id).await.unwrap().is_fetching);

    // two more ticks elapse while it is still in flight
    tokio::time::sleep(TEST_INTERVAL * 2).await;
    assert_eq!(feed.calls(), 2);
    assert_eq!(engine.poll_now(id).await.unwrap(), TickOutcome::Skipped);

    feed.release(1);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!engine.get_target(id).await.unwrap().is_fetching);

    engine.stop_monitoring(id).await.unwrap();
    feed.release(8);
}

#[tokio::test]
async fn test_stop_during_first_fetch_discards_result() {
    let feed = ScriptedFeed::gated(vec![Step::Items(posts(&["a", "b"]))]);
    let store = RecordingStore::new();
    let engine = engine_with(feed.clone(), store.clone());
    let mut events = engine.subscribe();
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();

    let starting = tokio::spawn({
        let engine = engine.clone();
        async move { engine.start_monitoring(id).await }
    });
    feed.wait_for_fetch().await;

    let snapshot = engine.stop_monitoring(id).await.unwrap().unwrap();
    assert!(snapshot.activities.is_empty());

    feed.release(1);
    starting.await.unwrap().unwrap();

    let target = engine.get_target(id).await.unwrap();
    assert!(target.activities.is_empty());
    assert!(!target.is_monitoring);
    assert!(!target.is_fetching);
    assert_eq!(store.saves(), 1);

    let mut discarded = false;
    while let Ok(event) = events.try_recv() {
        discarded |= matches!(event, MonitorEvent::StaleFetchDiscarded { target_id } if target_id == id);
    }
    assert!(discarded);
}

#[tokio::test]
async fn test_restart_during_stale_fetch_applies_only_new_session() {
    let feed = ScriptedFeed::gated(vec![
        Step::Items(posts(&["stale"])),
        Step::Items(posts(&["fresh"])),
    ]);
    let engine = engine_with(feed.clone(), RecordingStore::new());
    let id = engine.add_target("rust", TargetKind::Group).await.unwrap();

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.start_monitoring(id).await }
    });
    feed.wait_for_fetch().await;
    engine.stop_monitoring(id).await.unwrap();

    let second = tokio::spawn({
        let engine = engine.clone();
        async move { engine.restart_monitoring(id).await }
    });
    feed.wait_for_fetch().await;

    // complete both fetches; only the restarted session may apply
    feed.release(2);
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let target = engine.get_target(id).await.unwrap();
    assert!(target.is_monitoring);
    assert_eq!(ids(&target.activities), vec!["fresh"]);

    engine.stop_monitoring(id).await.unwrap();
}

#[tokio::test]
async fn test_independent_targets() {
    let (engine, feed, _store) = engine(vec![Step::Items(posts(&["a"]))]);
    let rust = engine.add_target("rust", TargetKind::Group).await.unwrap();
    let someone = engine.add_target("someone", TargetKind::Person).await.unwrap();

    engine.start_monitoring(rust).await.unwrap();
    engine.start_monitoring(someone).await.unwrap();
    engine.stop_monitoring(rust).await.unwrap();

    assert_eq!(feed.calls(), 2);
    assert!(engine.get_target(someone).await.unwrap().is_monitoring);
    assert_eq!(
        engine.poll_now(someone).await.unwrap(),
        TickOutcome::Applied { new_items: 0 }
    );
}
