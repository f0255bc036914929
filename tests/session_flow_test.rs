//! End-to-end tests: fake tracker -> collector -> tracking session -> report.

mod common;

use common::{sample_payload, text_payload, FakeTracker, Script};
use focusflow::aoi::{load_index, save_index, AoiIndex, AoiKind, Category, Rect};
use focusflow::collector::{CollectorConfig, FeedEvent, GazeCollector};
use focusflow::error::{ConnectionError, Error};
use focusflow::metrics::{ReportBuilder, SessionReport};
use focusflow::stats::create_shared_stats;
use focusflow::tracker::{TickOutcome, TrackingSession};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn collector_for(tracker: &FakeTracker) -> GazeCollector {
    GazeCollector::new(CollectorConfig {
        port: tracker.port,
        poll_interval: Duration::from_millis(5),
        ..CollectorConfig::default()
    })
}

fn desk_layout() -> AoiIndex {
    let mut index = AoiIndex::new();
    index
        .add(Rect::from_corners(0.0, 0.0, 400.0, 540.0), AoiKind::Productive)
        .unwrap();
    index
        .add(Rect::from_corners(500.0, 0.0, 810.0, 300.0), AoiKind::Distraction)
        .unwrap();
    index
}

#[test]
fn test_tracked_session_produces_report() {
    let tracker = FakeTracker::spawn(
        Script::accepting(vec![
            sample_payload(100.0, 100.0),
            sample_payload(110.0, 100.0),
            sample_payload(120.0, 100.0),
            text_payload("<GazeData><GazeX>oops</GazeX></GazeData>"),
            sample_payload(600.0, 100.0),
            sample_payload(610.0, 100.0),
            sample_payload(130.0, 100.0),
            sample_payload(140.0, 100.0),
        ])
        .with_pacing(Duration::from_millis(10)),
    );

    let stats = create_shared_stats();
    let mut tracking = TrackingSession::new(desk_layout(), ReportBuilder::new(0.015))
        .with_stats(Arc::clone(&stats));
    tracking.start(chrono::Utc::now()).unwrap();

    let mut collector = collector_for(&tracker);
    collector.start().unwrap();

    let mut categories = Vec::new();
    let mut malformed = 0;
    let mut report = None;
    let receiver = collector.receiver().clone();
    while let Ok(event) = receiver.recv_timeout(Duration::from_secs(5)) {
        match tracking.handle(event) {
            TickOutcome::Classified {
                category, recorded, ..
            } => {
                assert!(recorded);
                categories.push(category);
            }
            TickOutcome::Malformed { .. } => malformed += 1,
            TickOutcome::ConnectionLost { report: cut_short } => {
                report = cut_short;
                break;
            }
        }
    }
    collector.stop();
    tracker.handshake_bytes();

    use Category::*;
    assert_eq!(
        categories,
        vec![Productive, Productive, Productive, Distraction, Distraction, Productive, Productive]
    );
    assert_eq!(malformed, 1);

    let report = report.expect("connection loss finishes the session");
    assert!(!tracking.is_active());
    assert_eq!(report.raw_log.len(), 7);
    assert_eq!(report.transitions.productive_to_distraction, 1);
    assert_eq!(report.transitions.distraction_to_productive, 1);
    assert_eq!(report.focus_bouts.count, 2);
    assert!(report.session_duration > 0.0);
    assert!((report.dwell_times.sum() - report.session_duration).abs() < 1e-6);
    assert!((report.dwell_percentages.sum() - 100.0).abs() < 1e-6);
    assert_eq!(report.dwell_times.outside, 0.0);

    let offsets: Vec<f64> = report.raw_log.iter().map(|e| e.offset_seconds).collect();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));

    let snap = stats.snapshot();
    assert_eq!(snap.samples_received, 7);
    assert_eq!(snap.malformed_samples, 1);
    assert_eq!(snap.events_recorded, 7);
    assert_eq!(snap.connection_losses, 1);
    assert_eq!(snap.sessions_completed, 1);
}

#[test]
fn test_report_survives_save_and_load() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![
        sample_payload(50.0, 50.0),
        sample_payload(700.0, 50.0),
    ]));
    let mut tracking = TrackingSession::new(desk_layout(), ReportBuilder::new(0.015));
    tracking.start(chrono::Utc::now()).unwrap();

    let mut collector = collector_for(&tracker);
    collector.start().unwrap();
    let receiver = collector.receiver().clone();
    let mut report = None;
    while let Ok(event) = receiver.recv_timeout(Duration::from_secs(5)) {
        if let TickOutcome::ConnectionLost { report: cut_short } = tracking.handle(event) {
            report = cut_short;
            break;
        }
    }
    collector.stop();
    let report = report.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let meta = report.meta.as_ref().unwrap();
    let path = dir.path().join(SessionReport::file_name(meta.started_at));
    report.save(&path).unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("session_"));

    let loaded = SessionReport::load(&path).unwrap();
    assert_eq!(loaded.raw_log.len(), 2);
    assert_eq!(loaded.raw_log[1].category, Category::Distraction);
    assert_eq!(loaded.transitions, report.transitions);
    assert_eq!(loaded.meta, report.meta);
    assert!((loaded.session_duration - report.session_duration).abs() < 1e-9);
}

#[test]
fn test_rejected_start_leaves_collector_idle() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![]).with_status("denied"));
    let mut collector = collector_for(&tracker);

    match collector.start() {
        Err(Error::Connection(ConnectionError::ConnectionRejected { reason })) => {
            assert_eq!(reason, "denied");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(!collector.is_running());
    assert!(collector.try_recv().is_none());
}

#[test]
fn test_stop_interrupts_idle_feed_without_connection_lost() {
    let tracker = FakeTracker::spawn(
        Script::accepting(vec![sample_payload(1.0, 1.0)]).hold_open(Duration::from_secs(10)),
    );
    let mut collector = collector_for(&tracker);
    collector.start().unwrap();
    assert!(collector.is_running());

    let first = collector
        .receiver()
        .recv_timeout(Duration::from_secs(5))
        .unwrap();
    assert!(matches!(first, FeedEvent::Sample { .. }));

    let started = Instant::now();
    collector.stop();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!collector.is_running());
    assert!(collector.try_recv().is_none());

    tracker.handshake_bytes();
}

#[test]
fn test_collector_stops_running_after_feed_ends() {
    let first = FakeTracker::spawn(Script::accepting(vec![sample_payload(1.0, 1.0)]));
    let mut collector = collector_for(&first);
    collector.start().unwrap();

    let receiver = collector.receiver().clone();
    let mut saw_lost = false;
    while let Ok(event) = receiver.recv_timeout(Duration::from_secs(5)) {
        if event.is_terminal() {
            saw_lost = true;
            break;
        }
    }
    assert!(saw_lost);

    let deadline = Instant::now() + Duration::from_secs(3);
    while collector.is_running() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!collector.is_running());
    first.handshake_bytes();
}

#[test]
fn test_aoi_definitions_persist_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aois.json");

    save_index(&desk_layout(), &path).unwrap();
    let index = load_index(&path).unwrap();

    assert_eq!(index.len(), 2);
    let orders: Vec<u64> = index.iter().map(|a| a.insertion_order).collect();
    assert_eq!(orders, vec![0, 1]);

    let mut tracking = TrackingSession::new(index, ReportBuilder::new(0.015));
    match tracking.handle(FeedEvent::sample(focusflow::GazeSample::new(650.0, 10.0))) {
        TickOutcome::Classified { category, .. } => assert_eq!(category, Category::Distraction),
        other => panic!("unexpected outcome: {other:?}"),
    }
}
