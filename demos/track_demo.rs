//! Demonstration of a FocusFlow tracking session.
//!
//! This example shows how to:
//! 1. Define productive and distracting areas of interest
//! 2. Connect a collector to a GazeFlow tracker
//! 3. Feed gaze samples through a tracking session
//! 4. Compute the session report
//!
//! Run with: cargo run --example track_demo
//!
//! No eye tracker is needed: the demo starts a scripted GazeFlow stand-in on
//! a loopback port that sweeps the gaze across both regions and then hangs up.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use focusflow::{
    aoi::{AoiIndex, AoiKind, Rect},
    collector::{CollectorConfig, GazeCollector},
    metrics::{ReportBuilder, DEFAULT_SAMPLING_INTERVAL_SECS},
    protocol::{decode_length_prefixed_string, encode_length_prefixed_string, GazeSample},
    tracker::{TickOutcome, TrackingSession},
};

/// Where the scripted gaze goes, in canvas coordinates.
fn gaze_path() -> Vec<(f64, f64)> {
    let mut path = Vec::new();
    // Reading the editor
    for i in 0..20 {
        path.push((100.0 + i as f64 * 5.0, 200.0));
    }
    // A glance at the chat window
    for i in 0..8 {
        path.push((600.0 + i as f64 * 3.0, 150.0));
    }
    // Back to work
    for i in 0..15 {
        path.push((150.0, 220.0 + i as f64 * 4.0));
    }
    // Looking away from the screen
    for _ in 0..5 {
        path.push((900.0, 700.0));
    }
    path
}

fn serve(mut stream: TcpStream) -> std::io::Result<()> {
    let mut format = [0u8; 3];
    stream.read_exact(&mut format)?;
    let key = decode_length_prefixed_string(&mut stream)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    println!("  [tracker] format={:?} key={key:?}", String::from_utf8_lossy(&format));

    stream.write_all(&encode_length_prefixed_string("ok"))?;

    for (i, (x, y)) in gaze_path().into_iter().enumerate() {
        if i == 10 {
            stream.write_all(&encode_length_prefixed_string("<GazeData><GazeX>1"))?;
        }
        let xml = GazeSample::new(x, y).to_xml();
        stream.write_all(&encode_length_prefixed_string(&xml))?;
        thread::sleep(Duration::from_millis(25));
    }
    Ok(())
}

fn main() {
    println!("FocusFlow - Tracking Demo");
    println!("=========================");
    println!();

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let port = listener.local_addr().expect("listener address").port();
    let server = thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            if let Err(e) = serve(stream) {
                eprintln!("  [tracker] error: {e}");
            }
        }
    });

    // Regions on an 810x540 canvas
    let mut index = AoiIndex::new();
    index
        .add(Rect::from_corners(0.0, 0.0, 400.0, 540.0), AoiKind::Productive)
        .expect("valid AOI");
    index
        .add(Rect::from_corners(500.0, 0.0, 810.0, 300.0), AoiKind::Distraction)
        .expect("valid AOI");
    println!("Defined {} AOIs", index.len());

    let mut collector = GazeCollector::new(CollectorConfig {
        port,
        ..CollectorConfig::default()
    });
    if let Err(e) = collector.start() {
        eprintln!("Error starting collector: {e}");
        return;
    }

    let builder = ReportBuilder::new(DEFAULT_SAMPLING_INTERVAL_SECS);
    println!("Instance ID: {}", builder.instance_id());
    let mut tracking = TrackingSession::new(index, builder);
    tracking
        .start(Utc::now())
        .expect("session starts with AOIs defined");
    println!();

    let receiver = collector.receiver().clone();
    let mut report = None;
    while let Ok(event) = receiver.recv_timeout(Duration::from_secs(2)) {
        match tracking.handle(event) {
            TickOutcome::Classified {
                sample, category, ..
            } => {
                println!("  ({:>5.1}, {:>5.1}) -> {category}", sample.x, sample.y);
            }
            TickOutcome::Malformed { reason } => {
                println!("  skipped: {reason}");
            }
            TickOutcome::ConnectionLost { report: cut_short } => {
                println!("  tracker hung up");
                report = cut_short;
                break;
            }
        }
    }

    collector.stop();
    let _ = server.join();

    let report = match report {
        Some(report) => report,
        None => tracking.finish().expect("session was active"),
    };

    println!();
    println!("--- Session Metrics ---");
    println!("{}", report.summary());
    println!();

    let json = serde_json::to_string_pretty(&report).expect("report serializes");
    println!("Report JSON (truncated):");
    for line in json.lines().take(25) {
        println!("  {line}");
    }
    println!("  ...");
    println!();
    println!("{}", tracking.stats().summary());
}
