//! Attention metrics computed from a finished session log.
//!
//! Each event is weighted by the time until the next event; the last event
//! reuses the interval before it. Everything here is derived from the log
//! alone, so the same log always yields the same report.

use crate::aoi::Category;
use crate::metrics::report::{CategoryValues, FocusBouts, SessionReport, Transitions};
use crate::session::{SessionEvent, SessionLog};
use statrs::statistics::Statistics;

/// Nominal tracker sampling interval in seconds.
pub const DEFAULT_SAMPLING_INTERVAL_SECS: f64 = 0.015;

/// Compute the report for `log`.
///
/// `fallback_interval` is the duration given to the only event of a
/// single-event log.
pub fn compute(log: &SessionLog, fallback_interval: f64) -> SessionReport {
    let events = log.events();
    if events.is_empty() {
        return SessionReport::default();
    }

    let durations = event_durations(events, fallback_interval);
    let dwell_times = dwell_times(events, &durations);
    let total = dwell_times.sum();

    SessionReport {
        session_duration: total,
        dwell_times,
        dwell_percentages: dwell_percentages(&dwell_times, total),
        transitions: count_transitions(events),
        focus_bouts: focus_bouts(events),
        raw_log: events.to_vec(),
        re_engagement_latency: None,
        meta: None,
    }
}

/// Synthetic duration of each event.
pub fn event_durations(events: &[SessionEvent], fallback_interval: f64) -> Vec<f64> {
    match events.len() {
        0 => Vec::new(),
        1 => vec![fallback_interval],
        _ => {
            let mut durations: Vec<f64> = events
                .windows(2)
                .map(|pair| pair[1].offset_seconds - pair[0].offset_seconds)
                .collect();
            let last = durations[durations.len() - 1];
            durations.push(last);
            durations
        }
    }
}

fn dwell_times(events: &[SessionEvent], durations: &[f64]) -> CategoryValues {
    let mut dwell = CategoryValues::default();
    for (event, dt) in events.iter().zip(durations) {
        *dwell.get_mut(event.category) += dt;
    }
    dwell
}

fn dwell_percentages(dwell: &CategoryValues, total: f64) -> CategoryValues {
    if total <= 0.0 {
        return CategoryValues::default();
    }
    CategoryValues {
        productive: dwell.productive / total * 100.0,
        distraction: dwell.distraction / total * 100.0,
        outside: dwell.outside / total * 100.0,
    }
}

/// Count direct switches between productive and distracting regions.
/// Pairs involving `Outside` do not count.
pub fn count_transitions(events: &[SessionEvent]) -> Transitions {
    let mut transitions = Transitions::default();
    for pair in events.windows(2) {
        match (pair[0].category, pair[1].category) {
            (Category::Productive, Category::Distraction) => {
                transitions.productive_to_distraction += 1
            }
            (Category::Distraction, Category::Productive) => {
                transitions.distraction_to_productive += 1
            }
            _ => {}
        }
    }
    transitions
}

/// Durations of maximal productive runs, first to last event of each run.
/// Runs of zero length are dropped.
pub fn focus_bout_durations(events: &[SessionEvent]) -> Vec<f64> {
    let mut durations = Vec::new();
    let mut run: Option<(f64, f64)> = None;

    for event in events {
        if event.category == Category::Productive {
            run = match run {
                Some((first, _)) => Some((first, event.offset_seconds)),
                None => Some((event.offset_seconds, event.offset_seconds)),
            };
        } else if let Some((first, last)) = run.take() {
            durations.push(last - first);
        }
    }
    // A run still open closes at the final event.
    if let Some((first, last)) = run {
        durations.push(last - first);
    }

    durations.retain(|&d| d > 0.0);
    durations
}

fn focus_bouts(events: &[SessionEvent]) -> FocusBouts {
    let durations = focus_bout_durations(events);
    if durations.is_empty() {
        return FocusBouts::default();
    }

    FocusBouts {
        count: durations.len() as u64,
        avg_duration: Statistics::mean(durations.iter()),
        max_duration: Statistics::max(durations.iter()),
        durations_list: durations,
    }
}
