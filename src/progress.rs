//! Crawl progress reporting.
//!
//! The walker emits a [`WalkEvent`] at every interesting step. Reporters
//! decide what to show. Progress goes to **stderr** so stdout stays
//! parseable for scripts. Failures are also logged through `tracing`
//! regardless of the reporter.

use std::io::Write;
use std::sync::Mutex;

use crate::models::Level;

/// A single progress event from the walker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkEvent {
    /// Started on the `index`-th (1-based) of `total` options at a sequential level.
    Entering {
        level: Level,
        path: String,
        label: String,
        index: usize,
        total: usize,
    },
    /// A level resolved to nothing (or failed), so the branch was dropped.
    BranchPruned { level: Level, path: String },
    /// A leaf lookup produced a link that was written to the sink.
    LinkFound { path: String, link: String },
    /// A leaf lookup succeeded but the page had no link.
    LinkNotFound { path: String },
    /// A leaf lookup failed.
    LookupFailed { path: String, reason: String },
}

/// Receives walk events. Called concurrently from pool workers.
pub trait WalkReporter: Send + Sync {
    fn report(&self, event: WalkEvent);
}

/// Human-friendly progress on stderr: "crawl  District 3 / 77  Kathmandu".
///
/// Only the sequential levels are shown; per-leaf detail is left to the
/// log.
pub struct StderrProgress;

impl WalkReporter for StderrProgress {
    fn report(&self, event: WalkEvent) {
        if let WalkEvent::Entering {
            level,
            label,
            index,
            total,
            ..
        } = &event
        {
            let indent = "  ".repeat(level.depth());
            let line = format!(
                "crawl  {}{} {} / {}  {}\n",
                indent,
                level.display_name(),
                format_number(*index as u64),
                format_number(*total as u64),
                label
            );
            let _ = std::io::stderr().lock().write_all(line.as_bytes());
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl WalkReporter for JsonProgress {
    fn report(&self, event: WalkEvent) {
        let obj = match &event {
            WalkEvent::Entering {
                level,
                path,
                label,
                index,
                total,
            } => serde_json::json!({
                "event": "entering",
                "level": level.list_type(),
                "path": path,
                "label": label,
                "n": index,
                "total": total
            }),
            WalkEvent::BranchPruned { level, path } => serde_json::json!({
                "event": "pruned",
                "level": level.list_type(),
                "path": path
            }),
            WalkEvent::LinkFound { path, link } => serde_json::json!({
                "event": "link",
                "path": path,
                "link": link
            }),
            WalkEvent::LinkNotFound { path } => serde_json::json!({
                "event": "link_not_found",
                "path": path
            }),
            WalkEvent::LookupFailed { path, reason } => serde_json::json!({
                "event": "lookup_failed",
                "path": path,
                "reason": reason
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl WalkReporter for NoProgress {
    fn report(&self, _event: WalkEvent) {}
}

/// Keeps every event; used by tests to assert on what the walker reported.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<WalkEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WalkEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl WalkReporter for RecordingProgress {
    fn report(&self, event: WalkEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse `off`, `human` or `json`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn WalkReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1), "1");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn progress_mode_parse() {
        assert_eq!(ProgressMode::parse("off"), Some(ProgressMode::Off));
        assert_eq!(ProgressMode::parse("human"), Some(ProgressMode::Human));
        assert_eq!(ProgressMode::parse("json"), Some(ProgressMode::Json));
        assert_eq!(ProgressMode::parse("verbose"), None);
    }

    #[test]
    fn recording_progress_keeps_order() {
        let rec = RecordingProgress::new();
        rec.report(WalkEvent::LinkNotFound {
            path: "State: 1".to_string(),
        });
        rec.report(WalkEvent::BranchPruned {
            level: Level::Ward,
            path: "State: 1".to_string(),
        });
        let events = rec.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], WalkEvent::LinkNotFound { .. }));
    }
}
