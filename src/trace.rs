//! Structured execution trace for pipeline runs

use std::time::Duration;

use crate::grid::Grid;

/// One executed pass.
#[derive(Debug, Clone)]
pub struct PassSpan {
    pub pass: String,
    pub duration: Duration,
    pub notes: Vec<String>,
}

/// A grid snapshot taken after a pass, for debugging and visualization.
#[derive(Debug, Clone)]
pub struct GridSnapshot {
    pub pass: String,
    pub width: usize,
    pub height: usize,
    pub cells: Vec<u8>,
}

/// Per-run trace: pass spans, free-form notes and optional snapshots.
///
/// Collection is off by default; a disabled trace records nothing, so
/// observability toggles cannot affect generated output.
#[derive(Debug, Default)]
pub struct Trace {
    enabled: bool,
    snapshots_enabled: bool,
    pub spans: Vec<PassSpan>,
    pub snapshots: Vec<GridSnapshot>,
    open: Option<(String, Vec<String>)>,
}

impl Trace {
    #[must_use]
    pub fn new(enabled: bool, snapshots_enabled: bool) -> Self {
        Self {
            enabled,
            snapshots_enabled,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn begin_span(&mut self, pass: &str) {
        if self.enabled {
            self.open = Some((pass.to_string(), Vec::new()));
        }
    }

    pub fn end_span(&mut self, duration: Duration) {
        if let Some((pass, notes)) = self.open.take() {
            self.spans.push(PassSpan {
                pass,
                duration,
                notes,
            });
        }
    }

    /// Attach a note to the open span (dropped when tracing is off).
    pub fn note(&mut self, message: impl Into<String>) {
        if let Some((_, notes)) = self.open.as_mut() {
            notes.push(message.into());
        }
    }

    pub fn snapshot(&mut self, pass: &str, grid: &Grid) {
        if self.enabled && self.snapshots_enabled {
            self.snapshots.push(GridSnapshot {
                pass: pass.to_string(),
                width: grid.width(),
                height: grid.height(),
                cells: grid.to_bytes(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_trace_records_nothing() {
        let mut trace = Trace::disabled();
        trace.begin_span("init");
        trace.note("ignored");
        trace.end_span(Duration::from_millis(1));
        trace.snapshot("init", &Grid::new(4, 4));
        assert!(trace.spans.is_empty());
        assert!(trace.snapshots.is_empty());
    }

    #[test]
    fn spans_capture_notes() {
        let mut trace = Trace::new(true, true);
        trace.begin_span("carve");
        trace.note("carved 3 corridors");
        trace.end_span(Duration::from_millis(2));
        trace.snapshot("carve", &Grid::new(2, 2));
        assert_eq!(trace.spans.len(), 1);
        assert_eq!(trace.spans[0].pass, "carve");
        assert_eq!(trace.spans[0].notes, vec!["carved 3 corridors"]);
        assert_eq!(trace.snapshots.len(), 1);
    }
}
