use std::sync::{Arc, Mutex};

/// Which process stream a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Sink for command and process output lines.
///
/// Sinks registered on a composite command are forwarded to both children.
pub trait OutputSink: Send + Sync {
    fn line(&self, kind: StreamKind, line: &str);
}

/// Routes captured output into the tracing pipeline.
pub struct TracingSink {
    scope: String,
}

impl TracingSink {
    pub fn new<T: Into<String>>(scope: T) -> Arc<Self> {
        Arc::new(TracingSink { scope: scope.into() })
    }
}

impl OutputSink for TracingSink {
    fn line(&self, kind: StreamKind, line: &str) {
        match kind {
            StreamKind::Stdout => tracing::info!(scope = %self.scope, "{}", line),
            StreamKind::Stderr => tracing::warn!(scope = %self.scope, "{}", line),
        }
    }
}

/// Collects captured output in memory. Used by tests and for error reporting.
#[derive(Default)]
pub struct BufferSink {
    lines: Mutex<Vec<(StreamKind, String)>>,
}

impl BufferSink {
    pub fn new() -> Arc<Self> {
        Arc::new(BufferSink::default())
    }

    pub fn lines(&self) -> Vec<(StreamKind, String)> {
        self.lines.lock().expect("output buffer poisoned").clone()
    }

    /// All captured lines of one stream, joined with newlines.
    pub fn text(&self, kind: StreamKind) -> String {
        self.lines()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of captured lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines().iter().filter(|(_, line)| line.contains(needle)).count()
    }
}

impl OutputSink for BufferSink {
    fn line(&self, kind: StreamKind, line: &str) {
        self.lines
            .lock()
            .expect("output buffer poisoned")
            .push((kind, line.to_string()));
    }
}
