//! Output sinks for external tools.
//!
//! npm and webpack print progress that must not reach the build's own
//! standard output. Each tool invocation receives a sink from the caller
//! instead of the orchestrator redirecting a process-wide stream.

use std::sync::Mutex;

/// Stream a line was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputStream {
    /// Child stdout.
    Stdout,
    /// Child stderr.
    Stderr,
}

/// Receives the output of external tools, one line at a time.
///
/// Implementations can be:
/// - [`NullSink`]: discard everything (default)
/// - [`LogSink`]: forward to the `log` facade at trace level
/// - [`CaptureSink`]: keep lines in memory
pub trait OutputSink: Send + Sync {
    /// Handle one line printed by `tool`.
    fn line(&self, tool: &str, stream: OutputStream, line: &str);
}

/// Discards all tool output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn line(&self, _tool: &str, _stream: OutputStream, _line: &str) {}
}

/// Forwards tool output to `log::trace!`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn line(&self, tool: &str, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => log::trace!("[{}] {}", tool, line),
            OutputStream::Stderr => log::trace!("[{} stderr] {}", tool, line),
        }
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<(String, OutputStream, String)>>,
}

impl CaptureSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines captured so far as `(tool, stream, line)`.
    pub fn lines(&self) -> Vec<(String, OutputStream, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl OutputSink for CaptureSink {
    fn line(&self, tool: &str, stream: OutputStream, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((tool.to_string(), stream, line.to_string()));
    }
}
