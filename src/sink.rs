//! Line-oriented run log.
//!
//! The clustering loop reports its progress (phase changes, one line per
//! iteration, evaluation tables) through a [`LogSink`]. Sinks are purely
//! observational: nothing a sink does can change a clustering result.
//!
//! Internal diagnostics (empty-cluster repair, skipped records) go to the
//! [`log`] facade instead, so they can be filtered with `RUST_LOG`.

use std::io::Write;

/// Append-only destination for run-log lines.
pub trait LogSink {
    /// Append one line (without a trailing newline).
    fn append_line(&mut self, line: &str);
}

/// Discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn append_line(&mut self, _line: &str) {}
}

/// Forwards every line to the `log` facade at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacadeSink;

impl LogSink for LogFacadeSink {
    fn append_line(&mut self, line: &str) {
        log::info!(target: "sphkmeans", "{line}");
    }
}

/// Writes each line, newline-terminated, to an [`std::io::Write`] target.
///
/// Write failures are reported once through `log::warn!` and otherwise
/// ignored; a broken log must not abort a clustering run.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    inner: W,
    failed: bool,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            failed: false,
        }
    }

    /// Recover the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> LogSink for WriterSink<W> {
    fn append_line(&mut self, line: &str) {
        if self.failed {
            return;
        }
        if let Err(e) = writeln!(self.inner, "{line}") {
            log::warn!("run log write failed, further lines dropped: {e}");
            self.failed = true;
        }
    }
}

/// Captures lines in memory.
impl LogSink for Vec<String> {
    fn append_line(&mut self, line: &str) {
        self.push(line.to_owned());
    }
}

impl<S: LogSink + ?Sized> LogSink for &mut S {
    fn append_line(&mut self, line: &str) {
        (**self).append_line(line);
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn append_line(&mut self, line: &str) {
        (**self).append_line(line);
    }
}
