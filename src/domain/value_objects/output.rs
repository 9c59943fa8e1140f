//! Output sink for command and transfer output
//!
//! Sinks are called synchronously on the thread that drives the deploy, in the
//! order lines were produced. Any `Fn(OutputKind, &str)` closure is a sink.

/// Which stream a line of output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Standard output of a local process
    Out,
    /// Standard error of a local process
    Err,
    /// Combined output of a command run on the server
    Remote,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Out => "out",
            OutputKind::Err => "err",
            OutputKind::Remote => "remote",
        }
    }
}

pub trait OutputSink {
    fn emit(&self, kind: OutputKind, line: &str);
}

impl<F> OutputSink for F
where
    F: Fn(OutputKind, &str),
{
    fn emit(&self, kind: OutputKind, line: &str) {
        self(kind, line)
    }
}

/// Sink that drops everything
pub struct NoopOutput;

impl OutputSink for NoopOutput {
    fn emit(&self, _kind: OutputKind, _line: &str) {}
}
