//! Diagnostics sink for configurable reporting.
//!
//! Diagnostics can be directed to different destinations:
//! - `tracing` events (default)
//! - a buffer, for tests and hosts that render diagnostics themselves
//! - nowhere
//!
//! Uses enum dispatch, like the rest of the loader's pluggable handlers,
//! rather than trait objects.

use std::cell::RefCell;
use std::rc::Rc;

use crate::{Diagnostic, LoaderError, Severity};

/// Sink that captures diagnostics in memory.
#[derive(Default)]
pub struct BufferSink {
    entries: RefCell<Vec<Diagnostic>>,
}

impl BufferSink {
    pub fn new() -> Self {
        BufferSink::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.borrow_mut().push(diagnostic);
    }

    /// Snapshot of everything captured so far, in report order.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Where the loader's diagnostics go.
#[derive(Default)]
pub enum DiagnosticSink {
    /// Forward as `tracing` events.
    #[default]
    Tracing,
    /// Capture in a buffer.
    Buffer(BufferSink),
    /// Discard.
    Silent,
}

impl DiagnosticSink {
    /// Report a free-form message.
    pub fn report(&self, message: &str, detail: Option<&str>, severity: Severity) {
        self.emit(Diagnostic::new(severity, message, detail.map(str::to_owned)));
    }

    /// Report a loader condition.
    pub fn report_error(&self, err: &LoaderError) {
        self.emit(Diagnostic::from(err));
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        match self {
            DiagnosticSink::Tracing => forward_to_tracing(&diagnostic),
            DiagnosticSink::Buffer(buffer) => buffer.push(diagnostic),
            DiagnosticSink::Silent => {}
        }
    }

    /// Captured diagnostics; empty for sinks that don't capture.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            DiagnosticSink::Buffer(buffer) => buffer.entries(),
            DiagnosticSink::Tracing | DiagnosticSink::Silent => Vec::new(),
        }
    }

    pub fn clear(&self) {
        if let DiagnosticSink::Buffer(buffer) = self {
            buffer.clear();
        }
    }
}

fn forward_to_tracing(diagnostic: &Diagnostic) {
    let code = diagnostic.code;
    let detail = diagnostic.detail.as_deref().unwrap_or("");
    match diagnostic.severity {
        Severity::Error => tracing::error!(code, detail, "{}", diagnostic.message),
        Severity::Warning => tracing::warn!(code, detail, "{}", diagnostic.message),
        Severity::Note => tracing::info!(code, detail, "{}", diagnostic.message),
    }
}

/// Shared sink handle. The loader is single-threaded, so `Rc` suffices.
pub type SharedSink = Rc<DiagnosticSink>;

/// Create the default `tracing` sink.
pub fn tracing_sink() -> SharedSink {
    Rc::new(DiagnosticSink::Tracing)
}

/// Create a capturing sink.
pub fn buffer_sink() -> SharedSink {
    Rc::new(DiagnosticSink::Buffer(BufferSink::new()))
}
