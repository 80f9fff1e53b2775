//! Diagnostics for the module loader.
//!
//! Nothing in the loader core fails across a component boundary: an
//! unresolvable identifier becomes a `None` slot, a failed fetch leaves the
//! module below SAVED, a circular wait is pruned. What *is* worth telling
//! someone about goes to a [`DiagnosticSink`] as a [`Diagnostic`] built from a
//! [`LoaderError`].
//!
//! The sink is fire-and-forget: reporting never fails, never blocks and
//! never feeds back into loading.

mod diagnostic;
mod error;
mod sink;

pub use diagnostic::{Diagnostic, Severity};
pub use error::LoaderError;
pub use sink::{buffer_sink, tracing_sink, BufferSink, DiagnosticSink, SharedSink};
