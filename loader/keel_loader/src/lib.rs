//! Keel Loader - module registry, dependency loading and lazy compilation.
//!
//! Modules declare dependencies and a factory. The loader fetches each
//! module once, walks its dependency graph asynchronously, prunes edges that
//! would make the walk wait on itself, and compiles modules on demand,
//! memoizing the interface each one exports.
//!
//! # Architecture
//!
//! ```text
//! use_modules(ids)
//!     │  resolve ids (Resolve)
//!     ▼
//! load(locators) ──► fetch (single-flight per physical id) ──► Fetcher
//!     │                                                          │
//!     │                                    define(...) ◄─────────┘
//!     │  pure_dependencies (cycle pruning), recurse, mark READY
//!     ▼
//! compile(module) ──► factory(require, exports, module) ──► patches
//!     │
//!     ▼
//! callback(interfaces)
//! ```
//!
//! Module lifecycle: `FETCHING → FETCHED → SAVED → READY → COMPILING → COMPILED`.
//!
//! Everything is single-threaded and continuation based; the only points
//! where work is suspended are fetch completion and the fan-in barrier of
//! `load`. Compilation is synchronous.

mod config;
mod fetch;
mod loader;
mod module;
mod registry;
mod resolve;
mod scan;

pub use config::{LoaderConfig, MapRule};
pub use fetch::{DeferredFetcher, FetchCompletion, FetchRequest, Fetcher, StaticFetcher};
pub use loader::{pure_dependencies, Loader, LoaderBuilder, Require};
pub use module::{Define, Factory, FactoryFn, ModuleRef};
pub use registry::Registry;
pub use resolve::{PathResolver, Resolve};
pub use scan::scan_dependencies;

pub use keel_diagnostic::{
    buffer_sink, tracing_sink, Diagnostic, DiagnosticSink, LoaderError, Severity, SharedSink,
};
pub use keel_ir::{Interface, Locator, PhysicalId, Selector, Status, Value};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for loader debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=keel_loader=debug` or `RUST_LOG=keel_loader=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // Another subscriber may already be installed by the host.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
