//! The loader context.
//!
//! One [`Loader`] owns everything that used to be process-wide: the module
//! registry, the fetch ledger, queued patches, the compile stack and the
//! pending anonymous registration. Hosts create one per page (or per test)
//! and pass clones around; there is no global instance and no reset.
//!
//! The operations live in submodules, one per concern:
//!
//! - `load` - fan-out/fan-in loading and single-flight fetching
//! - `cycle` - pruning of dependency edges that would wait on themselves
//! - `compile` - lazy, memoized compilation and the [`Require`] accessor
//! - `define` - the registration entry point
//! - `patch` - interface patches
//! - `facade` - `use_modules` and preloading

mod compile;
mod cycle;
mod define;
mod facade;
mod load;
mod patch;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use keel_diagnostic::{tracing_sink, SharedSink};
use keel_ir::{Locator, Selector, Status, Value};
use rustc_hash::FxHashMap;

use crate::fetch::FetchLedger;
use crate::module::PendingDefinition;
use crate::{FactoryFn, Fetcher, LoaderConfig, ModuleRef, PathResolver, Registry, Resolve, StaticFetcher};

pub use compile::Require;
pub use cycle::pure_dependencies;

/// Shared state behind a [`Loader`] handle.
pub(crate) struct LoaderInner {
    pub(crate) config: LoaderConfig,
    pub(crate) resolver: Box<dyn Resolve>,
    pub(crate) fetcher: Rc<dyn Fetcher>,
    pub(crate) sink: SharedSink,
    pub(crate) registry: Registry,
    pub(crate) ledger: RefCell<FetchLedger>,
    /// Patches waiting for their module to compile, per locator.
    pub(crate) patches: RefCell<FxHashMap<Locator, Vec<FactoryFn>>>,
    pub(crate) compile_stack: RefCell<Vec<ModuleRef>>,
    /// The single anonymous registration waiting for a fetch to name it.
    pub(crate) anonymous: RefCell<Option<PendingDefinition>>,
    /// First named module registered during the current retrieval.
    pub(crate) first_in_package: RefCell<Option<ModuleRef>>,
    /// Identifiers still to preload; drained whenever preloading runs.
    pub(crate) preload: RefCell<Vec<String>>,
}

/// Handle to a module loader.
///
/// Cheap to clone; clones share all state. Single-threaded (`!Send`).
#[derive(Clone)]
pub struct Loader(pub(crate) Rc<LoaderInner>);

/// Builder for a [`Loader`] with custom collaborators.
///
/// Anything not supplied falls back to a [`PathResolver`] built from the
/// config, an empty [`StaticFetcher`] and the `tracing` diagnostics sink.
pub struct LoaderBuilder {
    config: LoaderConfig,
    resolver: Option<Box<dyn Resolve>>,
    fetcher: Option<Rc<dyn Fetcher>>,
    sink: Option<SharedSink>,
}

impl LoaderBuilder {
    pub fn new(config: LoaderConfig) -> Self {
        LoaderBuilder {
            config,
            resolver: None,
            fetcher: None,
            sink: None,
        }
    }

    #[must_use]
    pub fn resolver(mut self, resolver: impl Resolve + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    #[must_use]
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Rc::new(fetcher));
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Loader {
        let LoaderBuilder {
            config,
            resolver,
            fetcher,
            sink,
        } = self;
        let resolver: Box<dyn Resolve> = match resolver {
            Some(resolver) => resolver,
            None => Box::new(PathResolver::new(&config)),
        };
        let fetcher: Rc<dyn Fetcher> = match fetcher {
            Some(fetcher) => fetcher,
            None => Rc::new(StaticFetcher::new()),
        };
        let preload = config.preload.clone();

        Loader(Rc::new(LoaderInner {
            config,
            resolver,
            fetcher,
            sink: sink.unwrap_or_else(tracing_sink),
            registry: Registry::new(),
            ledger: RefCell::default(),
            patches: RefCell::default(),
            compile_stack: RefCell::default(),
            anonymous: RefCell::default(),
            first_in_package: RefCell::default(),
            preload: RefCell::new(preload),
        }))
    }
}

impl Loader {
    /// Loader with the default path resolver and the `tracing` sink.
    pub fn new(config: LoaderConfig, fetcher: impl Fetcher + 'static) -> Self {
        LoaderBuilder::new(config).fetcher(fetcher).build()
    }

    /// Loader with a custom locator service.
    pub fn with_resolver(
        config: LoaderConfig,
        resolver: impl Resolve + 'static,
        fetcher: impl Fetcher + 'static,
    ) -> Self {
        LoaderBuilder::new(config)
            .resolver(resolver)
            .fetcher(fetcher)
            .build()
    }

    pub fn builder(config: LoaderConfig) -> LoaderBuilder {
        LoaderBuilder::new(config)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.0.config
    }

    pub fn sink(&self) -> &SharedSink {
        &self.0.sink
    }

    /// Locator of the page-level root module.
    pub fn root(&self) -> &Locator {
        &self.0.config.root
    }

    /// Resolve `id` against `referrer`, or against the root when `None`.
    pub fn resolve(&self, id: &str, referrer: Option<&Locator>) -> Option<Locator> {
        let referrer = referrer.unwrap_or(&self.0.config.root);
        self.0.resolver.resolve(id, Some(referrer))
    }

    /// Live handle to the registry.
    pub fn cache(&self) -> Registry {
        self.0.registry.clone()
    }

    /// The module whose factory is running right now, innermost first.
    pub fn compiling_module(&self) -> Option<ModuleRef> {
        self.0.compile_stack.borrow().last().cloned()
    }

    /// Interfaces of compiled modules whose locator matches `selector`, in
    /// registry order.
    ///
    /// A record registered under two locators is reported once per matching
    /// locator.
    pub fn find(&self, selector: impl Into<Selector>) -> Vec<Value> {
        let selector = selector.into();
        self.0
            .registry
            .entries()
            .into_iter()
            .filter(|(locator, module)| {
                selector.matches(locator.as_str()) && module.status() == Status::Compiled
            })
            .filter_map(|(_, module)| module.exports())
            .collect()
    }

    /// Queue an identifier to be loaded and compiled before the next batch of
    /// user modules.
    pub fn add_preload(&self, id: impl Into<String>) -> &Self {
        self.0.preload.borrow_mut().push(id.into());
        self
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("root", &self.0.config.root)
            .field("registry", &self.0.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
