//! The registration entry point.

use keel_diagnostic::LoaderError;
use keel_ir::{Locator, Status};

use super::Loader;
use crate::module::PendingDefinition;
use crate::{scan_dependencies, Define, ModuleRef};

impl Loader {
    /// Register a module.
    ///
    /// With an identifier the module is saved right away under the resolved
    /// locator. Without one it waits in the anonymous slot until the current
    /// retrieval completes and names it. Registering a locator that is
    /// already SAVED does nothing.
    ///
    /// A named registration made while any fetch is in flight counts as
    /// part of the resource being retrieved: if that resource registers
    /// nothing under its own locator, the locator is re-pointed to the
    /// first such module. Hosts defining inline modules should do so while
    /// no fetch is outstanding, or use [`Loader::define_derived`].
    pub fn define(&self, define: Define) -> &Self {
        self.register(define, None);
        self
    }

    /// Register a module whose locator the host derived itself (for
    /// example, from the resource currently being evaluated).
    ///
    /// `derived = None` for an anonymous registration means derivation
    /// failed; that is reported, and the registration falls back to the
    /// anonymous slot.
    pub fn define_derived(&self, define: Define, derived: Option<Locator>) -> &Self {
        if derived.is_none() && define.id().is_none() {
            self.0.sink.report_error(&LoaderError::DerivationFailed {
                source_text: define.factory().source().map(str::to_owned),
            });
        }
        self.register(define, derived.as_ref());
        self
    }

    fn register(&self, define: Define, derived: Option<&Locator>) {
        let (id, deps, factory) = define.into_parts();
        let deps = match deps {
            Some(deps) => deps,
            None => factory.source().map(scan_dependencies).unwrap_or_default(),
        };
        let resolved = id
            .as_deref()
            .and_then(|id| self.resolve(id, None))
            .or_else(|| derived.cloned());
        let definition = PendingDefinition { id, deps, factory };

        let Some(resolved) = resolved else {
            self.park_anonymous(definition);
            return;
        };

        let registry = &self.0.registry;
        if derived == Some(&resolved) {
            // An earlier module of the same resource took this entry over.
            let stale = registry
                .get(resolved.as_str())
                .is_some_and(|m| m.alias().is_some() && m.status() == Status::Saved);
            if stale {
                registry.insert(resolved.clone(), ModuleRef::new(resolved.clone(), Status::Unknown));
            }
        }

        let module = self.save(&resolved, definition);

        match derived {
            Some(derived) => {
                let placeholder = registry
                    .get(derived.as_str())
                    .is_some_and(|m| m.status() == Status::Fetching && !m.ptr_eq(&module));
                if placeholder {
                    registry.insert(derived.clone(), module.clone());
                    module.set_alias(derived.clone());
                }
            }
            None => {
                let fetching = !self.0.ledger.borrow().in_flight.is_empty();
                let mut first = self.0.first_in_package.borrow_mut();
                if fetching && first.is_none() {
                    *first = Some(module);
                }
            }
        }
    }

    /// Save `definition` under `locator`, resolving its dependencies
    /// relative to it. The first registration for a locator wins.
    pub(super) fn save(&self, locator: &Locator, definition: PendingDefinition) -> ModuleRef {
        let module = self.0.registry.get_or_insert(locator, Status::Unknown);
        if module.status() >= Status::Saved {
            tracing::trace!(%locator, "already saved; registration ignored");
            return module;
        }

        let dependencies = definition
            .deps
            .iter()
            .map(|dep| dep.trim())
            .filter(|dep| !dep.is_empty())
            .filter_map(|dep| self.resolve(dep, Some(locator)))
            .collect();
        module.save(definition.id, dependencies, definition.factory);
        module
    }

    fn park_anonymous(&self, definition: PendingDefinition) {
        let previous = self.0.anonymous.borrow_mut().replace(definition);
        if previous.is_some() {
            self.0.sink.report_error(&LoaderError::DuplicateAnonymous);
        }
    }
}
