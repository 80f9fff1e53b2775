//! Dependency-closure loading and single-flight fetching.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use keel_ir::{Locator, PhysicalId, Status};

use super::cycle::pure_dependencies;
use super::Loader;
use crate::fetch::{Continuation, FetchCompletion, FetchRequest, Waiter};
use crate::ModuleRef;

/// Fan-in point of one `load` call.
///
/// Each pending locator arrives exactly once; the continuation runs when the
/// last one does.
struct Barrier {
    remaining: Cell<usize>,
    on_done: RefCell<Option<Continuation>>,
}

impl Barrier {
    fn new(count: usize, on_done: Continuation) -> Rc<Self> {
        Rc::new(Barrier {
            remaining: Cell::new(count),
            on_done: RefCell::new(Some(on_done)),
        })
    }

    /// Record one resolved entry, marking its module READY if it loaded.
    fn arrive(&self, module: Option<&ModuleRef>) {
        if let Some(module) = module {
            if module.status() < Status::Ready {
                module.set_status(Status::Ready);
            }
        }

        let remaining = self.remaining.get().saturating_sub(1);
        self.remaining.set(remaining);
        if remaining == 0 {
            let on_done = self.on_done.borrow_mut().take();
            if let Some(on_done) = on_done {
                on_done();
            }
        }
    }
}

impl Loader {
    /// Load the dependency closure of `locators`, then run `on_done` once.
    ///
    /// Locators already READY or later are skipped. Entries that never reach
    /// SAVED (missing or malformed resources) still count as resolved.
    #[tracing::instrument(level = "debug", skip_all, fields(count = locators.len()))]
    pub fn load(&self, locators: Vec<Locator>, on_done: impl FnOnce() + 'static) {
        let registry = &self.0.registry;
        let pending: Vec<Locator> = locators
            .into_iter()
            .filter(|locator| {
                registry
                    .get(locator.as_str())
                    .is_none_or(|module| module.status() < Status::Ready)
            })
            .collect();

        if pending.is_empty() {
            on_done();
            return;
        }

        let barrier = Barrier::new(pending.len(), Box::new(on_done));
        for locator in pending {
            let module = registry.get_or_insert(&locator, Status::Fetching);
            let then: Continuation = {
                let loader = self.clone();
                let barrier = Rc::clone(&barrier);
                let locator = locator.clone();
                Box::new(move || loader.on_fetched(&locator, &barrier))
            };
            if module.status() >= Status::Fetched {
                then();
            } else {
                self.fetch(&locator, then);
            }
        }
    }

    fn on_fetched(&self, locator: &Locator, barrier: &Rc<Barrier>) {
        // Re-read: the entry may have been re-pointed while fetching.
        let Some(module) = self.0.registry.get(locator.as_str()) else {
            barrier.arrive(None);
            return;
        };
        if module.status() < Status::Saved {
            barrier.arrive(None);
            return;
        }

        let deps = pure_dependencies(&self.0.registry, &module, &self.0.sink);
        if deps.is_empty() {
            barrier.arrive(Some(&module));
        } else {
            let barrier = Rc::clone(barrier);
            keel_stack::ensure_sufficient_stack(|| {
                self.load(deps, move || barrier.arrive(Some(&module)));
            });
        }
    }

    /// Fetch the resource behind `locator`, at most once per physical id.
    pub(super) fn fetch(&self, locator: &Locator, then: Continuation) {
        let physical_id = self.0.resolver.physical_id(locator);

        if let Some(known) = self.already_fetched(&physical_id, locator) {
            self.alias_unsaved(locator, &known);
            then();
            return;
        }

        {
            let mut ledger = self.0.ledger.borrow_mut();
            let waiter = Waiter {
                locator: locator.clone(),
                then,
            };
            if let Some(waiters) = ledger.in_flight.get_mut(&physical_id) {
                tracing::trace!(%locator, physical_id = %physical_id, "joining in-flight fetch");
                waiters.push(waiter);
                return;
            }
            ledger.in_flight.insert(physical_id.clone(), vec![waiter]);
        }

        tracing::debug!(%locator, physical_id = %physical_id, "fetch");
        let request = FetchRequest {
            physical_id: physical_id.clone(),
            charset: self.0.config.charset.clone(),
        };
        let done = FetchCompletion::new(Rc::downgrade(&self.0), physical_id, locator.clone());
        let fetcher = Rc::clone(&self.0.fetcher);
        fetcher.retrieve(request, done);
    }

    /// The record a finished retrieval of `physical_id` produced, if it is
    /// still usable for `locator`.
    ///
    /// A completed mark whose record was removed from the registry (or
    /// recreated as a placeholder) is stale and gets dropped, so the next
    /// fetch goes to the fetcher again.
    fn already_fetched(&self, physical_id: &PhysicalId, locator: &Locator) -> Option<ModuleRef> {
        let first = self.0.ledger.borrow().completed.get(physical_id).cloned()?;
        let requesting = self.0.registry.get(locator.as_str());
        let known = self
            .0
            .registry
            .get(first.as_str())
            .filter(|known| known.status() >= Status::Fetched)
            .filter(|known| !requesting.as_ref().is_some_and(|r| r.ptr_eq(known)));

        if known.is_none() {
            self.0.ledger.borrow_mut().completed.remove(physical_id);
        }
        known
    }

    /// Retrieval of `physical_id`, requested for `locator`, finished.
    pub(crate) fn finish_fetch(&self, physical_id: &PhysicalId, locator: &Locator) {
        tracing::debug!(%locator, physical_id = %physical_id, "fetched");
        let waiters = {
            let mut ledger = self.0.ledger.borrow_mut();
            ledger.completed.insert(physical_id.clone(), locator.clone());
            ledger.in_flight.remove(physical_id).unwrap_or_default()
        };

        let module = self.0.registry.get_or_insert(locator, Status::Fetching);
        if module.status() == Status::Fetching {
            module.set_status(Status::Fetched);
        }

        let anonymous = self.0.anonymous.borrow_mut().take();
        if let Some(definition) = anonymous {
            self.save(locator, definition);
        }

        // The resource defined a named module but nothing under the
        // requested locator: the requested locator now means that module.
        let first = self.0.first_in_package.borrow_mut().take();
        if let Some(first) = first {
            if module.status() == Status::Fetched && !first.ptr_eq(&module) {
                self.0.registry.insert(locator.clone(), first.clone());
                first.set_alias(locator.clone());
            }
        }

        if let Some(target) = self.0.registry.get(locator.as_str()) {
            for waiter in waiters.iter().filter(|waiter| waiter.locator != *locator) {
                self.settle_joined(&waiter.locator, &target);
            }
        }

        for waiter in waiters {
            (waiter.then)();
        }
    }

    /// A locator that joined someone else's retrieval shares its result.
    fn settle_joined(&self, locator: &Locator, target: &ModuleRef) {
        if target.status() >= Status::Saved {
            self.alias_unsaved(locator, target);
            return;
        }
        if let Some(module) = self.0.registry.get(locator.as_str()) {
            if module.status() == Status::Fetching {
                module.set_status(Status::Fetched);
            }
        }
    }

    /// Point `locator` at `target` unless it already holds a saved record.
    fn alias_unsaved(&self, locator: &Locator, target: &ModuleRef) {
        let current = self.0.registry.get(locator.as_str());
        let replace = current
            .as_ref()
            .is_none_or(|module| !module.ptr_eq(target) && module.status() < Status::Saved);
        if !replace {
            return;
        }

        tracing::trace!(%locator, target = %target.locator(), "alias");
        self.0.registry.insert(locator.clone(), target.clone());
        if target.alias().is_none() && target.locator() != *locator {
            target.set_alias(locator.clone());
        }
    }
}
