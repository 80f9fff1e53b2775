//! The locator → module record map.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use keel_ir::{Locator, Status};

use crate::ModuleRef;

/// Live handle to the loader's module registry.
///
/// Cloning shares the map; every handle (including the one a factory gets
/// from `Require::cache`) sees the same entries. Iteration follows insertion
/// order. Deleting an entry makes the next reference to that locator fetch
/// and register it again.
#[derive(Clone, Default)]
pub struct Registry(Rc<RefCell<IndexMap<Locator, ModuleRef>>>);

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn get(&self, locator: &str) -> Option<ModuleRef> {
        self.0.borrow().get(locator).cloned()
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.0.borrow().contains_key(locator)
    }

    /// Existing record for `locator`, or a new one in `status`.
    pub(crate) fn get_or_insert(&self, locator: &Locator, status: Status) -> ModuleRef {
        self.0
            .borrow_mut()
            .entry(locator.clone())
            .or_insert_with(|| ModuleRef::new(locator.clone(), status))
            .clone()
    }

    /// Point `locator` at `module`, keeping the entry's position if it exists.
    pub(crate) fn insert(&self, locator: Locator, module: ModuleRef) -> Option<ModuleRef> {
        self.0.borrow_mut().insert(locator, module)
    }

    /// Forget the record registered under `locator`.
    pub fn remove(&self, locator: &str) -> Option<ModuleRef> {
        self.0.borrow_mut().shift_remove(locator)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn locators(&self) -> Vec<Locator> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of all entries in iteration order.
    pub fn entries(&self) -> Vec<(Locator, ModuleRef)> {
        self.0
            .borrow()
            .iter()
            .map(|(locator, module)| (locator.clone(), module.clone()))
            .collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests;
