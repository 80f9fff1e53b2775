//! Interface patches.

use std::rc::Rc;

use keel_diagnostic::LoaderError;
use keel_ir::{Locator, Status, Value};

use super::compile::Require;
use super::Loader;
use crate::{FactoryFn, ModuleRef};

/// Run a factory or patch against `module`'s current interface.
///
/// A `Some` return replaces the interface.
pub(super) fn run_in_module(body: &FactoryFn, require: &Require, module: &ModuleRef) {
    let exports = module.exports().unwrap_or_else(Value::object);
    if let Some(replacement) = body(require, &exports, module) {
        module.set_exports(replacement);
    }
}

/// Queue keys a module's patches may be stored under: its alias, then its
/// own locator.
fn patch_keys(module: &ModuleRef) -> impl Iterator<Item = Locator> {
    module.alias().into_iter().chain(std::iter::once(module.locator()))
}

impl Loader {
    /// Patch the interface of module `id` (resolved from the root).
    ///
    /// Runs immediately if the module is compiled. Otherwise the patch waits
    /// and runs right after the module's factory, in the order patches were
    /// added. The patch gets the same arguments a factory does.
    pub fn modify(
        &self,
        id: &str,
        patch: impl Fn(&Require, &Value, &ModuleRef) -> Option<Value> + 'static,
    ) -> &Self {
        let Some(locator) = self.resolve(id, None) else {
            self.0.sink.report_error(&LoaderError::Unresolvable { id: id.to_owned() });
            return self;
        };
        let patch: FactoryFn = Rc::new(patch);

        match self.0.registry.get(locator.as_str()) {
            Some(module) if module.status() == Status::Compiled => {
                let require = Require::new(self.clone(), module.clone());
                run_in_module(&patch, &require, &module);
            }
            _ => {
                tracing::trace!(%locator, "patch queued");
                self.0.patches.borrow_mut().entry(locator).or_default().push(patch);
            }
        }
        self
    }

    pub(super) fn has_patches(&self, module: &ModuleRef) -> bool {
        let patches = self.0.patches.borrow();
        patch_keys(module).any(|key| patches.contains_key(&key))
    }

    /// Run and discard the patches queued for `module`.
    pub(super) fn apply_patches(&self, module: &ModuleRef, require: &Require) {
        for key in patch_keys(module) {
            let queued = self.0.patches.borrow_mut().remove(&key);
            for patch in queued.into_iter().flatten() {
                run_in_module(&patch, require, module);
            }
        }
    }
}
