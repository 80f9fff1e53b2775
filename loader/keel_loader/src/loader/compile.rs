//! Lazy compilation and the dependency accessor handed to factories.

use std::cell::RefCell;
use std::fmt;

use keel_ir::{Locator, Status, Value};

use super::patch::run_in_module;
use super::Loader;
use crate::{Factory, ModuleRef, Registry};

/// Dependency accessor bound to one module.
///
/// Identifiers are resolved relative to the bound module's locator.
#[derive(Clone)]
pub struct Require {
    loader: Loader,
    module: ModuleRef,
}

impl Require {
    pub(crate) fn new(loader: Loader, module: ModuleRef) -> Self {
        Require { loader, module }
    }

    /// Interface of the dependency `id`, compiling it if needed.
    ///
    /// `None` when `id` does not resolve to a registered module or the
    /// module never loaded. A dependency that is itself compiling (a cycle)
    /// yields its interface as built so far.
    pub fn get(&self, id: &str) -> Option<Value> {
        let locator = self.resolve(id)?;
        let child = self.loader.0.registry.get(locator.as_str())?;
        match child.status() {
            Status::Compiling | Status::Compiled => child.exports(),
            _ => {
                child.set_initiator(&self.module);
                self.loader.compile(&child)
            }
        }
    }

    /// Load and compile `ids` (relative to this module), then call
    /// `callback` with their interfaces in order.
    pub fn load_async<I, S>(&self, ids: I, callback: impl FnOnce(Vec<Option<Value>>) + 'static)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        self.loader.use_from(Some(&self.module.locator()), &ids, callback);
    }

    /// Locator `id` refers to from this module. Loads nothing.
    pub fn resolve(&self, id: &str) -> Option<Locator> {
        self.loader.resolve(id, Some(&self.module.locator()))
    }

    /// Live registry handle.
    pub fn cache(&self) -> Registry {
        self.loader.cache()
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }
}

impl fmt::Debug for Require {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Require")
            .field("module", &self.module.locator())
            .finish_non_exhaustive()
    }
}

/// Compile stack entry, popped on drop.
struct CompileFrame<'a> {
    stack: &'a RefCell<Vec<ModuleRef>>,
}

impl<'a> CompileFrame<'a> {
    fn enter(stack: &'a RefCell<Vec<ModuleRef>>, module: &ModuleRef) -> Self {
        stack.borrow_mut().push(module.clone());
        CompileFrame { stack }
    }
}

impl Drop for CompileFrame<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

impl Loader {
    /// Compile `module` and return its interface.
    ///
    /// The factory runs at most once per record. Compiled modules return the
    /// memoized interface; a module already compiling returns its current
    /// (partial) interface. Modules that never reached SAVED compile to
    /// `None`, unless patches are queued for them.
    #[tracing::instrument(level = "debug", skip_all, fields(locator = %module.locator()))]
    pub fn compile(&self, module: &ModuleRef) -> Option<Value> {
        match module.status() {
            Status::Compiled | Status::Compiling => return module.exports(),
            status if status < Status::Saved && !self.has_patches(module) => return None,
            _ => {}
        }

        module.begin_compile(Value::object());
        let require = Require::new(self.clone(), module.clone());

        match module.factory() {
            Some(Factory::Function { body, .. }) => {
                let _frame = CompileFrame::enter(&self.0.compile_stack, module);
                keel_stack::ensure_sufficient_stack(|| run_in_module(&body, &require, module));
            }
            Some(Factory::Value(value)) => module.set_exports(value),
            None => {}
        }

        module.set_status(Status::Compiled);
        self.apply_patches(module, &require);
        module.exports()
    }
}
