//! Module records, factories and registration payloads.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use keel_ir::{Locator, Status, Value};

use crate::Require;

/// Executable factory body.
///
/// Called with the dependency accessor, the module's current interface
/// object, and the module itself. A `Some` return replaces the interface
/// wholesale; `None` keeps whatever the body put into the interface object.
pub type FactoryFn = Rc<dyn Fn(&Require, &Value, &ModuleRef) -> Option<Value>>;

/// What defines a module's interface.
#[derive(Clone)]
pub enum Factory {
    /// Run once at compile time.
    ///
    /// `source` is the body's text, when the host has it. It is only used to
    /// derive dependencies when a registration does not list them.
    Function {
        body: FactoryFn,
        source: Option<Rc<str>>,
    },
    /// The interface itself (an object, a string template, ...).
    Value(Value),
}

impl Factory {
    pub fn function(body: impl Fn(&Require, &Value, &ModuleRef) -> Option<Value> + 'static) -> Self {
        Factory::Function {
            body: Rc::new(body),
            source: None,
        }
    }

    /// A function factory whose body text is known.
    pub fn with_source(
        source: impl Into<Rc<str>>,
        body: impl Fn(&Require, &Value, &ModuleRef) -> Option<Value> + 'static,
    ) -> Self {
        Factory::Function {
            body: Rc::new(body),
            source: Some(source.into()),
        }
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Factory::Value(value.into())
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            Factory::Function { source, .. } => source.as_deref(),
            Factory::Value(_) => None,
        }
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, Factory::Function { .. })
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factory::Function { source, .. } => f
                .debug_struct("Function")
                .field("source", source)
                .finish_non_exhaustive(),
            Factory::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// A module registration.
///
/// One variant per accepted shape, so the caller states which parts it is
/// supplying instead of the loader guessing from argument positions.
#[derive(Clone, Debug)]
pub enum Define {
    /// Factory only. Locator comes from the host or from fetch completion.
    Factory(Factory),
    /// Explicit identifier.
    Named { id: String, factory: Factory },
    /// Explicit dependency list.
    WithDeps { deps: Vec<String>, factory: Factory },
    /// Identifier and dependency list.
    Full {
        id: String,
        deps: Vec<String>,
        factory: Factory,
    },
}

impl Define {
    pub fn anonymous(factory: Factory) -> Self {
        Define::Factory(factory)
    }

    pub fn named(id: impl Into<String>, factory: Factory) -> Self {
        Define::Named {
            id: id.into(),
            factory,
        }
    }

    pub fn with_deps<I, S>(deps: I, factory: Factory) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Define::WithDeps {
            deps: deps.into_iter().map(Into::into).collect(),
            factory,
        }
    }

    pub fn full<I, S>(id: impl Into<String>, deps: I, factory: Factory) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Define::Full {
            id: id.into(),
            deps: deps.into_iter().map(Into::into).collect(),
            factory,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Define::Named { id, .. } | Define::Full { id, .. } => Some(id),
            Define::Factory(_) | Define::WithDeps { .. } => None,
        }
    }

    pub fn factory(&self) -> &Factory {
        match self {
            Define::Factory(factory)
            | Define::Named { factory, .. }
            | Define::WithDeps { factory, .. }
            | Define::Full { factory, .. } => factory,
        }
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Option<Vec<String>>, Factory) {
        match self {
            Define::Factory(factory) => (None, None, factory),
            Define::Named { id, factory } => (Some(id), None, factory),
            Define::WithDeps { deps, factory } => (None, Some(deps), factory),
            Define::Full { id, deps, factory } => (Some(id), Some(deps), factory),
        }
    }
}

/// Registration data waiting to be saved under a locator.
#[derive(Clone, Debug)]
pub(crate) struct PendingDefinition {
    pub id: Option<String>,
    /// Unresolved dependency identifiers.
    pub deps: Vec<String>,
    pub factory: Factory,
}

/// The record behind a [`ModuleRef`].
struct Module {
    locator: Locator,
    declared_id: Option<String>,
    status: Status,
    dependencies: Vec<Locator>,
    factory: Option<Factory>,
    exports: Option<Value>,
    initiator: Weak<RefCell<Module>>,
    alias: Option<Locator>,
}

/// Shared handle to a module record.
///
/// Cloning shares the record. An aliased record is reachable from the
/// registry under two locators but is still one `ModuleRef`. Every accessor
/// borrows the record only for the duration of the call, so factories may
/// hold and use handles while the loader works on the same record.
#[derive(Clone)]
pub struct ModuleRef(Rc<RefCell<Module>>);

impl ModuleRef {
    pub(crate) fn new(locator: Locator, status: Status) -> Self {
        ModuleRef(Rc::new(RefCell::new(Module {
            locator,
            declared_id: None,
            status,
            dependencies: Vec::new(),
            factory: None,
            exports: None,
            initiator: Weak::new(),
            alias: None,
        })))
    }

    pub fn locator(&self) -> Locator {
        self.0.borrow().locator.clone()
    }

    /// Declared identifier, or the locator for anonymous modules.
    pub fn id(&self) -> String {
        let module = self.0.borrow();
        match &module.declared_id {
            Some(id) => id.clone(),
            None => module.locator.as_str().to_owned(),
        }
    }

    pub fn status(&self) -> Status {
        self.0.borrow().status
    }

    pub(crate) fn set_status(&self, status: Status) {
        let mut module = self.0.borrow_mut();
        tracing::trace!(locator = %module.locator, from = %module.status, to = %status, "status");
        module.status = status;
    }

    /// Resolved dependency locators (empty before SAVED).
    pub fn dependencies(&self) -> Vec<Locator> {
        self.0.borrow().dependencies.clone()
    }

    pub fn factory(&self) -> Option<Factory> {
        self.0.borrow().factory.clone()
    }

    /// Current exported interface; `None` until compilation starts.
    pub fn exports(&self) -> Option<Value> {
        self.0.borrow().exports.clone()
    }

    /// Replace the exported interface.
    pub fn set_exports(&self, exports: Value) {
        self.0.borrow_mut().exports = Some(exports);
    }

    /// The module whose compilation first asked for this one.
    pub fn initiator(&self) -> Option<ModuleRef> {
        self.0.borrow().initiator.upgrade().map(ModuleRef)
    }

    pub(crate) fn set_initiator(&self, initiator: &ModuleRef) {
        self.0.borrow_mut().initiator = Rc::downgrade(&initiator.0);
    }

    /// Secondary locator this record is also registered under.
    pub fn alias(&self) -> Option<Locator> {
        self.0.borrow().alias.clone()
    }

    pub(crate) fn set_alias(&self, alias: Locator) {
        self.0.borrow_mut().alias = Some(alias);
    }

    /// Store dependencies and factory, moving to SAVED.
    ///
    /// Returns `false` without touching the record if it was already SAVED;
    /// the first registration wins.
    pub(crate) fn save(
        &self,
        declared_id: Option<String>,
        dependencies: Vec<Locator>,
        factory: Factory,
    ) -> bool {
        let mut module = self.0.borrow_mut();
        if module.status >= Status::Saved {
            return false;
        }
        module.declared_id = declared_id;
        module.dependencies = dependencies;
        module.factory = Some(factory);
        module.status = Status::Saved;
        true
    }

    /// Enter COMPILING with a fresh interface object.
    pub(crate) fn begin_compile(&self, exports: Value) {
        let mut module = self.0.borrow_mut();
        module.status = Status::Compiling;
        module.exports = Some(exports);
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ModuleRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = self.0.borrow();
        f.debug_struct("Module")
            .field("locator", &module.locator)
            .field("status", &module.status)
            .field("dependencies", &module.dependencies)
            .field("alias", &module.alias)
            .finish_non_exhaustive()
    }
}
