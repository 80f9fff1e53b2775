//! Exported interface values.
//!
//! A module exports a [`Value`]. Compilation always starts from an empty
//! [`Interface`] object, which the factory fills in place; mutually dependent
//! modules hold clones of the same `Interface` handle, so a dependent that
//! grabbed a partially built interface sees later insertions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// Depth after which `Debug` and `PartialEq` stop descending into nested
/// interfaces. Interfaces of mutually dependent modules usually reference
/// each other, so unbounded descent would not terminate.
const MAX_DEPTH: usize = 8;

/// A value a module can export, or that a factory can store in its interface.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<[Value]>),
    Object(Interface),
}

impl Value {
    /// A fresh, empty interface object.
    pub fn object() -> Self {
        Value::Object(Interface::new())
    }

    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&Interface> {
        match self {
            Value::Object(interface) => Some(interface),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read a member of an object value. `None` for non-objects.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|interface| interface.get(key))
    }

    /// Set a member of an object value in place.
    ///
    /// Returns `false` (and does nothing) if `self` is not an object.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self {
            Value::Object(interface) => {
                interface.insert(key, value);
                true
            }
            _ => false,
        }
    }

    /// Identity comparison: the same heap allocation for strings, lists and
    /// objects; plain equality for scalars.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => self == other,
        }
    }

    fn eq_at(&self, other: &Value, depth: usize) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.eq_at(y, depth + 1))
            }
            (Value::Object(a), Value::Object(b)) => a.eq_at(b, depth),
            _ => false,
        }
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n:?}"),
            Value::Str(s) => write!(f, "{:?}", &**s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_at(f, depth + 1)?;
                }
                f.write_str("]")
            }
            Value::Object(interface) => interface.fmt_at(f, depth),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_at(other, 0)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, 0)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<Interface> for Value {
    fn from(interface: Interface) -> Self {
        Value::Object(interface)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items.into())
    }
}

/// A mutable, shared interface object (string keys, insertion order).
///
/// Cloning shares the underlying map. Borrows are held only for the duration
/// of a single method call, so a factory may freely read one interface while
/// inserting into another.
#[derive(Clone, Default)]
pub struct Interface(Rc<RefCell<IndexMap<String, Value>>>);

impl Interface {
    pub fn new() -> Self {
        Interface::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Remove a member, keeping the order of the rest.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Member names, in the order they were first inserted.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Interface) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn eq_at(&self, other: &Interface, depth: usize) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if depth >= MAX_DEPTH {
            return false;
        }
        let a = self.0.borrow();
        let b = other.0.borrow();
        // Member order does not take part in equality.
        a.len() == b.len()
            && a.iter()
                .all(|(key, va)| b.get(key).is_some_and(|vb| va.eq_at(vb, depth + 1)))
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if depth >= MAX_DEPTH {
            return f.write_str("{..}");
        }
        let map = self.0.borrow();
        f.write_str("{")?;
        for (i, (key, value)) in map.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: ")?;
            value.fmt_at(f, depth + 1)?;
        }
        f.write_str("}")
    }
}

impl PartialEq for Interface {
    fn eq(&self, other: &Self) -> bool {
        self.eq_at(other, 0)
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, 0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Interface {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Interface(Rc::new(RefCell::new(map)))
    }
}
