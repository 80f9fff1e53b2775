//! Canonical module keys.

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

/// Canonical absolute identifier of a module; the registry key.
///
/// Cheap to clone (`Rc<str>`). Loader state is single-threaded, so the
/// non-atomic count is enough.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator(Rc<str>);

impl Locator {
    pub fn new(locator: impl Into<Rc<str>>) -> Self {
        Locator(locator.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The "directory" part of the locator, up to and including the last `/`.
    ///
    /// `page:/lib/util` has directory `page:/lib/`. A locator without any
    /// `/` has an empty directory.
    pub fn dir(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..=idx],
            None => "",
        }
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({:?})", &*self.0)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Locator {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Locator {
    fn from(locator: &str) -> Self {
        Locator::new(locator)
    }
}

impl From<String> for Locator {
    fn from(locator: String) -> Self {
        Locator::new(locator)
    }
}

/// Identifier of the retrievable resource a locator maps to after path
/// mapping. Several locators may share one physical id; fetches are
/// deduplicated on it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PhysicalId(Rc<str>);

impl PhysicalId {
    pub fn new(id: impl Into<Rc<str>>) -> Self {
        PhysicalId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalId({:?})", &*self.0)
    }
}

impl fmt::Display for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PhysicalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&Locator> for PhysicalId {
    fn from(locator: &Locator) -> Self {
        PhysicalId(Rc::clone(&locator.0))
    }
}

impl From<&str> for PhysicalId {
    fn from(id: &str) -> Self {
        PhysicalId::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_keeps_trailing_slash() {
        assert_eq!(Locator::from("page:/lib/util").dir(), "page:/lib/");
        assert_eq!(Locator::from("page:/").dir(), "page:/");
        assert_eq!(Locator::from("bare").dir(), "");
    }

    #[test]
    fn physical_id_from_locator_shares_text() {
        let locator = Locator::from("page:/a");
        assert_eq!(PhysicalId::from(&locator).as_str(), "page:/a");
    }
}
