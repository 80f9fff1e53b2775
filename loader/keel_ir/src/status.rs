//! Module lifecycle states.

use std::fmt;

/// Where a module is in its lifecycle.
///
/// Ordered: every comparison in the loader (`status < Status::Ready`,
/// `status >= Status::Fetched`) relies on the derive order matching the
/// numeric codes below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Status {
    /// No registration and no request yet.
    #[default]
    Unknown = 0,
    /// The resource is being retrieved.
    Fetching = 1,
    /// The retrieval finished (successfully or not).
    Fetched = 2,
    /// Dependencies and factory are known.
    Saved = 3,
    /// Every non-circular dependency is ready; the module can compile.
    Ready = 4,
    /// The factory is executing.
    Compiling = 5,
    /// The factory ran; the exported interface is final (modulo patches).
    Compiled = 6,
}

impl Status {
    /// Numeric code (0 for unknown, 1..=6 for the lifecycle states).
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Status::Unknown => "UNKNOWN",
            Status::Fetching => "FETCHING",
            Status::Fetched => "FETCHED",
            Status::Saved => "SAVED",
            Status::Ready => "READY",
            Status::Compiling => "COMPILING",
            Status::Compiled => "COMPILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
