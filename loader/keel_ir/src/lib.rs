//! Keel IR - plain data shared by every loader crate.
//!
//! Nothing in here performs loading. The types describe:
//! - `Locator` / `PhysicalId`: canonical module keys and the retrievable
//!   resources they map to
//! - `Status`: the module lifecycle (`FETCHING` through `COMPILED`)
//! - `Value` / `Interface`: what a module exports to its dependents
//! - `Selector`: registry lookups by substring or regular expression

mod locator;
mod selector;
mod status;
mod value;

pub use locator::{Locator, PhysicalId};
pub use selector::Selector;
pub use status::Status;
pub use value::{Interface, Value};
