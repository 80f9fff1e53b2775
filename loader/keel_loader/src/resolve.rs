//! Identifier resolution.
//!
//! Turns the identifiers modules use (`"./util"`, `"jquery"`, `"/app/main"`)
//! into canonical locators, and locators into the physical ids fetches are
//! deduplicated on.
//!
//! ## Identifier Forms
//!
//! - Relative: `./x`, `../x` - resolved against the referring module
//! - Root-relative: `/x` - resolved against the origin of the base
//! - Absolute: `scheme:...` - used as is
//! - Top-level: anything else - appended to the base
//!
//! Aliases are substituted before any of the above. Dot segments are
//! normalized away in every case.

use keel_ir::{Locator, PhysicalId};
use rustc_hash::FxHashMap;

use crate::{LoaderConfig, MapRule};

/// Locator service used by the loader.
///
/// Implementations must be pure: resolving never loads or compiles anything.
pub trait Resolve {
    /// Resolve one identifier. `None` means the identifier names nothing;
    /// the loader treats it as an always-null dependency.
    ///
    /// `referrer` is the locator of the module asking; `None` means the
    /// page-level root.
    fn resolve(&self, id: &str, referrer: Option<&Locator>) -> Option<Locator>;

    fn resolve_many(&self, ids: &[&str], referrer: Option<&Locator>) -> Vec<Option<Locator>> {
        ids.iter().map(|id| self.resolve(id, referrer)).collect()
    }

    /// The retrievable resource behind `locator`.
    fn physical_id(&self, locator: &Locator) -> PhysicalId {
        PhysicalId::from(locator)
    }
}

/// Path-style resolver driven by [`LoaderConfig`].
#[derive(Clone, Debug)]
pub struct PathResolver {
    root: Locator,
    base: String,
    alias: FxHashMap<String, String>,
    map: Vec<MapRule>,
}

impl PathResolver {
    pub fn new(config: &LoaderConfig) -> Self {
        PathResolver {
            root: config.root.clone(),
            base: config.base.clone(),
            alias: config.alias.clone(),
            map: config.map.clone(),
        }
    }
}

impl Resolve for PathResolver {
    fn resolve(&self, id: &str, referrer: Option<&Locator>) -> Option<Locator> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        let id = self.alias.get(id).map_or(id, String::as_str);
        let referrer = referrer.unwrap_or(&self.root);

        let joined = if scheme_len(id).is_some() {
            id.to_owned()
        } else if is_relative(id) {
            format!("{}{id}", referrer.dir())
        } else if id.starts_with('/') {
            format!("{}{id}", origin(&self.base))
        } else {
            format!("{}{id}", self.base)
        };

        Some(Locator::from(normalize(&joined)))
    }

    fn physical_id(&self, locator: &Locator) -> PhysicalId {
        let mapped = self
            .map
            .iter()
            .fold(locator.as_str().to_owned(), |id, rule| rule.apply(&id));
        PhysicalId::from(mapped.as_str())
    }
}

fn is_relative(id: &str) -> bool {
    id == "." || id == ".." || id.starts_with("./") || id.starts_with("../")
}

/// Length of `scheme:` at the start of `s`, if there is one.
fn scheme_len(s: &str) -> Option<usize> {
    let colon = s.find(':')?;
    let scheme = &s[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(colon + 1)
}

/// `scheme:` or `scheme://authority` prefix of `s`; empty without a scheme.
fn origin(s: &str) -> &str {
    let Some(scheme_end) = scheme_len(s) else {
        return "";
    };
    let rest = &s[scheme_end..];
    match rest.strip_prefix("//") {
        Some(authority) => {
            let authority_len = authority.find('/').unwrap_or(authority.len());
            &s[..scheme_end + 2 + authority_len]
        }
        None => &s[..scheme_end],
    }
}

/// Resolve `.` and `..` segments and collapse repeated slashes.
fn normalize(locator: &str) -> String {
    let origin = origin(locator);
    let path = &locator[origin.len()..];
    let absolute = path.starts_with('/');
    let mut trailing_slash = path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" => {}
            "." => trailing_slash = true,
            ".." => {
                trailing_slash = true;
                match segments.last() {
                    Some(&last) if last != ".." => {
                        segments.pop();
                    }
                    // Above the root of an absolute path: stay at the root.
                    _ if absolute => {}
                    _ => segments.push(".."),
                }
            }
            _ => {
                trailing_slash = path.ends_with('/');
                segments.push(segment);
            }
        }
    }

    let mut out = String::with_capacity(locator.len());
    out.push_str(origin);
    if absolute {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    if trailing_slash && !segments.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests;
