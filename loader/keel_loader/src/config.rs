//! Loader configuration.

use std::rc::Rc;

use keel_ir::Locator;
use rustc_hash::FxHashMap;

/// Default locator of the page-level root module.
pub const DEFAULT_ROOT: &str = "page:/";

/// A path-mapping rule applied to a locator to get its physical id.
///
/// The first occurrence of `from` is replaced with `to`. Rules apply in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapRule {
    pub from: String,
    pub to: String,
}

impl MapRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        MapRule {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn apply(&self, id: &str) -> String {
        if self.from.is_empty() {
            return id.to_owned();
        }
        id.replacen(self.from.as_str(), &self.to, 1)
    }
}

/// Everything a host can tune about a loader.
///
/// ```text
/// let config = LoaderConfig::default()
///     .with_base("page:/lib/")
///     .alias("jquery", "vendor/jquery")
///     .map_rule("page:/lib/", "cdn:/v2/lib/")
///     .preload("polyfills");
/// ```
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Locator of the page-level root module; referrer for top-level `use`.
    pub root: Locator,
    /// Prefix for top-level identifiers (always ends with `/`).
    pub base: String,
    /// Identifier substitutions applied before resolution.
    pub alias: FxHashMap<String, String>,
    /// Locator → physical id rewrites.
    pub map: Vec<MapRule>,
    /// Identifiers loaded and compiled before any user module.
    pub preload: Vec<String>,
    /// Charset hint passed to the fetcher.
    pub charset: Option<Rc<str>>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            root: Locator::from(DEFAULT_ROOT),
            base: DEFAULT_ROOT.to_owned(),
            alias: FxHashMap::default(),
            map: Vec::new(),
            preload: Vec::new(),
            charset: None,
        }
    }
}

impl LoaderConfig {
    #[must_use]
    pub fn with_root(mut self, root: impl Into<Locator>) -> Self {
        self.root = root.into();
        self
    }

    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.base = base;
        self
    }

    #[must_use]
    pub fn alias(mut self, id: impl Into<String>, target: impl Into<String>) -> Self {
        self.alias.insert(id.into(), target.into());
        self
    }

    #[must_use]
    pub fn map_rule(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.map.push(MapRule::new(from, to));
        self
    }

    #[must_use]
    pub fn preload(mut self, id: impl Into<String>) -> Self {
        self.preload.push(id.into());
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<Rc<str>>) -> Self {
        self.charset = Some(charset.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_gets_trailing_slash() {
        let config = LoaderConfig::default().with_base("page:/lib");
        assert_eq!(config.base, "page:/lib/");
    }

    #[test]
    fn map_rule_replaces_first_occurrence() {
        let rule = MapRule::new("/lib/", "/lib-v2/");
        assert_eq!(rule.apply("page:/lib/a/lib/b"), "page:/lib-v2/a/lib/b");
        assert_eq!(MapRule::new("", "x").apply("page:/a"), "page:/a");
    }
}
