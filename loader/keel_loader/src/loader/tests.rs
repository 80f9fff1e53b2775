#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::{buffer_sink, Define, Factory};
use pretty_assertions::assert_eq;
use regex::Regex;

type Log = Rc<RefCell<Vec<&'static str>>>;

fn logging(log: &Log, name: &'static str) -> Factory {
    let log = Rc::clone(log);
    Factory::function(move |_, _, _| {
        log.borrow_mut().push(name);
        None
    })
}

#[test]
fn find_returns_compiled_interfaces_in_registry_order() {
    let loader = Loader::new(LoaderConfig::default(), StaticFetcher::new());
    loader.define(Define::named("lib/a", Factory::value(1)));
    loader.define(Define::named("lib/b", Factory::value(2)));
    loader.define(Define::named("app/c", Factory::value(3)));
    assert!(loader.find("lib/").is_empty());

    loader.use_modules(["lib/b", "lib/a", "app/c"], |_| {});

    assert_eq!(loader.find("lib/"), vec![Value::from(1), Value::from(2)]);
    assert_eq!(loader.find(Regex::new(r"/c$").unwrap()), vec![Value::from(3)]);
    assert!(loader.find("nothing").is_empty());
}

#[test]
fn find_skips_modules_not_yet_compiled() {
    let loader = Loader::new(LoaderConfig::default(), StaticFetcher::new());
    loader.define(Define::named("a", Factory::value(1)));
    loader.define(Define::named("b", Factory::value(2)));

    loader.use_modules(["a"], |_| {});
    assert_eq!(loader.find("page:/"), vec![Value::from(1)]);
}

#[test]
fn compiling_module_follows_nested_compiles() {
    let loader = Loader::new(LoaderConfig::default(), StaticFetcher::new());
    let seen: Rc<RefCell<Vec<Option<Locator>>>> = Rc::default();

    let outer = Rc::clone(&seen);
    loader.define(Define::full(
        "a",
        ["./b"],
        Factory::function(move |require, _, _| {
            let current = || require.loader().compiling_module().map(|m| m.locator());
            outer.borrow_mut().push(current());
            require.get("./b");
            outer.borrow_mut().push(current());
            None
        }),
    ));
    let inner = Rc::clone(&seen);
    loader.define(Define::named(
        "b",
        Factory::function(move |require, _, _| {
            inner
                .borrow_mut()
                .push(require.loader().compiling_module().map(|m| m.locator()));
            None
        }),
    ));

    loader.use_modules(["a"], |_| {});

    let expected: Vec<Option<Locator>> = ["page:/a", "page:/b", "page:/a"]
        .into_iter()
        .map(|l| Some(Locator::from(l)))
        .collect();
    assert_eq!(*seen.borrow(), expected);
    assert!(loader.compiling_module().is_none());
}

#[test]
fn configured_preload_runs_before_user_modules() {
    let log: Log = Rc::default();
    let loader = Loader::new(
        LoaderConfig::default().preload("polyfill"),
        StaticFetcher::new(),
    );
    loader.define(Define::named("polyfill", logging(&log, "polyfill")));
    loader.define(Define::named("main", logging(&log, "main")));

    loader.use_modules(["main"], |_| {});

    assert_eq!(*log.borrow(), ["polyfill", "main"]);
    assert!(loader.0.preload.borrow().is_empty());
}

#[test]
fn runtime_preload_runs_once() {
    let log: Log = Rc::default();
    let loader = Loader::new(LoaderConfig::default(), StaticFetcher::new());
    loader.define(Define::named("late", logging(&log, "late")));
    loader.define(Define::named("x", logging(&log, "x")));
    loader.define(Define::named("y", logging(&log, "y")));

    loader.add_preload("late").use_modules(["x"], |_| {});
    loader.use_modules(["y"], |_| {});

    assert_eq!(*log.borrow(), ["late", "x", "y"]);
}

#[test]
fn resolve_defaults_to_root_referrer() {
    let loader = Loader::new(
        LoaderConfig::default().with_root("page:/app/index.html"),
        StaticFetcher::new(),
    );

    assert_eq!(loader.resolve("./x", None), Some(Locator::from("page:/app/x")));
    assert_eq!(
        loader.resolve("./x", Some(&Locator::from("page:/lib/y"))),
        Some(Locator::from("page:/lib/x"))
    );
    assert_eq!(loader.resolve("  ", None), None);
}

#[test]
fn builder_uses_supplied_sink() {
    let sink = buffer_sink();
    let loader = Loader::builder(LoaderConfig::default())
        .sink(Rc::clone(&sink))
        .build();

    loader.modify("", |_, _, _| None);

    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, "K0004");
}

struct Flat;

impl Resolve for Flat {
    fn resolve(&self, id: &str, _referrer: Option<&Locator>) -> Option<Locator> {
        Some(Locator::from(format!("mem:{id}")))
    }
}

#[test]
fn custom_resolver_drives_locators_and_fetches() {
    let fetcher = StaticFetcher::new().with("mem:x", Define::anonymous(Factory::value("x")));
    let loader = Loader::with_resolver(LoaderConfig::default(), Flat, fetcher.clone());

    let result = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&result);
    loader.use_modules(["x"], move |interfaces| *slot.borrow_mut() = Some(interfaces));

    assert_eq!(*result.borrow(), Some(vec![Some(Value::from("x"))]));
    assert_eq!(fetcher.request_count("mem:x"), 1);
}
