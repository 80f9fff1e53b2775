//! The registration entry point: identifier forms, anonymous modules,
//! host-derived locators and dependency scanning.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::cell::RefCell;
use std::rc::Rc;

use keel_loader::{
    buffer_sink, DeferredFetcher, Define, Factory, Loader, LoaderConfig, Locator, Severity,
    StaticFetcher, Status, Value,
};
use pretty_assertions::assert_eq;

type Slot = Rc<RefCell<Option<Vec<Option<Value>>>>>;

fn capture(slot: &Slot) -> impl FnOnce(Vec<Option<Value>>) + 'static {
    let slot = Rc::clone(slot);
    move |interfaces| *slot.borrow_mut() = Some(interfaces)
}

fn locators(items: &[&str]) -> Vec<Locator> {
    items.iter().map(|item| Locator::from(*item)).collect()
}

fn buffered(fetcher: StaticFetcher) -> (Loader, keel_loader::SharedSink) {
    let sink = buffer_sink();
    let loader = Loader::builder(LoaderConfig::default())
        .fetcher(fetcher)
        .sink(Rc::clone(&sink))
        .build();
    (loader, sink)
}

#[test]
fn module_id_defaults_to_locator() {
    let table = StaticFetcher::new().with("page:/anon", Define::anonymous(Factory::value(0)));
    let loader = Loader::new(LoaderConfig::default(), table);
    loader.define(Define::named("./named", Factory::value(0)));

    loader.use_modules(["anon"], |_| {});

    assert_eq!(loader.cache().get("page:/anon").unwrap().id(), "page:/anon");
    assert_eq!(loader.cache().get("page:/named").unwrap().id(), "./named");
}

#[test]
fn dependencies_resolve_relative_to_the_module() {
    let loader = Loader::new(LoaderConfig::default(), StaticFetcher::new());
    loader.define(Define::full(
        "lib/a",
        ["./b", "", "  ", "../c", "d"],
        Factory::value(0),
    ));

    let a = loader.cache().get("page:/lib/a").unwrap();
    assert_eq!(a.status(), Status::Saved);
    assert_eq!(
        a.dependencies(),
        locators(&["page:/lib/b", "page:/c", "page:/d"])
    );
}

#[test]
fn first_registration_wins() {
    let loader = Loader::new(LoaderConfig::default(), StaticFetcher::new());
    let slot = Slot::default();
    loader
        .define(Define::named("x", Factory::value(1)))
        .define(Define::named("x", Factory::value(2)));

    loader.use_modules(["x"], capture(&slot));

    assert_eq!(*slot.borrow(), Some(vec![Some(Value::from(1))]));
}

#[test]
fn dependencies_are_scanned_from_factory_source() {
    let source = r#"function (require, exports) {
        // require("./commented")
        var b = require("./b");
        require.async("./lazy");
    }"#;
    let table = StaticFetcher::new()
        .with(
            "page:/a",
            Define::anonymous(Factory::with_source(source, |require, _, _| require.get("./b"))),
        )
        .with("page:/b", Define::anonymous(Factory::value("b")));
    let loader = Loader::new(LoaderConfig::default(), table.clone());
    let slot = Slot::default();

    loader.use_modules(["a"], capture(&slot));

    assert_eq!(
        loader.cache().get("page:/a").unwrap().dependencies(),
        locators(&["page:/b"])
    );
    assert_eq!(table.request_count("page:/b"), 1);
    assert_eq!(table.request_count("page:/lazy"), 0);
    assert_eq!(*slot.borrow(), Some(vec![Some(Value::from("b"))]));
}

#[test]
fn explicit_dependencies_skip_scanning() {
    let loader = Loader::new(LoaderConfig::default(), StaticFetcher::new());
    loader.define(Define::full(
        "a",
        Vec::<String>::new(),
        Factory::with_source("require('./b')", |_, _, _| None),
    ));

    assert!(loader.cache().get("page:/a").unwrap().dependencies().is_empty());
}

#[test]
fn duplicate_anonymous_registration_is_reported_and_newest_wins() {
    let (loader, sink) = buffered(StaticFetcher::new());
    let slot = Slot::default();

    loader
        .define(Define::anonymous(Factory::value("old")))
        .define(Define::anonymous(Factory::value("new")));
    loader.use_modules(["x"], capture(&slot));

    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].code, "K0002");
    assert_eq!(*slot.borrow(), Some(vec![Some(Value::from("new"))]));
}

#[test]
fn derived_locator_names_anonymous_module() {
    let (loader, sink) = buffered(StaticFetcher::new());
    let slot = Slot::default();

    loader.define_derived(
        Define::anonymous(Factory::value("derived")),
        Some(Locator::from("page:/lib/x")),
    );
    loader.use_modules(["lib/x"], capture(&slot));

    assert_eq!(*slot.borrow(), Some(vec![Some(Value::from("derived"))]));
    assert!(sink.diagnostics().is_empty());
}

#[test]
fn failed_derivation_falls_back_to_fetch_completion() {
    let (loader, sink) = buffered(StaticFetcher::new());
    let slot = Slot::default();

    loader.define_derived(
        Define::anonymous(Factory::with_source("function () {}", |_, _, _| {
            Some(Value::from("late"))
        })),
        None,
    );
    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, "K0003");
    assert_eq!(diagnostics[0].detail.as_deref(), Some("function () {}"));

    loader.use_modules(["late"], capture(&slot));
    assert_eq!(*slot.borrow(), Some(vec![Some(Value::from("late"))]));
}

#[test]
fn named_module_with_derived_locator_takes_over_placeholder() {
    let fetcher = DeferredFetcher::new(StaticFetcher::new());
    let loader = Loader::new(LoaderConfig::default(), fetcher.clone());
    let slot = Slot::default();

    loader.use_modules(["pkg"], capture(&slot));
    loader.define_derived(
        Define::named("lib/real", Factory::value("real")),
        Some(Locator::from("page:/pkg")),
    );
    let real = loader.cache().get("page:/lib/real").unwrap();
    assert!(real.ptr_eq(&loader.cache().get("page:/pkg").unwrap()));
    assert_eq!(real.alias(), Some(Locator::from("page:/pkg")));

    fetcher.complete_all();

    assert_eq!(*slot.borrow(), Some(vec![Some(Value::from("real"))]));
}

#[test]
fn inline_named_modules_need_no_fetch() {
    let table = StaticFetcher::new();
    let loader = Loader::new(LoaderConfig::default(), table.clone());
    let slot = Slot::default();
    loader
        .define(Define::full(
            "main",
            ["./util"],
            Factory::function(|require, _, _| require.get("./util")),
        ))
        .define(Define::named("util", Factory::value("util")));

    loader.use_modules(["main"], capture(&slot));

    assert!(table.requests().is_empty());
    assert_eq!(*slot.borrow(), Some(vec![Some(Value::from("util"))]));
}
