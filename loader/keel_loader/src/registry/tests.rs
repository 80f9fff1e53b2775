use super::*;
use pretty_assertions::assert_eq;

#[test]
fn get_or_insert_creates_one_record_per_locator() {
    let registry = Registry::new();
    let locator = Locator::from("page:/a");

    let first = registry.get_or_insert(&locator, Status::Fetching);
    let second = registry.get_or_insert(&locator, Status::Unknown);

    assert!(first.ptr_eq(&second));
    assert_eq!(second.status(), Status::Fetching);
    assert_eq!(registry.len(), 1);
}

#[test]
fn alias_shares_the_record() {
    let registry = Registry::new();
    let real = registry.get_or_insert(&Locator::from("page:/real"), Status::Saved);
    registry.insert(Locator::from("page:/requested"), real.clone());

    let through_alias = registry.get("page:/requested");
    assert!(through_alias.is_some_and(|m| m.ptr_eq(&real)));
    assert_eq!(registry.len(), 2);
}

#[test]
fn remove_keeps_iteration_order_of_the_rest() {
    let registry = Registry::new();
    for name in ["page:/a", "page:/b", "page:/c"] {
        registry.get_or_insert(&Locator::from(name), Status::Fetching);
    }

    assert!(registry.remove("page:/b").is_some());
    assert!(!registry.contains("page:/b"));
    assert_eq!(
        registry.locators(),
        vec![Locator::from("page:/a"), Locator::from("page:/c")]
    );
}

#[test]
fn clones_see_the_same_entries() {
    let registry = Registry::new();
    let handle = registry.clone();
    registry.get_or_insert(&Locator::from("page:/x"), Status::Fetching);
    assert!(handle.contains("page:/x"));
    assert!(handle.remove("page:/x").is_some());
    assert!(registry.is_empty());
}
