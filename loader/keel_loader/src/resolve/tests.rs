use super::*;
use pretty_assertions::assert_eq;

fn resolver() -> PathResolver {
    PathResolver::new(
        &LoaderConfig::default()
            .with_base("page:/lib/")
            .alias("jquery", "vendor/jquery")
            .map_rule("page:/lib/", "cdn:/v2/"),
    )
}

fn resolve(id: &str, referrer: Option<&str>) -> Option<String> {
    let referrer = referrer.map(Locator::from);
    resolver()
        .resolve(id, referrer.as_ref())
        .map(|locator| locator.as_str().to_owned())
}

#[test]
fn top_level_ids_append_to_base() {
    assert_eq!(resolve("util", None).as_deref(), Some("page:/lib/util"));
    assert_eq!(resolve("a/b", Some("page:/app/main")).as_deref(), Some("page:/lib/a/b"));
}

#[test]
fn relative_ids_use_referrer_directory() {
    assert_eq!(resolve("./b", Some("page:/app/a")).as_deref(), Some("page:/app/b"));
    assert_eq!(resolve("../b", Some("page:/app/sub/a")).as_deref(), Some("page:/app/b"));
    assert_eq!(resolve("./b", None).as_deref(), Some("page:/b"));
}

#[test]
fn relative_ids_cannot_climb_above_origin() {
    assert_eq!(resolve("../../../x", Some("page:/a")).as_deref(), Some("page:/x"));
}

#[test]
fn root_relative_ids_use_base_origin() {
    assert_eq!(resolve("/app/main", None).as_deref(), Some("page:/app/main"));

    let http = PathResolver::new(&LoaderConfig::default().with_base("https://cdn.test/lib/"));
    assert_eq!(
        http.resolve("/x/y", None).map(|l| l.as_str().to_owned()).as_deref(),
        Some("https://cdn.test/x/y")
    );
}

#[test]
fn absolute_ids_are_normalized_only() {
    assert_eq!(
        resolve("https://host/a/./b/../c", None).as_deref(),
        Some("https://host/a/c")
    );
    assert_eq!(resolve("page://x//y", None).as_deref(), Some("page://x/y"));
}

#[test]
fn aliases_apply_before_resolution() {
    assert_eq!(resolve("jquery", None).as_deref(), Some("page:/lib/vendor/jquery"));
}

#[test]
fn empty_ids_do_not_resolve() {
    assert_eq!(resolve("", None), None);
    assert_eq!(resolve("   ", None), None);
}

#[test]
fn resolve_many_keeps_positions() {
    let resolved = resolver().resolve_many(&["a", "", "./c"], Some(&Locator::from("page:/x/y")));
    assert_eq!(
        resolved,
        vec![
            Some(Locator::from("page:/lib/a")),
            None,
            Some(Locator::from("page:/x/c")),
        ]
    );
}

#[test]
fn physical_ids_apply_map_rules() {
    let resolver = resolver();
    assert_eq!(
        resolver.physical_id(&Locator::from("page:/lib/util")).as_str(),
        "cdn:/v2/util"
    );
    assert_eq!(
        resolver.physical_id(&Locator::from("page:/app/main")).as_str(),
        "page:/app/main"
    );
}

#[test]
fn normalize_keeps_trailing_slash() {
    assert_eq!(normalize("page:/a/b/"), "page:/a/b/");
    assert_eq!(normalize("page:/a/b/.."), "page:/a/");
    assert_eq!(normalize("page:/"), "page:/");
}
