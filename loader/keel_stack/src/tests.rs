use super::*;

#[test]
fn long_dependency_chain_walk() {
    // Simulates walking a chain of 100k single-dependency modules.
    fn chain_depth(remaining: u64) -> u64 {
        ensure_sufficient_stack(|| {
            if remaining == 0 {
                0
            } else {
                chain_depth(remaining - 1) + 1
            }
        })
    }

    assert_eq!(chain_depth(100_000), 100_000);
}

#[test]
fn returns_closure_result() {
    let visited: Vec<&str> = ensure_sufficient_stack(|| vec!["a", "b"]);
    assert_eq!(visited, ["a", "b"]);
}

#[test]
fn propagates_option_results() {
    let found: Option<u32> = ensure_sufficient_stack(|| None);
    assert_eq!(found, None);
}
