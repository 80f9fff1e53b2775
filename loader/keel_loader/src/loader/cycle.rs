//! Cycle pruning.
//!
//! Before `load` waits on a module's dependencies it drops the ones whose
//! loading would, through a chain of SAVED-but-not-READY modules, end up
//! waiting on the module itself. Mutually dependent modules still compile;
//! the one that loses the edge sees a partial interface instead.

use keel_diagnostic::{DiagnosticSink, LoaderError};
use keel_ir::{Locator, Status};

use crate::{ModuleRef, Registry};

/// The dependencies of `module` that are safe to wait on.
///
/// Every pruned edge is reported as [`LoaderError::CircularDependency`].
pub fn pure_dependencies(
    registry: &Registry,
    module: &ModuleRef,
    sink: &DiagnosticSink,
) -> Vec<Locator> {
    let locator = module.locator();
    module
        .dependencies()
        .into_iter()
        .filter(|dep| {
            let mut stack = vec![locator.clone()];
            let circular = is_circular_waiting(registry, registry.get(dep.as_str()), &mut stack);
            if circular {
                stack.push(locator.clone());
                sink.report_error(&LoaderError::CircularDependency { chain: stack });
            }
            !circular
        })
        .collect()
}

/// Depth-first walk from `module`, with `stack` holding the current path.
///
/// Only SAVED modules can prove a cycle: anything absent, still fetching or
/// already READY cannot be waiting on the path. On a hit the stack is left
/// holding the cycle.
fn is_circular_waiting(
    registry: &Registry,
    module: Option<ModuleRef>,
    stack: &mut Vec<Locator>,
) -> bool {
    let Some(module) = module else {
        return false;
    };
    if module.status() != Status::Saved {
        return false;
    }

    stack.push(module.locator());
    let deps = module.dependencies();
    if deps.iter().any(|dep| stack.contains(dep)) {
        return true;
    }
    for dep in &deps {
        let circular = keel_stack::ensure_sufficient_stack(|| {
            is_circular_waiting(registry, registry.get(dep.as_str()), stack)
        });
        if circular {
            return true;
        }
    }
    stack.pop();
    false
}
