//! Stack growth guard for recursive module graph walks.
//!
//! The loader recurses in two places whose depth is bounded only by the
//! shape of the user's dependency graph:
//!
//! - the circular-wait check, which walks SAVED dependencies depth-first;
//! - compilation, where a factory asking for a dependency compiles it
//!   in place, so a long chain `a -> b -> c -> ...` nests one frame per link.
//!
//! Both wrap their recursive step in [`ensure_sufficient_stack`].
//!
//! # Platform Support
//!
//! - **Native targets**: Uses the `stacker` crate to grow the stack on demand.
//! - **WASM targets**: No-op passthrough (WASM has its own stack management).

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
///
/// ```text
/// fn walk(&self, module: &ModuleRef, stack: &mut Vec<Locator>) -> bool {
///     ensure_sufficient_stack(|| {
///         // ... visit dependencies, calling walk() for each ...
///     })
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests;
