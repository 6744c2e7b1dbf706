//! Per-thread `InternalContext`: the depth-marked stack used for cycle
//! detection and for the dependency chain attached to provisioning errors
//! (§4.F point 1, §5, §9).
//!
//! Concurrent provisioning on different threads never shares stack frames —
//! each thread gets its own stack, matching §5's "does not share cycle
//! state" requirement.

use std::cell::RefCell;

use crate::binding::Dependency;
use crate::key::Key;

thread_local! {
    static STACK: RefCell<Vec<Dependency>> = const { RefCell::new(Vec::new()) };
}

/// RAII guard: pushes a `(binding, dependency)` frame on creation, pops it on
/// drop (§4.F point 1). Held for the duration of one provisioning call.
pub struct ContextGuard;

impl ContextGuard {
    pub fn push(dependency: Dependency) -> Self {
        STACK.with(|s| s.borrow_mut().push(dependency));
        ContextGuard
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        STACK.with(|s| {
            s.borrow_mut().pop();
        });
    }
}

/// True iff `key` already occurs somewhere on the current thread's stack —
/// the cycle-detection test of §4.F point 1.
pub fn is_on_stack(key: &Key) -> bool {
    STACK.with(|s| s.borrow().iter().any(|d| &d.key == key))
}

/// A snapshot of the current thread's dependency chain, most-recent last.
/// Treated as the "deprecated dependency chain" §9 calls underspecified:
/// this is exactly the current frame stack, with no linked-key edges mixed in.
pub fn snapshot() -> Vec<Key> {
    STACK.with(|s| s.borrow().iter().map(|d| d.key.clone()).collect())
}

pub fn depth() -> usize {
    STACK.with(|s| s.borrow().len())
}
