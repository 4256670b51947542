//! Stack headroom for the recursive parser and evaluator.
//!
//! Script recursion maps directly onto host recursion, so a deep but legal
//! call chain could overflow the native stack before the configured call
//! depth limit is reached. Recursive entry points run through
//! [`ensure_sufficient_stack`], which grows the stack on demand.

/// Keep at least this much stack available (128KB red zone).
const RED_ZONE: usize = 128 * 1024;

/// Stack segment size allocated when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
