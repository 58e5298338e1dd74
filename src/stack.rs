//! Native stack growth for the recursive parser and evaluator.
//!
//! Nesting depth in source text is unbounded: every recursive entry point of the parser and of
//! the evaluator goes through [`ensure_sufficient_stack`] so that deeply nested programs grow
//! the stack instead of aborting the process.

/// Grow the stack when less than this remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
