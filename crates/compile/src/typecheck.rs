//! The process-wide type-check toggle.
//!
//! The pipeline-building DSL consults this flag while the tree is
//! constructed. It is the compiler's only global state:
//! [`compile_with`][crate::compile_with] establishes the caller's requested
//! value for the duration of one compilation through a [`TypeCheckScope`],
//! which restores the previous value on both normal and error exit.

use std::sync::atomic::{AtomicBool, Ordering};

static TYPE_CHECK: AtomicBool = AtomicBool::new(true);

/// Whether parameter type checking is currently enabled.
pub fn enabled() -> bool {
    TYPE_CHECK.load(Ordering::SeqCst)
}

/// A scoped override of the type-check flag.
///
/// Dropping the scope restores the value that was in force when it was
/// created, so an early `?` return cannot leak the override.
#[derive(Debug)]
pub struct TypeCheckScope {
    previous: bool,
}

impl TypeCheckScope {
    /// Set the flag for the lifetime of the returned scope.
    #[must_use]
    pub fn set(enabled: bool) -> Self {
        let previous = TYPE_CHECK.swap(enabled, Ordering::SeqCst);
        Self { previous }
    }
}

impl Drop for TypeCheckScope {
    fn drop(&mut self) {
        TYPE_CHECK.store(self.previous, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: the flag is process-wide, so the scope checks must not
    // interleave with each other.
    #[test]
    fn scopes_nest_and_restore() {
        let initial = enabled();
        {
            let _outer = TypeCheckScope::set(false);
            assert!(!enabled());
            {
                let _inner = TypeCheckScope::set(true);
                assert!(enabled());
            }
            assert!(!enabled());
        }
        assert_eq!(enabled(), initial);
    }
}
