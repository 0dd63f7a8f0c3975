// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased, clonable payloads.
//!
//! Component props and state-cell contents flow through the reconciler
//! without the reconciler knowing their concrete types. [`ErasedValue`]
//! wraps any `'static + Clone` value on the heap together with enough
//! vtable to clone it back out.

use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

/// A type-erased `'static + Clone` value.
///
/// Cloning an [`ErasedValue`] clones the contained value. Downcasting is
/// checked; a mismatch returns `None` rather than panicking, so callers can
/// attach their own diagnostics (the state-cell runtime names the offending
/// component, for example).
pub struct ErasedValue {
    inner: Box<dyn CloneAny>,
}

impl ErasedValue {
    /// Wraps a concrete value.
    #[must_use]
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
        }
    }

    /// Returns `true` if the contained value is of type `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.as_any().is::<T>()
    }

    /// Attempts to downcast to a reference of type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref()
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
        }
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValue").finish_non_exhaustive()
    }
}

/// Trait object for values that can be cloned behind erasure.
trait CloneAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn CloneAny>;
}

impl<T: Clone + 'static> CloneAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn CloneAny> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn roundtrip() {
        let value = ErasedValue::new(7_i32);
        assert!(value.is::<i32>());
        assert_eq!(value.downcast_ref::<i32>(), Some(&7));
        assert_eq!(value.downcast_ref::<u32>(), None);
    }

    #[test]
    fn clone_is_deep() {
        let value = ErasedValue::new(String::from("alpha"));
        let copy = value.clone();
        assert_eq!(copy.downcast_ref::<String>().unwrap(), "alpha");
        // The original is unaffected by the clone existing.
        assert_eq!(value.downcast_ref::<String>().unwrap(), "alpha");
    }
}
