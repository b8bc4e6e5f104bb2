//! Type-erased values and example pairs
//!
//! The engine resolves values for arbitrary described types, so everything it
//! moves around is a `Value`: an owned, boxed value that still knows how to
//! compare, clone and print itself using the concrete type's own
//! implementations.

use std::any::{Any, TypeId};
use std::fmt;

use serde::Serialize;

use crate::error::{VerifierError, VerifierResult};

/// Object-safe view of a concrete value
pub trait ErasedValue: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_value(&self) -> Box<dyn ErasedValue>;
    /// Equality under the concrete type's own `PartialEq`; values of
    /// different types are never equal
    fn eq_value(&self, other: &dyn ErasedValue) -> bool;
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn value_type_name(&self) -> &'static str;
}

impl<T: Any + Clone + PartialEq + fmt::Debug> ErasedValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_value(&self) -> Box<dyn ErasedValue> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn ErasedValue) -> bool {
        other.as_any().downcast_ref::<T>().map_or(false, |other| self == other)
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// An owned value of some described type
pub struct Value {
    inner: Box<dyn ErasedValue>,
}

impl Value {
    /// Wraps `value`; wrapping a `Value` returns it unchanged
    pub fn new<T: Any + Clone + PartialEq + fmt::Debug>(value: T) -> Self {
        if TypeId::of::<T>() == TypeId::of::<Value>() {
            let boxed: Box<dyn Any> = Box::new(value);
            match boxed.downcast::<Value>() {
                Ok(value) => return *value,
                Err(_) => unreachable!("type ids matched"),
            }
        }
        Value { inner: Box::new(value) }
    }

    /// Name of the concrete type held
    pub fn type_name(&self) -> &'static str {
        self.inner.value_type_name()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.as_any_mut().downcast_mut::<T>()
    }

    /// Clones the held value out as a `T`
    pub fn extract<T: Any + Clone>(&self) -> VerifierResult<T> {
        if let Some(this) = (self as &dyn Any).downcast_ref::<T>() {
            return Ok(this.clone());
        }
        self.downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| mismatch::<T>(self.type_name()))
    }

    /// Moves the held value out as a `T`
    pub fn into_inner<T: Any>(self) -> VerifierResult<T> {
        if TypeId::of::<T>() == TypeId::of::<Value>() {
            let boxed: Box<dyn Any> = Box::new(self);
            return boxed
                .downcast::<T>()
                .map(|value| *value)
                .map_err(|_| mismatch::<T>(std::any::type_name::<Value>()));
        }
        let found = self.type_name();
        self.inner
            .into_any()
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| mismatch::<T>(found))
    }
}

fn mismatch<T>(found: &str) -> VerifierError {
    VerifierError::access(format!(
        "expected a value of type {}, found {}",
        std::any::type_name::<T>(),
        found
    ))
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Value { inner: self.inner.clone_value() }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq_value(other.inner.as_ref())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt_value(f)
    }
}

/// Token standing in for values of the unconstrained top type
///
/// Tokens carry no meaning besides their number; two tokens are equal iff
/// their numbers are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Opaque(pub u64);

/// Two distinguishable values of one type, plus a structural copy of the
/// first
///
/// `low` and `high` are unequal under the type's own equality. `low_copy` is
/// equal to `low` but was built separately, so identity-based equality can be
/// told apart from structural equality.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamplePair<T = Value> {
    pub low: T,
    pub high: T,
    pub low_copy: T,
}

impl<T: Clone> ExamplePair<T> {
    pub fn new(low: T, high: T) -> Self {
        let low_copy = low.clone();
        Self { low, high, low_copy }
    }
}

impl<T> ExamplePair<T> {
    pub fn with_copy(low: T, high: T, low_copy: T) -> Self {
        Self { low, high, low_copy }
    }

    pub fn map<U, F>(self, mut f: F) -> VerifierResult<ExamplePair<U>>
    where
        F: FnMut(T) -> VerifierResult<U>,
    {
        Ok(ExamplePair {
            low: f(self.low)?,
            high: f(self.high)?,
            low_copy: f(self.low_copy)?,
        })
    }
}

impl<T: PartialEq + fmt::Debug> ExamplePair<T> {
    /// Validates an externally supplied pair
    pub fn checked(low: T, high: T, low_copy: T, type_name: &str) -> VerifierResult<Self> {
        if low == high {
            return Err(VerifierError::precondition(format!(
                "both prefab values of type {} are equal: {:?}",
                type_name, low
            )));
        }
        if low != low_copy {
            return Err(VerifierError::precondition(format!(
                "the copy of prefab value {:?} of type {} is not equal to it",
                low, type_name
            )));
        }
        Ok(Self { low, high, low_copy })
    }

    /// Whether the pair cannot tell values apart, as for stateless types
    pub fn is_degenerate(&self) -> bool {
        self.low == self.high
    }

    /// The pair value that differs from `current`
    pub fn other(&self, current: &T) -> &T {
        if *current == self.low {
            &self.high
        } else {
            &self.low
        }
    }
}

impl ExamplePair<Value> {
    pub fn extract<T: Any + Clone>(&self) -> VerifierResult<ExamplePair<T>> {
        Ok(ExamplePair {
            low: self.low.extract()?,
            high: self.high.extract()?,
            low_copy: self.low_copy.extract()?,
        })
    }
}
