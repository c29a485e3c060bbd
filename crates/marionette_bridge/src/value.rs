//! # Script Values
//!
//! The value shapes that cross the script boundary. A callable is an
//! opaque invocable taking exactly one positional argument; the host only
//! ever asks two things of a value: "is this invocable?" and "invoke it
//! with this argument".

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Error raised by a script callable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("script callable raised: {message}")]
pub struct ScriptError {
    /// What the script reported.
    pub message: String,
}

impl ScriptError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An invocable script value.
///
/// Cloning is cheap; clones invoke the same underlying function.
#[derive(Clone)]
pub struct ScriptCallable {
    function: Arc<dyn Fn(ScriptValue) -> Result<ScriptValue, ScriptError> + Send + Sync>,
}

impl ScriptCallable {
    /// Wraps a host-side function as a script callable.
    #[must_use]
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(ScriptValue) -> Result<ScriptValue, ScriptError> + Send + Sync + 'static,
    {
        Self {
            function: Arc::new(function),
        }
    }

    /// Invokes the callable with one positional argument.
    ///
    /// # Errors
    ///
    /// Whatever the script raises, as a [`ScriptError`].
    pub fn invoke(&self, arg: ScriptValue) -> Result<ScriptValue, ScriptError> {
        (self.function)(arg)
    }

    /// Returns true when both handles invoke the same function.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.function, &other.function)
    }
}

impl fmt::Debug for ScriptCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<callable>")
    }
}

/// A value as seen by the scripting side.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    /// No value.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A string.
    Str(String),
    /// An invocable value.
    Callable(ScriptCallable),
}

impl ScriptValue {
    /// The host predicate behind event subscription: is this value
    /// invocable?
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Callable(_))
    }

    /// Returns the callable, if this value is one.
    #[must_use]
    pub fn as_callable(&self) -> Option<&ScriptCallable> {
        match self {
            Self::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    /// Returns the integer value, if this value is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => a.same_as(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callable_predicate() {
        let callable = ScriptValue::Callable(ScriptCallable::new(Ok));
        assert!(callable.is_callable());
        assert!(!ScriptValue::Null.is_callable());
        assert!(!ScriptValue::Int(3).is_callable());
    }

    #[test]
    fn test_invoke_passes_the_argument_through() {
        let double = ScriptCallable::new(|arg| match arg {
            ScriptValue::Int(n) => Ok(ScriptValue::Int(n * 2)),
            other => Err(ScriptError::new(format!("expected int, got {other:?}"))),
        });

        assert_eq!(double.invoke(ScriptValue::Int(21)), Ok(ScriptValue::Int(42)));
        assert!(double.invoke(ScriptValue::Null).is_err());
    }

    #[test]
    fn test_clones_compare_equal() {
        let callable = ScriptCallable::new(Ok);
        let clone = callable.clone();
        assert!(callable.same_as(&clone));

        let other = ScriptCallable::new(Ok);
        assert!(!callable.same_as(&other));
    }
}
