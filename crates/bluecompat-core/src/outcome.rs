//! Tri-state result of a capability call
//!
//! Every capability call reduces to one of [`Outcome::Success`],
//! [`Outcome::Unsupported`] or [`Outcome::Failed`] before it returns. At the
//! public boundary `Failed` collapses to the capability's neutral default, the
//! same as `Unsupported`; tests and callers that care can still tell them apart.

use crate::errors::{BindError, InvokeError};

// ----------------------------------------------------------------------------
// Failure Cause
// ----------------------------------------------------------------------------

/// Cause of a failed hidden-method call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("binding failed: {0}")]
    Binding(#[from] BindError),

    #[error("invocation failed: {0}")]
    Invocation(#[from] InvokeError),
}

// ----------------------------------------------------------------------------
// Outcome
// ----------------------------------------------------------------------------

/// Result of dispatching a capability
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// The capability ran and produced a value
    Success(T),
    /// No implementation exists for the current runtime
    Unsupported,
    /// An implementation exists but could not be used
    Failed(Failure),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Outcome::Unsupported)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// True when binding the hidden method failed
    pub fn is_binding_failure(&self) -> bool {
        matches!(self, Outcome::Failed(Failure::Binding(_)))
    }

    /// True when the hidden method was bound but raised when called
    pub fn is_invocation_failure(&self) -> bool {
        matches!(self, Outcome::Failed(Failure::Invocation(_)))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            Outcome::Unsupported => Outcome::Unsupported,
            Outcome::Failed(failure) => Outcome::Failed(failure.clone()),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Unsupported => Outcome::Unsupported,
            Outcome::Failed(failure) => Outcome::Failed(failure),
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> Outcome<U>>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Unsupported => Outcome::Unsupported,
            Outcome::Failed(failure) => Outcome::Failed(failure),
        }
    }

    /// Run `fallback` when this outcome is not a success
    pub fn or_else_with<F: FnOnce() -> Outcome<T>>(self, fallback: F) -> Outcome<T> {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            _ => fallback(),
        }
    }

    /// Collapse to `Some` only on success
    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Collapse to the value or the capability's neutral default
    pub fn unwrap_or(self, neutral: T) -> T {
        match self {
            Outcome::Success(value) => value,
            _ => neutral,
        }
    }

    pub fn unwrap_or_else<F: FnOnce() -> T>(self, neutral: F) -> T {
        match self {
            Outcome::Success(value) => value,
            _ => neutral(),
        }
    }
}

impl<T: Default> Outcome<T> {
    pub fn unwrap_or_default(self) -> T {
        self.unwrap_or_else(T::default)
    }
}

impl<T> From<Failure> for Outcome<T> {
    fn from(failure: Failure) -> Self {
        Outcome::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> Failure {
        Failure::Binding(BindError::MethodNotFound {
            method: "getAlias".into(),
            target: "device".into(),
        })
    }

    #[test]
    fn test_neutral_default_on_unsupported_and_failed() {
        assert!(!Outcome::<bool>::Unsupported.unwrap_or(false));
        assert_eq!(Outcome::<i32>::Failed(not_found()).unwrap_or_default(), 0);
        assert_eq!(Outcome::Success(7).unwrap_or(0), 7);
    }

    #[test]
    fn test_failure_classification() {
        let outcome: Outcome<()> = Outcome::Failed(not_found());
        assert!(outcome.is_binding_failure());
        assert!(!outcome.is_invocation_failure());

        let outcome: Outcome<()> =
            Outcome::Failed(InvokeError::illegal_argument("wrong arity").into());
        assert!(outcome.is_invocation_failure());
    }

    #[test]
    fn test_or_else_with_only_runs_on_non_success() {
        let fallback = Outcome::<u8>::Unsupported.or_else_with(|| Outcome::Success(2));
        assert_eq!(fallback, Outcome::Success(2));

        let kept = Outcome::Success(1).or_else_with(|| Outcome::Success(2));
        assert_eq!(kept, Outcome::Success(1));
    }
}
