//! Version dispatcher
//!
//! Each capability owns a table of [`Bracket`]s ordered by strictly
//! increasing minimum API level. Dispatch picks the last bracket whose
//! minimum is satisfied by the runtime level and hands it to the caller;
//! when no bracket qualifies the call is [`Outcome::Unsupported`] and the
//! capability wrapper returns its documented neutral default.
//!
//! Tables are usually declared as constants so that a mis-ordered table is
//! rejected during compilation:
//!
//! ```rust
//! use bluecompat_core::{ApiLevel, Bracket, Capability, Outcome};
//!
//! fn legacy(x: u32) -> Outcome<u32> { Outcome::Success(x) }
//! fn modern(x: u32) -> Outcome<u32> { Outcome::Success(x * 2) }
//!
//! const DOUBLE: Capability<'static, fn(u32) -> Outcome<u32>> = Capability::new(
//!     "double",
//!     &[
//!         Bracket::new(ApiLevel::GINGERBREAD_MR1, legacy),
//!         Bracket::new(ApiLevel::KITKAT, modern),
//!     ],
//! );
//!
//! assert_eq!(DOUBLE.dispatch(ApiLevel::new(16), |f| f(4)), Outcome::Success(4));
//! assert_eq!(DOUBLE.dispatch(ApiLevel::new(21), |f| f(4)), Outcome::Success(8));
//! assert!(DOUBLE.dispatch(ApiLevel::new(8), |f| f(4)).is_unsupported());
//! ```

use tracing::debug;

use crate::errors::{CompatError, Result};
use crate::outcome::Outcome;
use crate::types::ApiLevel;

// ----------------------------------------------------------------------------
// Bracket
// ----------------------------------------------------------------------------

/// An implementation together with the minimum API level it requires
#[derive(Debug, Clone, Copy)]
pub struct Bracket<F> {
    min: ApiLevel,
    implementation: F,
}

impl<F> Bracket<F> {
    pub const fn new(min: ApiLevel, implementation: F) -> Self {
        Self {
            min,
            implementation,
        }
    }

    /// Minimum API level at which this implementation may run
    pub const fn min(&self) -> ApiLevel {
        self.min
    }

    pub fn implementation(&self) -> &F {
        &self.implementation
    }
}

// ----------------------------------------------------------------------------
// Capability Table
// ----------------------------------------------------------------------------

/// A named capability and its version-ordered implementations
#[derive(Debug, Clone, Copy)]
pub struct Capability<'a, F> {
    name: &'a str,
    brackets: &'a [Bracket<F>],
}

impl<'a, F> Capability<'a, F> {
    /// Build a capability table.
    ///
    /// Panics when the bracket minimums are not strictly increasing. In a
    /// `const` or `static` item that panic is a compile error; use
    /// [`Capability::try_new`] for tables assembled at runtime.
    pub const fn new(name: &'a str, brackets: &'a [Bracket<F>]) -> Self {
        let mut i = 1;
        while i < brackets.len() {
            assert!(
                brackets[i - 1].min.get() < brackets[i].min.get(),
                "capability bracket minimums must be strictly increasing"
            );
            i += 1;
        }
        Self { name, brackets }
    }

    /// Build a capability table, rejecting mis-ordered brackets
    pub fn try_new(name: &'a str, brackets: &'a [Bracket<F>]) -> Result<Self> {
        if let Some(pair) = brackets.windows(2).find(|pair| pair[0].min >= pair[1].min) {
            return Err(CompatError::UnorderedBrackets {
                capability: name.to_string(),
                previous: pair[0].min,
                next: pair[1].min,
            });
        }
        Ok(Self { name, brackets })
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn brackets(&self) -> &'a [Bracket<F>] {
        self.brackets
    }

    /// Lowest API level at which the capability exists at all
    pub fn minimum(&self) -> Option<ApiLevel> {
        self.brackets.first().map(Bracket::min)
    }

    /// Check whether any implementation is eligible at `level`
    pub fn is_supported(&self, level: ApiLevel) -> bool {
        self.select(level).is_some()
    }

    /// Pick the highest bracket whose minimum is satisfied by `level`
    pub fn select(&self, level: ApiLevel) -> Option<&'a Bracket<F>> {
        self.brackets.iter().rev().find(|bracket| bracket.min <= level)
    }

    /// Run the selected implementation through `call`.
    ///
    /// Whatever the implementation returns, including a failure, is passed
    /// through unchanged.
    pub fn dispatch<T, C>(&self, level: ApiLevel, call: C) -> Outcome<T>
    where
        C: FnOnce(&'a F) -> Outcome<T>,
    {
        match self.select(level) {
            Some(bracket) => call(&bracket.implementation),
            None => {
                self.log_unsupported(level);
                Outcome::Unsupported
            }
        }
    }

    /// Like [`Capability::dispatch`] for implementations whose platform
    /// contract defines errors; those errors propagate untouched.
    pub fn try_dispatch<T, E, C>(&self, level: ApiLevel, call: C) -> core::result::Result<Outcome<T>, E>
    where
        C: FnOnce(&'a F) -> core::result::Result<Outcome<T>, E>,
    {
        match self.select(level) {
            Some(bracket) => call(&bracket.implementation),
            None => {
                self.log_unsupported(level);
                Ok(Outcome::Unsupported)
            }
        }
    }

    fn log_unsupported(&self, level: ApiLevel) {
        debug!(
            capability = self.name,
            level = level.get(),
            minimum = ?self.minimum().map(ApiLevel::get),
            "Capability not available on this runtime"
        );
    }
}
