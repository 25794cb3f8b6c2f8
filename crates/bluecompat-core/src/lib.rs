//! Capability dispatch core for evolving host platform APIs
//!
//! A host platform ships many releases, each of which may add, relocate or
//! hide an operation. This crate gives every capability one stable call site:
//!
//! - [`dispatch`] selects an implementation from a table of
//!   (minimum API level, implementation) brackets;
//! - [`binding`] resolves undocumented methods reflectively, once, and turns
//!   every binding or invocation failure into an explicit [`Outcome`];
//! - [`reflect`] defines the value model and the [`Reflect`] trait a
//!   platform backend implements.
//!
//! Nothing here reads global platform state. The runtime level and the
//! target object are always passed in, so the whole layer can be exercised
//! without a device.

extern crate alloc;

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod binding;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod outcome;
pub mod reflect;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use binding::{render_arguments, BoundMethod, MethodSlot};
pub use config::{CompatConfig, DEFAULT_SCAN_DURATION_SECS};
pub use dispatch::{Bracket, Capability};
pub use errors::{BindError, CompatError, InvokeError, PlatformError, Result};
pub use outcome::{Failure, Outcome};
pub use reflect::{FromValue, Opaque, Receiver, Reflect, Value, ValueType};
pub use types::ApiLevel;
