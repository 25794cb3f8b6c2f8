//! Version-independent Bluetooth adapter and device operations
//!
//! Built on the dispatcher in `bluecompat-core`, this crate gives every
//! adapter and device operation one stable call site across platform
//! releases.
//!
//! ## Architecture
//!
//! - [`platform`] - Traits for the documented platform entry points
//! - [`adapter`] - [`AdapterCompat`], wrappers for the local adapter
//! - [`device`] - [`DeviceCompat`], wrappers for remote devices
//! - [`address`] - Hardware address validation
//! - [`constants`] - Typed platform constants, actions and extras
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bluecompat_bluetooth::{DeviceCompat, ApiLevel};
//!
//! let compat = DeviceCompat::with_api_level(ApiLevel::KITKAT);
//! // Public createBond() from API 19, the hidden method before that
//! let started = compat.create_bond(&device);
//! ```
//!
//! ## Platform Support
//!
//! - **Android**: with the `android` feature, `android::JniTarget` resolves
//!   hidden methods through JNI and `android::detect_api_level` reads the
//!   runtime level.
//! - **Other platforms**: any type implementing the platform traits, such as
//!   the fakes in `bluecompat-harness`.

pub mod adapter;
pub mod address;
pub mod constants;
pub mod device;
pub mod platform;

#[cfg(all(target_os = "android", feature = "android"))]
pub mod android;

// Public API exports
pub use adapter::AdapterCompat;
pub use address::{address_from_bytes, format_address, is_valid_address, parse_address, ADDRESS_LENGTH};
pub use constants::{
    BondFailureReason, ConnectionState, DeviceType, PairingVariant, Profile, ScanMode, Transport,
};
pub use device::{convert_pin_to_bytes, DeviceCompat, MAX_PIN_LENGTH};
pub use platform::{BluetoothAdapter, BluetoothDevice};

// Re-export core types for convenience
pub use bluecompat_core::{ApiLevel, CompatConfig, CompatError, Outcome, Result};

use bluecompat_core::{Failure, InvokeError};

/// Decode a raw platform integer returned by a hidden method
pub(crate) fn raw_outcome<T>(
    raw: i32,
    from_raw: fn(i32) -> Option<T>,
    expected: &'static str,
) -> Outcome<T> {
    match from_raw(raw) {
        Some(value) => Outcome::Success(value),
        None => Outcome::Failed(Failure::Invocation(InvokeError::ReturnType {
            expected,
            actual: raw.to_string(),
        })),
    }
}
