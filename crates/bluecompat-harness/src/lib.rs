//! Test harness for the compat layer
//!
//! Provides a scriptable reflective target, fake adapters and devices that
//! implement the platform traits, and a log capture for asserting on the
//! diagnostics the reflective tier emits. Everything here is deterministic
//! and runs without a device.

pub mod fake_object;
pub mod fakes;
pub mod logs;

pub use fake_object::{FakeObject, RecordedCall};
pub use fakes::{FakeAdapter, FakeDevice, FakeServerSocket, FakeSocket};
pub use logs::LogCapture;
