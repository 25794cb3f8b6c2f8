//! Platform entry points
//!
//! These traits describe the statically known, documented entry points of
//! the host Bluetooth stack. Each method carries the API level at which it
//! first exists; callers must go through [`crate::AdapterCompat`] or
//! [`crate::DeviceCompat`], which only reach a method when the runtime level
//! satisfies that minimum. Hidden entry points are not listed here; they are
//! resolved through the [`Reflect`] supertrait.

use bluecompat_core::{FromValue, PlatformError, Reflect, Value};
use uuid::Uuid;

use crate::constants::{ConnectionState, DeviceType, Profile, Transport};

// ----------------------------------------------------------------------------
// Adapter
// ----------------------------------------------------------------------------

/// The local Bluetooth adapter
pub trait BluetoothAdapter: Reflect {
    /// Application context handed to profile proxies
    type Context;
    /// Receives profile proxy connection callbacks
    type ServiceListener;
    /// A connected profile proxy
    type ProfileProxy;
    /// Listening RFCOMM socket
    type ServerSocket;
    /// Remote device handle
    type Device;

    /// API 11
    fn get_profile_proxy(
        &self,
        context: &Self::Context,
        listener: &Self::ServiceListener,
        profile: Profile,
    ) -> bool;

    /// API 11
    fn close_profile_proxy(&self, profile: Profile, proxy: &Self::ProfileProxy);

    /// API 10
    fn listen_using_insecure_rfcomm_with_service_record(
        &self,
        name: &str,
        uuid: Uuid,
    ) -> Result<Self::ServerSocket, PlatformError>;

    /// API 14
    fn get_profile_connection_state(&self, profile: Profile) -> ConnectionState;

    /// API 16
    fn get_remote_device(&self, address: [u8; 6]) -> Result<Self::Device, PlatformError>;
}

// ----------------------------------------------------------------------------
// Remote Device
// ----------------------------------------------------------------------------

/// A remote Bluetooth device
pub trait BluetoothDevice: Reflect {
    /// Application context used to open GATT connections
    type Context: Clone + Into<Value>;
    /// Receives GATT client callbacks
    type GattCallback: Clone + Into<Value>;
    /// GATT client handle
    type Gatt: FromValue;
    /// Outgoing RFCOMM socket
    type Socket;

    /// Friendly name, available on every release
    fn name(&self) -> Option<String>;

    /// API 18
    fn device_type(&self) -> DeviceType;

    /// API 19
    fn create_bond(&self) -> bool;

    /// API 15
    fn uuids(&self) -> Option<Vec<Uuid>>;

    /// API 15
    fn fetch_uuids_with_sdp(&self) -> bool;

    /// API 19
    fn set_pin(&self, pin: &[u8]) -> bool;

    /// API 19
    fn set_pairing_confirmation(&self, confirm: bool) -> bool;

    /// API 10
    fn create_insecure_rfcomm_socket_to_service_record(
        &self,
        uuid: Uuid,
    ) -> Result<Self::Socket, PlatformError>;

    /// API 18
    fn connect_gatt(
        &self,
        context: &Self::Context,
        auto_connect: bool,
        callback: &Self::GattCallback,
    ) -> Option<Self::Gatt>;

    /// API 23
    fn connect_gatt_with_transport(
        &self,
        context: &Self::Context,
        auto_connect: bool,
        callback: &Self::GattCallback,
        transport: Transport,
    ) -> Option<Self::Gatt>;
}
