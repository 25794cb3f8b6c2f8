//! Fake adapter and device
//!
//! Both fakes implement the documented platform entry points with
//! configurable results and record which of them were reached. Hidden
//! methods are served by an inner [`FakeObject`], so a test can decide per
//! method whether the reflective tier finds it, and what it does.

use std::collections::HashMap;
use std::io;
use std::sync::{Mutex, PoisonError};

use bluecompat_bluetooth::constants::CLASS_GATT;
use bluecompat_bluetooth::{
    format_address, BluetoothAdapter, BluetoothDevice, ConnectionState, DeviceType, Profile,
    Transport,
};
use bluecompat_core::{
    BindError, InvokeError, Opaque, PlatformError, Receiver, Reflect, Value, ValueType,
};
use uuid::Uuid;

use crate::fake_object::FakeObject;

#[derive(Debug, Default)]
struct StableLog(Mutex<Vec<&'static str>>);

impl StableLog {
    fn record(&self, entry: &'static str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

// ----------------------------------------------------------------------------
// Sockets
// ----------------------------------------------------------------------------

/// Listening socket returned by [`FakeAdapter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeServerSocket {
    pub name: String,
    pub uuid: Uuid,
}

/// Outgoing socket returned by [`FakeDevice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeSocket {
    pub address: String,
    pub uuid: Uuid,
}

// ----------------------------------------------------------------------------
// Fake Device
// ----------------------------------------------------------------------------

/// Remote device with scripted stable and hidden behaviour
#[derive(Debug)]
pub struct FakeDevice {
    address: String,
    hidden: FakeObject,
    name: Option<String>,
    device_type: DeviceType,
    uuids: Option<Vec<Uuid>>,
    accept_bond: bool,
    socket_error: Option<String>,
    stable: StableLog,
    pins: Mutex<Vec<Vec<u8>>>,
}

impl FakeDevice {
    /// Create a device with no hidden methods
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            hidden: FakeObject::new(address.clone()),
            address,
            name: None,
            device_type: DeviceType::Unknown,
            uuids: None,
            accept_bond: true,
            socket_error: None,
            stable: StableLog::default(),
            pins: Mutex::new(Vec::new()),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn with_uuids(mut self, uuids: Vec<Uuid>) -> Self {
        self.uuids = Some(uuids);
        self
    }

    /// Make the documented `createBond()` refuse to start bonding
    pub fn refusing_bond(mut self) -> Self {
        self.accept_bond = false;
        self
    }

    /// Make RFCOMM socket creation fail with an I/O error
    pub fn with_socket_error(mut self, message: &str) -> Self {
        self.socket_error = Some(message.to_string());
        self
    }

    /// Script the hidden methods
    pub fn with_hidden(mut self, script: impl FnOnce(FakeObject) -> FakeObject) -> Self {
        self.hidden = script(self.hidden);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The hidden method table, for call and lookup assertions
    pub fn hidden(&self) -> &FakeObject {
        &self.hidden
    }

    /// Documented entry points reached so far, in order
    pub fn stable_calls(&self) -> Vec<&'static str> {
        self.stable.entries()
    }

    /// PINs passed to the documented `setPin`
    pub fn pins(&self) -> Vec<Vec<u8>> {
        self.pins.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Reflect for FakeDevice {
    type Method = usize;

    fn describe(&self) -> String {
        self.hidden.describe()
    }

    fn receiver(&self) -> Receiver {
        self.hidden.receiver()
    }

    fn lookup(&self, name: &str, params: &[ValueType]) -> Result<usize, BindError> {
        self.hidden.lookup(name, params)
    }

    fn call(&self, method: &usize, args: &[Value]) -> Result<Value, InvokeError> {
        self.hidden.call(method, args)
    }
}

impl BluetoothDevice for FakeDevice {
    type Context = Opaque;
    type GattCallback = Opaque;
    type Gatt = Opaque;
    type Socket = FakeSocket;

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn device_type(&self) -> DeviceType {
        self.stable.record("getType");
        self.device_type
    }

    fn create_bond(&self) -> bool {
        self.stable.record("createBond");
        self.accept_bond
    }

    fn uuids(&self) -> Option<Vec<Uuid>> {
        self.stable.record("getUuids");
        self.uuids.clone()
    }

    fn fetch_uuids_with_sdp(&self) -> bool {
        self.stable.record("fetchUuidsWithSdp");
        true
    }

    fn set_pin(&self, pin: &[u8]) -> bool {
        self.stable.record("setPin");
        self.pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(pin.to_vec());
        true
    }

    fn set_pairing_confirmation(&self, confirm: bool) -> bool {
        self.stable.record("setPairingConfirmation");
        confirm
    }

    fn create_insecure_rfcomm_socket_to_service_record(
        &self,
        uuid: Uuid,
    ) -> Result<FakeSocket, PlatformError> {
        self.stable.record("createInsecureRfcommSocketToServiceRecord");
        match &self.socket_error {
            Some(message) => Err(io::Error::new(io::ErrorKind::ConnectionRefused, message.clone()).into()),
            None => Ok(FakeSocket {
                address: self.address.clone(),
                uuid,
            }),
        }
    }

    fn connect_gatt(&self, _context: &Opaque, _auto_connect: bool, _callback: &Opaque) -> Option<Opaque> {
        self.stable.record("connectGatt");
        Some(Opaque::new(CLASS_GATT, Transport::Auto))
    }

    fn connect_gatt_with_transport(
        &self,
        _context: &Opaque,
        _auto_connect: bool,
        _callback: &Opaque,
        transport: Transport,
    ) -> Option<Opaque> {
        self.stable.record("connectGatt(transport)");
        Some(Opaque::new(CLASS_GATT, transport))
    }
}

// ----------------------------------------------------------------------------
// Fake Adapter
// ----------------------------------------------------------------------------

/// Local adapter with scripted stable and hidden behaviour
#[derive(Debug)]
pub struct FakeAdapter {
    hidden: FakeObject,
    profile_states: HashMap<Profile, ConnectionState>,
    accept_proxy: bool,
    listen_error: Option<String>,
    stable: StableLog,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self {
            hidden: FakeObject::new("BluetoothAdapter@fake"),
            profile_states: HashMap::new(),
            accept_proxy: true,
            listen_error: None,
            stable: StableLog::default(),
        }
    }

    pub fn with_profile_state(mut self, profile: Profile, state: ConnectionState) -> Self {
        self.profile_states.insert(profile, state);
        self
    }

    /// Make the documented `getProfileProxy` fail
    pub fn refusing_proxy(mut self) -> Self {
        self.accept_proxy = false;
        self
    }

    /// Make listening fail with an I/O error, e.g. a channel already in use
    pub fn with_listen_error(mut self, message: &str) -> Self {
        self.listen_error = Some(message.to_string());
        self
    }

    /// Script the hidden methods
    pub fn with_hidden(mut self, script: impl FnOnce(FakeObject) -> FakeObject) -> Self {
        self.hidden = script(self.hidden);
        self
    }

    pub fn hidden(&self) -> &FakeObject {
        &self.hidden
    }

    pub fn stable_calls(&self) -> Vec<&'static str> {
        self.stable.entries()
    }
}

impl Default for FakeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reflect for FakeAdapter {
    type Method = usize;

    fn describe(&self) -> String {
        self.hidden.describe()
    }

    fn receiver(&self) -> Receiver {
        self.hidden.receiver()
    }

    fn lookup(&self, name: &str, params: &[ValueType]) -> Result<usize, BindError> {
        self.hidden.lookup(name, params)
    }

    fn call(&self, method: &usize, args: &[Value]) -> Result<Value, InvokeError> {
        self.hidden.call(method, args)
    }
}

impl BluetoothAdapter for FakeAdapter {
    type Context = Opaque;
    type ServiceListener = Opaque;
    type ProfileProxy = Opaque;
    type ServerSocket = FakeServerSocket;
    type Device = FakeDevice;

    fn get_profile_proxy(&self, _context: &Opaque, _listener: &Opaque, _profile: Profile) -> bool {
        self.stable.record("getProfileProxy");
        self.accept_proxy
    }

    fn close_profile_proxy(&self, _profile: Profile, _proxy: &Opaque) {
        self.stable.record("closeProfileProxy");
    }

    fn listen_using_insecure_rfcomm_with_service_record(
        &self,
        name: &str,
        uuid: Uuid,
    ) -> Result<FakeServerSocket, PlatformError> {
        self.stable.record("listenUsingInsecureRfcommWithServiceRecord");
        match &self.listen_error {
            Some(message) => Err(io::Error::new(io::ErrorKind::AddrInUse, message.clone()).into()),
            None => Ok(FakeServerSocket {
                name: name.to_string(),
                uuid,
            }),
        }
    }

    fn get_profile_connection_state(&self, profile: Profile) -> ConnectionState {
        self.stable.record("getProfileConnectionState");
        self.profile_states
            .get(&profile)
            .copied()
            .unwrap_or(ConnectionState::Disconnected)
    }

    fn get_remote_device(&self, address: [u8; 6]) -> Result<FakeDevice, PlatformError> {
        self.stable.record("getRemoteDevice");
        Ok(FakeDevice::new(format_address(&address)))
    }
}
