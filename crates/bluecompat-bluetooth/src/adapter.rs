//! Capability wrappers for the local adapter
//!
//! Every public method is one stable call site. The neutral default each
//! method returns when the capability is absent on the running release is
//! part of its contract and documented on the method.

use bluecompat_core::{
    ApiLevel, Bracket, Capability, CompatConfig, FromValue, MethodSlot, Outcome, PlatformError,
    Result, Value, ValueType,
};
use tracing::debug;
use uuid::Uuid;

use crate::address::{address_from_bytes, parse_address, ADDRESS_LENGTH};
use crate::constants::{ConnectionState, Profile, ScanMode};
use crate::platform::BluetoothAdapter;
use crate::raw_outcome;

// ----------------------------------------------------------------------------
// Hidden Method Signatures
// ----------------------------------------------------------------------------

const NO_PARAMS: &[ValueType] = &[];
const INT_PARAM: &[ValueType] = &[ValueType::Int];
const INT_INT_PARAMS: &[ValueType] = &[ValueType::Int, ValueType::Int];

// ----------------------------------------------------------------------------
// Implementation Signatures
// ----------------------------------------------------------------------------

type ProfileProxyFn<A> = fn(
    &AdapterCompat<A>,
    &A,
    &<A as BluetoothAdapter>::Context,
    &<A as BluetoothAdapter>::ServiceListener,
    Profile,
) -> Outcome<bool>;
type CloseProxyFn<A> =
    fn(&AdapterCompat<A>, &A, Profile, &<A as BluetoothAdapter>::ProfileProxy) -> Outcome<()>;
type ListenFn<A> = fn(
    &AdapterCompat<A>,
    &A,
    &str,
    Uuid,
) -> core::result::Result<Outcome<<A as BluetoothAdapter>::ServerSocket>, PlatformError>;
type ProfileStateFn<A> = fn(&AdapterCompat<A>, &A, Profile) -> Outcome<ConnectionState>;
type RemoteDeviceFn<A> = fn(
    &AdapterCompat<A>,
    &A,
    [u8; ADDRESS_LENGTH],
) -> core::result::Result<Outcome<<A as BluetoothAdapter>::Device>, PlatformError>;
type ScanModeFn<A> = fn(&AdapterCompat<A>, &A, ScanMode, i32) -> Outcome<bool>;
type GetterFn<A, R> = fn(&AdapterCompat<A>, &A) -> Outcome<R>;
type SetTimeoutFn<A> = fn(&AdapterCompat<A>, &A, i32) -> Outcome<()>;

// ----------------------------------------------------------------------------
// Adapter Compat
// ----------------------------------------------------------------------------

/// Version-independent access to the local adapter
pub struct AdapterCompat<A: BluetoothAdapter> {
    level: ApiLevel,
    config: CompatConfig,
    set_scan_mode: MethodSlot<A::Method>,
    get_discoverable_timeout: MethodSlot<A::Method>,
    set_discoverable_timeout: MethodSlot<A::Method>,
    get_connection_state: MethodSlot<A::Method>,
}

impl<A: BluetoothAdapter + 'static> AdapterCompat<A> {
    const GET_PROFILE_PROXY: Capability<'static, ProfileProxyFn<A>> = Capability::new(
        "getProfileProxy",
        &[Bracket::new(ApiLevel::HONEYCOMB, Self::get_profile_proxy_honeycomb)],
    );

    const CLOSE_PROFILE_PROXY: Capability<'static, CloseProxyFn<A>> = Capability::new(
        "closeProfileProxy",
        &[Bracket::new(ApiLevel::HONEYCOMB, Self::close_profile_proxy_honeycomb)],
    );

    const LISTEN_INSECURE_RFCOMM: Capability<'static, ListenFn<A>> = Capability::new(
        "listenUsingInsecureRfcommWithServiceRecord",
        &[Bracket::new(ApiLevel::GINGERBREAD_MR1, Self::listen_insecure_gingerbread_mr1)],
    );

    const GET_PROFILE_CONNECTION_STATE: Capability<'static, ProfileStateFn<A>> = Capability::new(
        "getProfileConnectionState",
        &[Bracket::new(ApiLevel::ICE_CREAM_SANDWICH, Self::profile_connection_state_ics)],
    );

    const GET_REMOTE_DEVICE: Capability<'static, RemoteDeviceFn<A>> = Capability::new(
        "getRemoteDevice",
        &[Bracket::new(ApiLevel::JELLY_BEAN, Self::remote_device_jelly_bean)],
    );

    const SET_SCAN_MODE: Capability<'static, ScanModeFn<A>> = Capability::new(
        "setScanMode",
        &[Bracket::new(ApiLevel::BASE, Self::set_scan_mode_hidden)],
    );

    const GET_DISCOVERABLE_TIMEOUT: Capability<'static, GetterFn<A, i32>> = Capability::new(
        "getDiscoverableTimeout",
        &[Bracket::new(ApiLevel::BASE, Self::discoverable_timeout_hidden)],
    );

    const SET_DISCOVERABLE_TIMEOUT: Capability<'static, SetTimeoutFn<A>> = Capability::new(
        "setDiscoverableTimeout",
        &[Bracket::new(ApiLevel::BASE, Self::set_discoverable_timeout_hidden)],
    );

    const GET_CONNECTION_STATE: Capability<'static, GetterFn<A, ConnectionState>> =
        Capability::new(
            "getConnectionState",
            &[Bracket::new(ApiLevel::JELLY_BEAN, Self::connection_state_hidden)],
        );

    /// Create wrappers for a runtime at `detected`, unless the config pins a level
    pub fn new(detected: ApiLevel, config: CompatConfig) -> Self {
        let level = config.effective_api_level(detected);
        debug!(level = level.get(), "Adapter compat layer initialised");
        Self {
            level,
            config,
            set_scan_mode: MethodSlot::new("setScanMode", INT_INT_PARAMS),
            get_discoverable_timeout: MethodSlot::new("getDiscoverableTimeout", NO_PARAMS),
            set_discoverable_timeout: MethodSlot::new("setDiscoverableTimeout", INT_PARAM),
            get_connection_state: MethodSlot::new("getConnectionState", NO_PARAMS),
        }
    }

    /// Create wrappers with the default configuration
    pub fn with_api_level(level: ApiLevel) -> Self {
        Self::new(level, CompatConfig::default())
    }

    /// The level every capability dispatches on
    pub fn api_level(&self) -> ApiLevel {
        self.level
    }

    pub fn config(&self) -> &CompatConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Public Capabilities
    // ------------------------------------------------------------------------

    /// Connect a profile proxy. Returns `false` before API 11.
    pub fn get_profile_proxy(
        &self,
        adapter: &A,
        context: &A::Context,
        listener: &A::ServiceListener,
        profile: Profile,
    ) -> bool {
        Self::GET_PROFILE_PROXY
            .dispatch(self.level, |f| f(self, adapter, context, listener, profile))
            .unwrap_or(false)
    }

    /// Close a profile proxy. Does nothing before API 11.
    pub fn close_profile_proxy(&self, adapter: &A, profile: Profile, proxy: &A::ProfileProxy) {
        Self::CLOSE_PROFILE_PROXY
            .dispatch(self.level, |f| f(self, adapter, profile, proxy))
            .unwrap_or_default()
    }

    /// Listen on an insecure RFCOMM socket registered under `name` and `uuid`.
    ///
    /// Returns `Ok(None)` before API 10. Platform errors such as a channel
    /// already in use are returned as errors.
    pub fn listen_using_insecure_rfcomm_with_service_record(
        &self,
        adapter: &A,
        name: &str,
        uuid: Uuid,
    ) -> Result<Option<A::ServerSocket>> {
        let outcome = Self::LISTEN_INSECURE_RFCOMM
            .try_dispatch(self.level, |f| f(self, adapter, name, uuid))?;
        Ok(outcome.into_option())
    }

    /// Connection state of `profile`. Returns `Disconnected` before API 14.
    pub fn get_profile_connection_state(&self, adapter: &A, profile: Profile) -> ConnectionState {
        Self::GET_PROFILE_CONNECTION_STATE
            .dispatch(self.level, |f| f(self, adapter, profile))
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Device handle for a raw 6-byte address.
    ///
    /// The address is validated first: a wrong length is an
    /// [`CompatError::InvalidAddress`](bluecompat_core::CompatError::InvalidAddress)
    /// on every release. Returns `Ok(None)` before API 16.
    pub fn get_remote_device(&self, adapter: &A, address: &[u8]) -> Result<Option<A::Device>> {
        let address = address_from_bytes(address)?;
        let outcome = Self::GET_REMOTE_DEVICE
            .try_dispatch(self.level, |f| f(self, adapter, address))?;
        Ok(outcome.into_option())
    }

    /// Device handle for a textual address such as `00:11:22:33:AA:BB`
    pub fn get_remote_device_by_address(
        &self,
        adapter: &A,
        address: &str,
    ) -> Result<Option<A::Device>> {
        let address = parse_address(address)?;
        self.get_remote_device(adapter, &address)
    }

    /// Set the scan mode through the hidden `setScanMode(int, int)`.
    ///
    /// `duration_secs` only matters for
    /// [`ScanMode::ConnectableDiscoverable`]. Returns `false` when the hidden
    /// method is missing or fails.
    pub fn set_scan_mode(&self, adapter: &A, mode: ScanMode, duration_secs: u32) -> bool {
        let duration = i32::try_from(duration_secs).unwrap_or(i32::MAX);
        Self::SET_SCAN_MODE
            .dispatch(self.level, |f| f(self, adapter, mode, duration))
            .unwrap_or(false)
    }

    /// [`AdapterCompat::set_scan_mode`] with the configured default duration
    pub fn set_scan_mode_default(&self, adapter: &A, mode: ScanMode) -> bool {
        self.set_scan_mode(adapter, mode, self.config.default_scan_duration_secs)
    }

    /// Discoverable timeout in seconds. Returns `0` when unavailable.
    pub fn get_discoverable_timeout(&self, adapter: &A) -> u32 {
        let timeout = Self::GET_DISCOVERABLE_TIMEOUT
            .dispatch(self.level, |f| f(self, adapter))
            .unwrap_or(0);
        u32::try_from(timeout).unwrap_or(0)
    }

    /// Set the discoverable timeout. Does nothing when unavailable.
    pub fn set_discoverable_timeout(&self, adapter: &A, timeout_secs: u32) {
        let timeout = i32::try_from(timeout_secs).unwrap_or(i32::MAX);
        Self::SET_DISCOVERABLE_TIMEOUT
            .dispatch(self.level, |f| f(self, adapter, timeout))
            .unwrap_or_default()
    }

    /// Whether the adapter is connected to any remote device on any
    /// profile. Returns `Disconnected` before API 16 or when the hidden
    /// method is unavailable.
    pub fn get_connection_state(&self, adapter: &A) -> ConnectionState {
        Self::GET_CONNECTION_STATE
            .dispatch(self.level, |f| f(self, adapter))
            .unwrap_or(ConnectionState::Disconnected)
    }

    // ------------------------------------------------------------------------
    // Stable Tier
    // ------------------------------------------------------------------------

    fn get_profile_proxy_honeycomb(
        &self,
        adapter: &A,
        context: &A::Context,
        listener: &A::ServiceListener,
        profile: Profile,
    ) -> Outcome<bool> {
        Outcome::Success(adapter.get_profile_proxy(context, listener, profile))
    }

    fn close_profile_proxy_honeycomb(
        &self,
        adapter: &A,
        profile: Profile,
        proxy: &A::ProfileProxy,
    ) -> Outcome<()> {
        adapter.close_profile_proxy(profile, proxy);
        Outcome::Success(())
    }

    fn listen_insecure_gingerbread_mr1(
        &self,
        adapter: &A,
        name: &str,
        uuid: Uuid,
    ) -> core::result::Result<Outcome<A::ServerSocket>, PlatformError> {
        adapter
            .listen_using_insecure_rfcomm_with_service_record(name, uuid)
            .map(Outcome::Success)
    }

    fn profile_connection_state_ics(&self, adapter: &A, profile: Profile) -> Outcome<ConnectionState> {
        Outcome::Success(adapter.get_profile_connection_state(profile))
    }

    fn remote_device_jelly_bean(
        &self,
        adapter: &A,
        address: [u8; ADDRESS_LENGTH],
    ) -> core::result::Result<Outcome<A::Device>, PlatformError> {
        adapter.get_remote_device(address).map(Outcome::Success)
    }

    // ------------------------------------------------------------------------
    // Reflective Tier
    // ------------------------------------------------------------------------

    fn hidden<R: FromValue>(&self, slot: &MethodSlot<A::Method>, adapter: &A, args: &[Value]) -> Outcome<R> {
        slot.invoke_as(adapter, args, self.config.log_arguments)
    }

    fn set_scan_mode_hidden(&self, adapter: &A, mode: ScanMode, duration: i32) -> Outcome<bool> {
        self.hidden(
            &self.set_scan_mode,
            adapter,
            &[Value::Int(mode.as_raw()), Value::Int(duration)],
        )
    }

    fn discoverable_timeout_hidden(&self, adapter: &A) -> Outcome<i32> {
        self.hidden(&self.get_discoverable_timeout, adapter, &[])
    }

    fn set_discoverable_timeout_hidden(&self, adapter: &A, timeout: i32) -> Outcome<()> {
        self.hidden(&self.set_discoverable_timeout, adapter, &[Value::Int(timeout)])
    }

    fn connection_state_hidden(&self, adapter: &A) -> Outcome<ConnectionState> {
        self.hidden::<i32>(&self.get_connection_state, adapter, &[])
            .and_then(|raw| raw_outcome(raw, ConnectionState::from_raw, "connection state"))
    }
}
