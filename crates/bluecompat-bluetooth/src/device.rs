//! Capability wrappers for a remote device
//!
//! Several of these operations existed as hidden methods long before they
//! became public. Their tables list the hidden implementation first and the
//! documented one at the level where it appeared, so older releases keep
//! working through the reflective tier.

use bluecompat_core::{
    ApiLevel, Bracket, Capability, CompatConfig, CompatError, FromValue, MethodSlot, Outcome,
    PlatformError, Result, Value, ValueType,
};
use tracing::debug;
use uuid::Uuid;

use crate::constants::{DeviceType, Transport, CLASS_CONTEXT, CLASS_GATT_CALLBACK};
use crate::platform::BluetoothDevice;

/// Longest PIN the platform accepts, in bytes
pub const MAX_PIN_LENGTH: usize = 16;

/// Encode a textual PIN as the platform expects it.
///
/// Returns `None` when the UTF-8 encoding is empty or longer than
/// [`MAX_PIN_LENGTH`] bytes.
pub fn convert_pin_to_bytes(pin: &str) -> Option<Vec<u8>> {
    let bytes = pin.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_PIN_LENGTH {
        return None;
    }
    Some(bytes.to_vec())
}

// ----------------------------------------------------------------------------
// Hidden Method Signatures
// ----------------------------------------------------------------------------

const NO_PARAMS: &[ValueType] = &[];
const STRING_PARAM: &[ValueType] = &[ValueType::Str];
const BYTES_PARAM: &[ValueType] = &[ValueType::Bytes];
const BOOL_PARAM: &[ValueType] = &[ValueType::Bool];
const CONNECT_GATT_PARAMS: &[ValueType] = &[
    ValueType::object(CLASS_CONTEXT),
    ValueType::Bool,
    ValueType::object(CLASS_GATT_CALLBACK),
    ValueType::Int,
];

// ----------------------------------------------------------------------------
// Implementation Signatures
// ----------------------------------------------------------------------------

type GetterFn<D, R> = fn(&DeviceCompat<D>, &D) -> Outcome<R>;
type SetterFn<D, V> = fn(&DeviceCompat<D>, &D, V) -> Outcome<bool>;
type PinFn<D> = fn(&DeviceCompat<D>, &D, &[u8]) -> Outcome<bool>;
type AliasSetFn<D> = fn(&DeviceCompat<D>, &D, &str) -> Outcome<bool>;
type SocketFn<D> = fn(
    &DeviceCompat<D>,
    &D,
    Uuid,
) -> core::result::Result<Outcome<<D as BluetoothDevice>::Socket>, PlatformError>;
type ConnectGattFn<D> = fn(
    &DeviceCompat<D>,
    &D,
    &<D as BluetoothDevice>::Context,
    bool,
    &<D as BluetoothDevice>::GattCallback,
) -> Outcome<Option<<D as BluetoothDevice>::Gatt>>;
type ConnectGattTransportFn<D> = fn(
    &DeviceCompat<D>,
    &D,
    &<D as BluetoothDevice>::Context,
    bool,
    &<D as BluetoothDevice>::GattCallback,
    Transport,
) -> Outcome<Option<<D as BluetoothDevice>::Gatt>>;

// ----------------------------------------------------------------------------
// Device Compat
// ----------------------------------------------------------------------------

/// Version-independent access to remote devices
///
/// One instance serves every device of the same platform type; hidden
/// methods are bound against the first device they are used with.
pub struct DeviceCompat<D: BluetoothDevice> {
    level: ApiLevel,
    config: CompatConfig,
    get_alias: MethodSlot<D::Method>,
    set_alias: MethodSlot<D::Method>,
    create_bond: MethodSlot<D::Method>,
    cancel_bond_process: MethodSlot<D::Method>,
    remove_bond: MethodSlot<D::Method>,
    is_connected: MethodSlot<D::Method>,
    get_uuids: MethodSlot<D::Method>,
    fetch_uuids_with_sdp: MethodSlot<D::Method>,
    set_pin: MethodSlot<D::Method>,
    set_pairing_confirmation: MethodSlot<D::Method>,
    connect_gatt: MethodSlot<D::Method>,
}

impl<D: BluetoothDevice + 'static> DeviceCompat<D> {
    const DEVICE_TYPE: Capability<'static, GetterFn<D, DeviceType>> = Capability::new(
        "getType",
        &[Bracket::new(ApiLevel::JELLY_BEAN_MR2, Self::device_type_jelly_bean_mr2)],
    );

    const ALIAS: Capability<'static, GetterFn<D, Option<String>>> = Capability::new(
        "getAlias",
        &[
            Bracket::new(ApiLevel::BASE, Self::alias_from_name),
            Bracket::new(ApiLevel::ICE_CREAM_SANDWICH, Self::alias_hidden),
        ],
    );

    const SET_ALIAS: Capability<'static, AliasSetFn<D>> = Capability::new(
        "setAlias",
        &[Bracket::new(ApiLevel::ICE_CREAM_SANDWICH, Self::set_alias_hidden)],
    );

    const CREATE_BOND: Capability<'static, GetterFn<D, bool>> = Capability::new(
        "createBond",
        &[
            Bracket::new(ApiLevel::BASE, Self::create_bond_hidden),
            Bracket::new(ApiLevel::KITKAT, Self::create_bond_kitkat),
        ],
    );

    const CANCEL_BOND_PROCESS: Capability<'static, GetterFn<D, bool>> = Capability::new(
        "cancelBondProcess",
        &[Bracket::new(ApiLevel::BASE, Self::cancel_bond_process_hidden)],
    );

    const REMOVE_BOND: Capability<'static, GetterFn<D, bool>> = Capability::new(
        "removeBond",
        &[Bracket::new(ApiLevel::BASE, Self::remove_bond_hidden)],
    );

    const IS_CONNECTED: Capability<'static, GetterFn<D, bool>> = Capability::new(
        "isConnected",
        &[Bracket::new(ApiLevel::LOLLIPOP, Self::is_connected_hidden)],
    );

    const UUIDS: Capability<'static, GetterFn<D, Option<Vec<Uuid>>>> = Capability::new(
        "getUuids",
        &[
            Bracket::new(ApiLevel::BASE, Self::uuids_hidden),
            Bracket::new(ApiLevel::ICE_CREAM_SANDWICH_MR1, Self::uuids_ics_mr1),
        ],
    );

    const FETCH_UUIDS_WITH_SDP: Capability<'static, GetterFn<D, bool>> = Capability::new(
        "fetchUuidsWithSdp",
        &[
            Bracket::new(ApiLevel::BASE, Self::fetch_uuids_hidden),
            Bracket::new(ApiLevel::ICE_CREAM_SANDWICH_MR1, Self::fetch_uuids_ics_mr1),
        ],
    );

    const SET_PIN: Capability<'static, PinFn<D>> = Capability::new(
        "setPin",
        &[
            Bracket::new(ApiLevel::BASE, Self::set_pin_hidden),
            Bracket::new(ApiLevel::KITKAT, Self::set_pin_kitkat),
        ],
    );

    const SET_PAIRING_CONFIRMATION: Capability<'static, SetterFn<D, bool>> = Capability::new(
        "setPairingConfirmation",
        &[
            Bracket::new(ApiLevel::BASE, Self::set_pairing_confirmation_hidden),
            Bracket::new(ApiLevel::KITKAT, Self::set_pairing_confirmation_kitkat),
        ],
    );

    const CREATE_INSECURE_RFCOMM: Capability<'static, SocketFn<D>> = Capability::new(
        "createInsecureRfcommSocketToServiceRecord",
        &[Bracket::new(ApiLevel::GINGERBREAD_MR1, Self::insecure_rfcomm_gingerbread_mr1)],
    );

    const CONNECT_GATT: Capability<'static, ConnectGattFn<D>> = Capability::new(
        "connectGatt",
        &[Bracket::new(ApiLevel::JELLY_BEAN_MR2, Self::connect_gatt_jelly_bean_mr2)],
    );

    const CONNECT_GATT_WITH_TRANSPORT: Capability<'static, ConnectGattTransportFn<D>> =
        Capability::new(
            "connectGatt(transport)",
            &[
                Bracket::new(ApiLevel::LOLLIPOP, Self::connect_gatt_transport_hidden),
                Bracket::new(ApiLevel::MARSHMALLOW, Self::connect_gatt_transport_marshmallow),
            ],
        );

    /// Create wrappers for a runtime at `detected`, unless the config pins a level
    pub fn new(detected: ApiLevel, config: CompatConfig) -> Self {
        let level = config.effective_api_level(detected);
        debug!(level = level.get(), "Device compat layer initialised");
        Self {
            level,
            config,
            get_alias: MethodSlot::new("getAlias", NO_PARAMS),
            set_alias: MethodSlot::new("setAlias", STRING_PARAM),
            create_bond: MethodSlot::new("createBond", NO_PARAMS),
            cancel_bond_process: MethodSlot::new("cancelBondProcess", NO_PARAMS),
            remove_bond: MethodSlot::new("removeBond", NO_PARAMS),
            is_connected: MethodSlot::new("isConnected", NO_PARAMS),
            get_uuids: MethodSlot::new("getUuids", NO_PARAMS),
            fetch_uuids_with_sdp: MethodSlot::new("fetchUuidsWithSdp", NO_PARAMS),
            set_pin: MethodSlot::new("setPin", BYTES_PARAM),
            set_pairing_confirmation: MethodSlot::new("setPairingConfirmation", BOOL_PARAM),
            connect_gatt: MethodSlot::new("connectGatt", CONNECT_GATT_PARAMS),
        }
    }

    /// Create wrappers with the default configuration
    pub fn with_api_level(level: ApiLevel) -> Self {
        Self::new(level, CompatConfig::default())
    }

    pub fn api_level(&self) -> ApiLevel {
        self.level
    }

    pub fn config(&self) -> &CompatConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    /// Friendly name as reported by the remote device
    pub fn name(&self, device: &D) -> Option<String> {
        device.name()
    }

    /// Device type. Returns [`DeviceType::Unknown`] before API 18.
    pub fn device_type(&self, device: &D) -> DeviceType {
        Self::DEVICE_TYPE
            .dispatch(self.level, |f| f(self, device))
            .unwrap_or(DeviceType::Unknown)
    }

    /// Locally assigned alias.
    ///
    /// Before API 14 there is no alias and the remote name is returned.
    /// Returns `None` when the hidden `getAlias` is unavailable.
    pub fn alias(&self, device: &D) -> Option<String> {
        Self::ALIAS
            .dispatch(self.level, |f| f(self, device))
            .unwrap_or(None)
    }

    /// Set the local alias. Returns `false` before API 14 or on failure.
    pub fn set_alias(&self, device: &D, alias: &str) -> bool {
        Self::SET_ALIAS
            .dispatch(self.level, |f| f(self, device, alias))
            .unwrap_or(false)
    }

    /// The alias if one is set, the remote name otherwise
    pub fn alias_name(&self, device: &D) -> Option<String> {
        self.alias(device).or_else(|| device.name())
    }

    // ------------------------------------------------------------------------
    // Bonding
    // ------------------------------------------------------------------------

    /// Start bonding. Returns `false` when bonding could not be started.
    pub fn create_bond(&self, device: &D) -> bool {
        Self::CREATE_BOND
            .dispatch(self.level, |f| f(self, device))
            .unwrap_or(false)
    }

    /// Abort an ongoing bonding attempt
    pub fn cancel_bond_process(&self, device: &D) -> bool {
        Self::CANCEL_BOND_PROCESS
            .dispatch(self.level, |f| f(self, device))
            .unwrap_or(false)
    }

    /// Remove the bond with the device
    pub fn remove_bond(&self, device: &D) -> bool {
        Self::REMOVE_BOND
            .dispatch(self.level, |f| f(self, device))
            .unwrap_or(false)
    }

    /// Whether an ACL link is up. Returns `false` before API 21.
    pub fn is_connected(&self, device: &D) -> bool {
        Self::IS_CONNECTED
            .dispatch(self.level, |f| f(self, device))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------------
    // Service Discovery
    // ------------------------------------------------------------------------

    /// Cached service UUIDs of the device, `None` when unknown
    pub fn uuids(&self, device: &D) -> Option<Vec<Uuid>> {
        Self::UUIDS
            .dispatch(self.level, |f| f(self, device))
            .unwrap_or(None)
    }

    /// Start an SDP query. Results arrive as
    /// [`ACTION_UUID`](crate::constants::ACTION_UUID) broadcasts.
    pub fn fetch_uuids_with_sdp(&self, device: &D) -> bool {
        Self::FETCH_UUIDS_WITH_SDP
            .dispatch(self.level, |f| f(self, device))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------------
    // Pairing
    // ------------------------------------------------------------------------

    /// Answer a PIN pairing request with raw PIN bytes
    pub fn set_pin(&self, device: &D, pin: &[u8]) -> bool {
        Self::SET_PIN
            .dispatch(self.level, |f| f(self, device, pin))
            .unwrap_or(false)
    }

    /// Answer a PIN pairing request with a textual PIN.
    ///
    /// The PIN is validated before any dispatch; an empty or over-long PIN
    /// is a [`CompatError::InvalidPin`] on every release.
    pub fn set_pin_code(&self, device: &D, pin: &str) -> Result<bool> {
        let bytes = convert_pin_to_bytes(pin).ok_or_else(|| {
            CompatError::invalid_pin(format!(
                "expected 1 to {} UTF-8 bytes, got {}",
                MAX_PIN_LENGTH,
                pin.len()
            ))
        })?;
        Ok(self.set_pin(device, &bytes))
    }

    /// Confirm or reject a passkey pairing request
    pub fn set_pairing_confirmation(&self, device: &D, confirm: bool) -> bool {
        Self::SET_PAIRING_CONFIRMATION
            .dispatch(self.level, |f| f(self, device, confirm))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------------

    /// Open an insecure RFCOMM socket to the service registered under `uuid`.
    ///
    /// Returns `Ok(None)` before API 10. Platform errors are returned as errors.
    pub fn create_insecure_rfcomm_socket_to_service_record(
        &self,
        device: &D,
        uuid: Uuid,
    ) -> Result<Option<D::Socket>> {
        let outcome = Self::CREATE_INSECURE_RFCOMM
            .try_dispatch(self.level, |f| f(self, device, uuid))?;
        Ok(outcome.into_option())
    }

    /// Connect to the device's GATT server. Returns `None` before API 18.
    pub fn connect_gatt(
        &self,
        device: &D,
        context: &D::Context,
        auto_connect: bool,
        callback: &D::GattCallback,
    ) -> Option<D::Gatt> {
        Self::CONNECT_GATT
            .dispatch(self.level, |f| f(self, device, context, auto_connect, callback))
            .unwrap_or(None)
    }

    /// Connect to the device's GATT server over a specific transport.
    ///
    /// API 21 and 22 only have a hidden variant; returns `None` below API 21.
    pub fn connect_gatt_with_transport(
        &self,
        device: &D,
        context: &D::Context,
        auto_connect: bool,
        callback: &D::GattCallback,
        transport: Transport,
    ) -> Option<D::Gatt> {
        Self::CONNECT_GATT_WITH_TRANSPORT
            .dispatch(self.level, |f| {
                f(self, device, context, auto_connect, callback, transport)
            })
            .unwrap_or(None)
    }

    // ------------------------------------------------------------------------
    // Stable Tier
    // ------------------------------------------------------------------------

    fn device_type_jelly_bean_mr2(&self, device: &D) -> Outcome<DeviceType> {
        Outcome::Success(device.device_type())
    }

    fn alias_from_name(&self, device: &D) -> Outcome<Option<String>> {
        Outcome::Success(device.name())
    }

    fn create_bond_kitkat(&self, device: &D) -> Outcome<bool> {
        Outcome::Success(device.create_bond())
    }

    fn uuids_ics_mr1(&self, device: &D) -> Outcome<Option<Vec<Uuid>>> {
        Outcome::Success(device.uuids())
    }

    fn fetch_uuids_ics_mr1(&self, device: &D) -> Outcome<bool> {
        Outcome::Success(device.fetch_uuids_with_sdp())
    }

    fn set_pin_kitkat(&self, device: &D, pin: &[u8]) -> Outcome<bool> {
        Outcome::Success(device.set_pin(pin))
    }

    fn set_pairing_confirmation_kitkat(&self, device: &D, confirm: bool) -> Outcome<bool> {
        Outcome::Success(device.set_pairing_confirmation(confirm))
    }

    fn insecure_rfcomm_gingerbread_mr1(
        &self,
        device: &D,
        uuid: Uuid,
    ) -> core::result::Result<Outcome<D::Socket>, PlatformError> {
        device
            .create_insecure_rfcomm_socket_to_service_record(uuid)
            .map(Outcome::Success)
    }

    fn connect_gatt_jelly_bean_mr2(
        &self,
        device: &D,
        context: &D::Context,
        auto_connect: bool,
        callback: &D::GattCallback,
    ) -> Outcome<Option<D::Gatt>> {
        Outcome::Success(device.connect_gatt(context, auto_connect, callback))
    }

    fn connect_gatt_transport_marshmallow(
        &self,
        device: &D,
        context: &D::Context,
        auto_connect: bool,
        callback: &D::GattCallback,
        transport: Transport,
    ) -> Outcome<Option<D::Gatt>> {
        Outcome::Success(device.connect_gatt_with_transport(
            context,
            auto_connect,
            callback,
            transport,
        ))
    }

    // ------------------------------------------------------------------------
    // Reflective Tier
    // ------------------------------------------------------------------------

    fn hidden<R: FromValue>(&self, slot: &MethodSlot<D::Method>, device: &D, args: &[Value]) -> Outcome<R> {
        slot.invoke_as(device, args, self.config.log_arguments)
    }

    fn alias_hidden(&self, device: &D) -> Outcome<Option<String>> {
        self.hidden(&self.get_alias, device, &[])
    }

    fn set_alias_hidden(&self, device: &D, alias: &str) -> Outcome<bool> {
        self.hidden(&self.set_alias, device, &[Value::from(alias)])
    }

    fn create_bond_hidden(&self, device: &D) -> Outcome<bool> {
        self.hidden(&self.create_bond, device, &[])
    }

    fn cancel_bond_process_hidden(&self, device: &D) -> Outcome<bool> {
        self.hidden(&self.cancel_bond_process, device, &[])
    }

    fn remove_bond_hidden(&self, device: &D) -> Outcome<bool> {
        self.hidden(&self.remove_bond, device, &[])
    }

    fn is_connected_hidden(&self, device: &D) -> Outcome<bool> {
        self.hidden(&self.is_connected, device, &[])
    }

    fn uuids_hidden(&self, device: &D) -> Outcome<Option<Vec<Uuid>>> {
        self.hidden(&self.get_uuids, device, &[])
    }

    fn fetch_uuids_hidden(&self, device: &D) -> Outcome<bool> {
        self.hidden(&self.fetch_uuids_with_sdp, device, &[])
    }

    fn set_pin_hidden(&self, device: &D, pin: &[u8]) -> Outcome<bool> {
        self.hidden(&self.set_pin, device, &[Value::from(pin)])
    }

    fn set_pairing_confirmation_hidden(&self, device: &D, confirm: bool) -> Outcome<bool> {
        self.hidden(&self.set_pairing_confirmation, device, &[Value::Bool(confirm)])
    }

    fn connect_gatt_transport_hidden(
        &self,
        device: &D,
        context: &D::Context,
        auto_connect: bool,
        callback: &D::GattCallback,
        transport: Transport,
    ) -> Outcome<Option<D::Gatt>> {
        let args: [Value; 4] = [
            context.clone().into(),
            Value::Bool(auto_connect),
            callback.clone().into(),
            Value::Int(transport.as_raw()),
        ];
        self.hidden(&self.connect_gatt, device, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_conversion() {
        assert_eq!(convert_pin_to_bytes("0000"), Some(b"0000".to_vec()));
        assert_eq!(convert_pin_to_bytes(""), None);
        assert_eq!(
            convert_pin_to_bytes("1234567890123456").map(|b| b.len()),
            Some(MAX_PIN_LENGTH)
        );
        assert_eq!(convert_pin_to_bytes("12345678901234567"), None);
    }

    #[test]
    fn test_pin_length_counts_bytes_not_chars() {
        // Eight two-byte characters fill the limit exactly
        assert!(convert_pin_to_bytes(&"é".repeat(8)).is_some());
        assert!(convert_pin_to_bytes(&"é".repeat(9)).is_none());
    }
}
