//! Bluetooth constants with typed wrappers
//!
//! Raw integer values match the platform's own constants so they can be
//! passed to, and read back from, hidden methods unchanged.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Raw Value Conversions
// ----------------------------------------------------------------------------

macro_rules! raw_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $raw:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Platform integer value
            pub const fn as_raw(self) -> i32 {
                match self {
                    $( $name::$variant => $raw, )+
                }
            }

            /// Parse a platform integer value
            pub const fn from_raw(raw: i32) -> Option<Self> {
                match raw {
                    $( $raw => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value.as_raw()
            }
        }
    };
}

// ----------------------------------------------------------------------------
// Device Constants
// ----------------------------------------------------------------------------

raw_enum! {
    /// Bluetooth device type
    pub enum DeviceType {
        Unknown = 0,
        /// BR/EDR
        Classic = 1,
        /// Low Energy only
        Le = 2,
        /// Dual mode, BR/EDR and LE
        Dual = 3,
    }
}

raw_enum! {
    /// Physical transport for GATT connections to dual-mode devices
    pub enum Transport {
        /// No preference
        Auto = 0,
        /// Prefer BR/EDR
        BrEdr = 1,
        /// Prefer LE
        Le = 2,
    }
}

raw_enum! {
    /// Why a bond was removed or could not be created
    pub enum BondFailureReason {
        /// Bond attempt succeeded
        Success = 0,
        AuthFailed = 1,
        AuthRejected = 2,
        AuthCanceled = 3,
        RemoteDeviceDown = 4,
        DiscoveryInProgress = 5,
        AuthTimeout = 6,
        RepeatedAttempts = 7,
        RemoteAuthCanceled = 8,
        /// Bond was explicitly removed
        Removed = 9,
    }
}

raw_enum! {
    /// How a pairing request must be answered
    pub enum PairingVariant {
        Pin = 0,
        Passkey = 1,
        PasskeyConfirmation = 2,
        Consent = 3,
        DisplayPasskey = 4,
        DisplayPin = 5,
        OobConsent = 6,
        /// 16-digit PIN, as required by some secure simple pairing devices
        Pin16Digits = 7,
    }
}

// ----------------------------------------------------------------------------
// Adapter Constants
// ----------------------------------------------------------------------------

raw_enum! {
    /// Connection state of a profile or of the adapter as a whole
    pub enum ConnectionState {
        Disconnected = 0,
        Connecting = 1,
        Connected = 2,
        Disconnecting = 3,
    }
}

/// Bluetooth profiles reachable through profile proxies
///
/// Profile ids without a named variant, including hidden ones, travel as
/// [`Profile::Other`]. Equality and hashing compare the raw id, so
/// `Profile::Other(2) == Profile::A2dp`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Profile {
    Headset,
    A2dp,
    Health,
    InputDevice,
    Pan,
    Gatt,
    GattServer,
    A2dpSink,
    HidDevice,
    HearingAid,
    Other(i32),
}

impl Profile {
    /// Platform integer value
    pub const fn as_raw(self) -> i32 {
        match self {
            Profile::Headset => 1,
            Profile::A2dp => 2,
            Profile::Health => 3,
            Profile::InputDevice => 4,
            Profile::Pan => 5,
            Profile::Gatt => 7,
            Profile::GattServer => 8,
            Profile::A2dpSink => 11,
            Profile::HidDevice => 19,
            Profile::HearingAid => 21,
            Profile::Other(raw) => raw,
        }
    }

    /// Parse a platform integer value. Unnamed ids map to `Other`.
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Profile::Headset,
            2 => Profile::A2dp,
            3 => Profile::Health,
            4 => Profile::InputDevice,
            5 => Profile::Pan,
            7 => Profile::Gatt,
            8 => Profile::GattServer,
            11 => Profile::A2dpSink,
            19 => Profile::HidDevice,
            21 => Profile::HearingAid,
            other => Profile::Other(other),
        }
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.as_raw() == other.as_raw()
    }
}

impl Eq for Profile {}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_raw().hash(state);
    }
}

impl From<Profile> for i32 {
    fn from(value: Profile) -> i32 {
        value.as_raw()
    }
}

impl From<i32> for Profile {
    fn from(raw: i32) -> Self {
        Profile::from_raw(raw)
    }
}

raw_enum! {
    /// Whether the local adapter is connectable and/or discoverable
    pub enum ScanMode {
        None = 20,
        Connectable = 21,
        ConnectableDiscoverable = 23,
    }
}

// ----------------------------------------------------------------------------
// Broadcast Actions and Extras
// ----------------------------------------------------------------------------

pub const ACTION_DISAPPEARED: &str = "android.bluetooth.device.action.DISAPPEARED";
pub const ACTION_ALIAS_CHANGED: &str = "android.bluetooth.device.action.ALIAS_CHANGED";
pub const ACTION_UUID: &str = "android.bluetooth.device.action.UUID";
pub const ACTION_MAS_INSTANCE: &str = "android.bluetooth.device.action.MAS_INSTANCE";
pub const ACTION_NAME_FAILED: &str = "android.bluetooth.device.action.NAME_FAILED";
pub const ACTION_PAIRING_REQUEST: &str = "android.bluetooth.device.action.PAIRING_REQUEST";
pub const ACTION_PAIRING_CANCEL: &str = "android.bluetooth.device.action.PAIRING_CANCEL";

pub const EXTRA_REASON: &str = "android.bluetooth.device.extra.REASON";
pub const EXTRA_PAIRING_VARIANT: &str = "android.bluetooth.device.extra.PAIRING_VARIANT";
pub const EXTRA_PAIRING_KEY: &str = "android.bluetooth.device.extra.PAIRING_KEY";
pub const EXTRA_UUID: &str = "android.bluetooth.device.extra.UUID";

// ----------------------------------------------------------------------------
// Platform Class Names
// ----------------------------------------------------------------------------

pub const CLASS_CONTEXT: &str = "android.content.Context";
pub const CLASS_GATT_CALLBACK: &str = "android.bluetooth.BluetoothGattCallback";
pub const CLASS_GATT: &str = "android.bluetooth.BluetoothGatt";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_match_platform() {
        assert_eq!(ScanMode::ConnectableDiscoverable.as_raw(), 23);
        assert_eq!(Profile::from_raw(7), Profile::Gatt);
        assert_eq!(Transport::from_raw(3), None);
        assert_eq!(i32::from(BondFailureReason::Removed), 9);
    }

    #[test]
    fn test_unknown_raw_value_rejected() {
        assert_eq!(ConnectionState::from_raw(-1), None);
        assert_eq!(DeviceType::from_raw(4), None);
    }

    #[test]
    fn test_every_profile_id_is_reachable() {
        for (raw, profile) in [
            (4, Profile::InputDevice),
            (5, Profile::Pan),
            (11, Profile::A2dpSink),
            (19, Profile::HidDevice),
            (21, Profile::HearingAid),
        ] {
            assert_eq!(Profile::from_raw(raw), profile);
            assert_eq!(profile.as_raw(), raw);
        }
        // Ids the platform keeps hidden pass through untouched
        assert_eq!(Profile::from(26), Profile::Other(26));
        assert_eq!(i32::from(Profile::Other(26)), 26);
    }

    #[test]
    fn test_profile_equality_follows_raw_id() {
        use std::collections::HashSet;

        assert_eq!(Profile::Other(2), Profile::A2dp);
        assert_ne!(Profile::Other(6), Profile::Pan);

        let profiles: HashSet<Profile> = [Profile::Other(7), Profile::Gatt].into_iter().collect();
        assert_eq!(profiles.len(), 1);
    }
}
