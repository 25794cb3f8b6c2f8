//! Property-based tests for level selection in the wrappers
//!
//! For any runtime level the wrappers must reach exactly the tier their
//! tables name, and fall back to the neutral default everywhere else.

use bluecompat_bluetooth::{AdapterCompat, ApiLevel, DeviceCompat, DeviceType, Profile};
use bluecompat_core::{Opaque, ValueType};
use bluecompat_harness::{FakeAdapter, FakeDevice};
use proptest::prelude::*;

const ADDRESS: &str = "00:11:22:33:AA:BB";

fn arb_level() -> impl Strategy<Value = u32> {
    0u32..40
}

proptest! {
    #[test]
    fn prop_create_bond_tier_follows_level(level in arb_level()) {
        let device = FakeDevice::new(ADDRESS)
            .with_hidden(|hidden| hidden.returning("createBond", &[], true));
        let compat = DeviceCompat::with_api_level(ApiLevel::new(level));

        let started = compat.create_bond(&device);
        let used_stable = device.stable_calls() == vec!["createBond"];
        let used_hidden = device.hidden().call_count("createBond") == 1;

        if level >= 19 {
            prop_assert!(started && used_stable && !used_hidden);
        } else if level >= 1 {
            prop_assert!(started && used_hidden && !used_stable);
        } else {
            prop_assert!(!started && !used_hidden && !used_stable);
        }
    }

    #[test]
    fn prop_device_type_neutral_below_minimum(level in arb_level()) {
        let device = FakeDevice::new(ADDRESS).with_device_type(DeviceType::Le);
        let compat = DeviceCompat::with_api_level(ApiLevel::new(level));

        let expected = if level >= 18 { DeviceType::Le } else { DeviceType::Unknown };
        prop_assert_eq!(compat.device_type(&device), expected);
    }

    #[test]
    fn prop_missing_hidden_method_binds_once(level in 16u32..40, calls in 1usize..6) {
        let adapter = FakeAdapter::new();
        let compat = AdapterCompat::with_api_level(ApiLevel::new(level));

        for _ in 0..calls {
            prop_assert_eq!(compat.get_discoverable_timeout(&adapter), 0);
        }
        prop_assert_eq!(adapter.hidden().lookups(), 1);
    }

    #[test]
    fn prop_profile_proxy_never_reached_below_honeycomb(level in arb_level()) {
        let adapter = FakeAdapter::new();
        let compat = AdapterCompat::with_api_level(ApiLevel::new(level));
        let context = Opaque::new("android.content.Context", "app");
        let listener = Opaque::new("android.bluetooth.BluetoothProfile$ServiceListener", "listener");

        let connected = compat.get_profile_proxy(&adapter, &context, &listener, Profile::Gatt);
        prop_assert_eq!(connected, level >= 11);
        prop_assert_eq!(adapter.stable_calls().is_empty(), level < 11);
    }
}

#[test]
fn test_hidden_params_are_exact() {
    // A hidden method declared with different parameters is not found
    let device = FakeDevice::new(ADDRESS)
        .with_hidden(|hidden| hidden.returning("createBond", &[ValueType::Int], true));
    let compat = DeviceCompat::with_api_level(ApiLevel::JELLY_BEAN);
    assert!(!compat.create_bond(&device));
    assert_eq!(device.hidden().call_count("createBond"), 0);
}
