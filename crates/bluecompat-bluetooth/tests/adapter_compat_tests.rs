//! Adapter wrappers across API levels, driven through the harness fakes

use bluecompat_bluetooth::{
    AdapterCompat, ApiLevel, CompatConfig, CompatError, ConnectionState, Profile, ScanMode,
};
use bluecompat_core::{PlatformError, Value, ValueType};
use bluecompat_harness::{FakeAdapter, LogCapture};
use bluecompat_core::Opaque;
use uuid::Uuid;

const SERIAL_PORT: Uuid = Uuid::from_u128(0x0000_1101_0000_1000_8000_0080_5f9b_34fb);

fn context() -> Opaque {
    Opaque::new("android.content.Context", "app")
}

fn listener() -> Opaque {
    Opaque::new("android.bluetooth.BluetoothProfile$ServiceListener", "listener")
}

fn compat(level: u32) -> AdapterCompat<FakeAdapter> {
    AdapterCompat::with_api_level(ApiLevel::new(level))
}

// ----------------------------------------------------------------------------
// Stable Entry Points
// ----------------------------------------------------------------------------

#[test]
fn test_profile_proxy_requires_honeycomb() {
    let adapter = FakeAdapter::new();

    assert!(!compat(10).get_profile_proxy(&adapter, &context(), &listener(), Profile::A2dp));
    assert!(adapter.stable_calls().is_empty());

    assert!(compat(11).get_profile_proxy(&adapter, &context(), &listener(), Profile::A2dp));
    assert_eq!(adapter.stable_calls(), vec!["getProfileProxy"]);

    let refusing = FakeAdapter::new().refusing_proxy();
    assert!(!compat(21).get_profile_proxy(&refusing, &context(), &listener(), Profile::Headset));
}

#[test]
fn test_close_profile_proxy_is_noop_before_honeycomb() {
    let adapter = FakeAdapter::new();
    let proxy = Opaque::new("android.bluetooth.BluetoothA2dp", "proxy");

    compat(9).close_profile_proxy(&adapter, Profile::A2dp, &proxy);
    assert!(adapter.stable_calls().is_empty());

    compat(11).close_profile_proxy(&adapter, Profile::A2dp, &proxy);
    assert_eq!(adapter.stable_calls(), vec!["closeProfileProxy"]);
}

#[test]
fn test_listen_insecure_rfcomm() {
    let adapter = FakeAdapter::new();

    let socket = compat(9)
        .listen_using_insecure_rfcomm_with_service_record(&adapter, "chat", SERIAL_PORT)
        .unwrap();
    assert!(socket.is_none());

    let socket = compat(10)
        .listen_using_insecure_rfcomm_with_service_record(&adapter, "chat", SERIAL_PORT)
        .unwrap()
        .expect("supported from API 10");
    assert_eq!(socket.name, "chat");
    assert_eq!(socket.uuid, SERIAL_PORT);
}

#[test]
fn test_listen_error_propagates() {
    let adapter = FakeAdapter::new().with_listen_error("channel in use");
    let err = compat(16)
        .listen_using_insecure_rfcomm_with_service_record(&adapter, "chat", SERIAL_PORT)
        .unwrap_err();
    assert!(matches!(err, CompatError::Platform(PlatformError::Io(_))));
}

#[test]
fn test_profile_ids_beyond_named_variants() {
    let adapter = FakeAdapter::new()
        .with_profile_state(Profile::Other(21), ConnectionState::Connecting)
        .with_profile_state(Profile::Pan, ConnectionState::Connected);

    assert_eq!(
        compat(23).get_profile_connection_state(&adapter, Profile::HearingAid),
        ConnectionState::Connecting
    );
    assert_eq!(
        compat(23).get_profile_connection_state(&adapter, Profile::from_raw(5)),
        ConnectionState::Connected
    );
    assert!(compat(23).get_profile_proxy(&adapter, &context(), &listener(), Profile::Other(26)));
    assert_eq!(
        adapter.stable_calls(),
        vec!["getProfileConnectionState", "getProfileConnectionState", "getProfileProxy"]
    );
}

#[test]
fn test_profile_connection_state() {
    let adapter = FakeAdapter::new().with_profile_state(Profile::Headset, ConnectionState::Connected);

    assert_eq!(
        compat(13).get_profile_connection_state(&adapter, Profile::Headset),
        ConnectionState::Disconnected
    );
    assert_eq!(
        compat(14).get_profile_connection_state(&adapter, Profile::Headset),
        ConnectionState::Connected
    );
}

// ----------------------------------------------------------------------------
// Remote Device Lookup
// ----------------------------------------------------------------------------

#[test]
fn test_remote_device_from_bytes() {
    let adapter = FakeAdapter::new();
    let address = [0x00, 0x11, 0x22, 0x33, 0xAA, 0xBB];

    assert!(compat(15).get_remote_device(&adapter, &address).unwrap().is_none());

    let device = compat(16)
        .get_remote_device(&adapter, &address)
        .unwrap()
        .expect("supported from API 16");
    assert_eq!(device.address(), "00:11:22:33:AA:BB");
}

#[test]
fn test_invalid_address_rejected_on_every_level() {
    let adapter = FakeAdapter::new();

    for level in [9, 16, 23] {
        let err = compat(level)
            .get_remote_device(&adapter, &[1, 2, 3])
            .unwrap_err();
        assert!(matches!(err, CompatError::InvalidAddress { .. }));
    }
    // Validation happens before dispatch
    assert!(adapter.stable_calls().is_empty());
}

#[test]
fn test_remote_device_from_text() {
    let adapter = FakeAdapter::new();

    let device = compat(21)
        .get_remote_device_by_address(&adapter, "00:11:22:33:AA:BB")
        .unwrap()
        .unwrap();
    assert_eq!(device.address(), "00:11:22:33:AA:BB");

    let err = compat(21)
        .get_remote_device_by_address(&adapter, "00:11:22:33:aa:bb")
        .unwrap_err();
    assert!(matches!(err, CompatError::InvalidAddress { .. }));
}

// ----------------------------------------------------------------------------
// Hidden Entry Points
// ----------------------------------------------------------------------------

#[test]
fn test_set_scan_mode_passes_raw_values() {
    let adapter = FakeAdapter::new()
        .with_hidden(|hidden| hidden.returning("setScanMode", &[ValueType::Int, ValueType::Int], true));

    assert!(compat(10).set_scan_mode(&adapter, ScanMode::ConnectableDiscoverable, 300));

    let calls = adapter.hidden().calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0].args.as_slice(), [Value::Int(23), Value::Int(300)]));
}

#[test]
fn test_set_scan_mode_default_uses_configured_duration() {
    let adapter = FakeAdapter::new()
        .with_hidden(|hidden| hidden.returning("setScanMode", &[ValueType::Int, ValueType::Int], true));
    let config = CompatConfig::new().with_default_scan_duration(30);
    let compat = AdapterCompat::new(ApiLevel::KITKAT, config);

    assert!(compat.set_scan_mode_default(&adapter, ScanMode::Connectable));
    let calls = adapter.hidden().calls();
    assert!(matches!(calls[0].args.as_slice(), [Value::Int(21), Value::Int(30)]));
}

#[test]
fn test_set_scan_mode_missing_is_false() {
    let adapter = FakeAdapter::new();
    let compat = compat(19);

    assert!(!compat.set_scan_mode(&adapter, ScanMode::None, 0));
    assert!(!compat.set_scan_mode(&adapter, ScanMode::None, 0));
    // The failed binding is cached for the lifetime of the wrapper
    assert_eq!(adapter.hidden().lookups(), 1);
}

#[test]
fn test_discoverable_timeout() {
    let adapter = FakeAdapter::new().with_hidden(|hidden| {
        hidden
            .returning("getDiscoverableTimeout", &[], 120)
            .returning("setDiscoverableTimeout", &[ValueType::Int], Value::Null)
    });
    let compat = compat(16);

    assert_eq!(compat.get_discoverable_timeout(&adapter), 120);
    compat.set_discoverable_timeout(&adapter, 60);
    assert_eq!(adapter.hidden().call_count("setDiscoverableTimeout"), 1);

    let bare = FakeAdapter::new();
    assert_eq!(compat.get_discoverable_timeout(&bare), 0);
}

#[test]
fn test_negative_discoverable_timeout_is_zero() {
    let adapter = FakeAdapter::new()
        .with_hidden(|hidden| hidden.returning("getDiscoverableTimeout", &[], -1));
    assert_eq!(compat(16).get_discoverable_timeout(&adapter), 0);
}

#[test]
fn test_connection_state_gated_on_jelly_bean() {
    let adapter = FakeAdapter::new()
        .with_hidden(|hidden| hidden.returning("getConnectionState", &[], 2));

    assert_eq!(compat(15).get_connection_state(&adapter), ConnectionState::Disconnected);
    assert_eq!(adapter.hidden().lookups(), 0);

    assert_eq!(compat(16).get_connection_state(&adapter), ConnectionState::Connected);
}

#[test]
fn test_unknown_connection_state_is_neutral() {
    let adapter = FakeAdapter::new()
        .with_hidden(|hidden| hidden.returning("getConnectionState", &[], 42));
    assert_eq!(compat(21).get_connection_state(&adapter), ConnectionState::Disconnected);
}

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

#[test]
fn test_configured_level_overrides_detected() {
    let adapter = FakeAdapter::new();
    let config = CompatConfig::new().with_api_level(ApiLevel::GINGERBREAD);
    let compat = AdapterCompat::new(ApiLevel::MARSHMALLOW, config);

    assert_eq!(compat.api_level(), ApiLevel::GINGERBREAD);
    assert!(!compat.get_profile_proxy(&adapter, &context(), &listener(), Profile::Gatt));
}

#[test]
fn test_config_from_json() {
    let config = CompatConfig::from_json(r#"{"api_level": 18, "log_arguments": false}"#).unwrap();
    let compat: AdapterCompat<FakeAdapter> = AdapterCompat::new(ApiLevel::LOLLIPOP, config);

    assert_eq!(compat.api_level(), ApiLevel::JELLY_BEAN_MR2);
    assert!(!compat.config().log_arguments);
    assert_eq!(compat.config().default_scan_duration_secs, 120);
}

#[test]
fn test_argument_logging_can_be_disabled() {
    let adapter = FakeAdapter::new().with_hidden(|hidden| {
        hidden.throwing("setScanMode", &[ValueType::Int, ValueType::Int], "permission denied")
    });
    let compat = AdapterCompat::new(
        ApiLevel::KITKAT,
        CompatConfig::new().with_argument_logging(false),
    );

    let logs = LogCapture::new();
    let changed = logs.capture(|| compat.set_scan_mode(&adapter, ScanMode::Connectable, 5));

    assert!(!changed);
    assert!(logs.contains("Caught exception when invoking hidden method"));
    assert!(logs.contains("arg_count=2"));
    assert!(!logs.contains("args="));
}
