//! Failure handling of the reflective tier as seen through the wrappers

use bluecompat_bluetooth::constants::{CLASS_CONTEXT, CLASS_GATT, CLASS_GATT_CALLBACK};
use bluecompat_bluetooth::{ApiLevel, DeviceCompat, Transport};
use std::thread;

use bluecompat_core::{
    BoundMethod, Failure, InvokeError, MethodSlot, Opaque, Outcome, Receiver, Reflect, Value,
    ValueType,
};
use bluecompat_harness::{FakeDevice, FakeObject, LogCapture};

const ADDRESS: &str = "00:11:22:33:AA:BB";

const NO_PARAMS: &[ValueType] = &[];
const STRING_PARAM: &[ValueType] = &[ValueType::Str];

const ADAPTER_CLASS: &str = "android.bluetooth.BluetoothAdapter";

const CONNECT_GATT_PARAMS: &[ValueType] = &[
    ValueType::object(CLASS_CONTEXT),
    ValueType::Bool,
    ValueType::object(CLASS_GATT_CALLBACK),
    ValueType::Int,
];

#[test]
fn test_missing_hidden_method_degrades_quietly() {
    let device = FakeDevice::new(ADDRESS);
    let compat = DeviceCompat::with_api_level(ApiLevel::JELLY_BEAN);
    let logs = LogCapture::new();

    let results = logs.capture(|| [compat.create_bond(&device), compat.create_bond(&device)]);

    assert_eq!(results, [false, false]);
    // Bound once, never retried
    assert_eq!(device.hidden().lookups(), 1);
    assert_eq!(logs.count("Can't find hidden method"), 1);
    assert_eq!(logs.count("invoke() called without a valid method"), 2);
    assert!(logs.contains(ADDRESS));
}

#[test]
fn test_binding_failure_is_reported_as_failed() {
    let device = FakeDevice::new(ADDRESS);
    let create_bond = BoundMethod::bind(&device, "createBond", NO_PARAMS);

    assert!(!create_bond.is_valid());
    for _ in 0..2 {
        let outcome = create_bond.invoke_as::<bool, _>(&device, &[]);
        assert!(outcome.is_binding_failure());
        assert!(!outcome.is_unsupported());
    }
}

#[test]
fn test_mismatched_argument_is_logged_with_values() {
    let device = FakeDevice::new(ADDRESS).with_hidden(|hidden| {
        hidden.returning("connectGatt", CONNECT_GATT_PARAMS, Opaque::new(CLASS_GATT, "gatt"))
    });
    let compat = DeviceCompat::with_api_level(ApiLevel::LOLLIPOP);
    // An activity is not the declared Context parameter type
    let activity = Opaque::new("android.app.Activity", "activity");
    let callback = Opaque::new(CLASS_GATT_CALLBACK, "callback");
    let logs = LogCapture::new();

    let gatt = logs.capture(|| {
        compat.connect_gatt_with_transport(&device, &activity, true, &callback, Transport::Le)
    });

    assert!(gatt.is_none());
    // Rejected before reaching the platform
    assert_eq!(device.hidden().call_count("connectGatt"), 0);
    assert!(logs.contains("Caught exception when invoking hidden method"));
    assert!(logs.contains("android.app.Activity"));
    assert!(logs.contains(", true, "));
    assert!(logs.contains(", 2]"));
}

#[test]
fn test_invocation_failure_keeps_binding() {
    let device = FakeDevice::new(ADDRESS).with_hidden(|hidden| {
        hidden.with_method("setAlias", &[ValueType::Str], |args| match args {
            [Value::Str(alias)] if !alias.is_empty() => Ok(Value::Bool(true)),
            _ => Err(InvokeError::illegal_argument("alias must not be empty")),
        })
    });
    let set_alias = BoundMethod::bind(&device, "setAlias", STRING_PARAM);

    let outcome = set_alias.invoke_as::<bool, _>(&device, &[Value::from("")]);
    assert!(matches!(
        outcome,
        Outcome::Failed(Failure::Invocation(InvokeError::IllegalArgument { .. }))
    ));

    // A failed call does not invalidate the binding
    assert!(set_alias.is_valid());
    assert_eq!(
        set_alias.invoke_as::<bool, _>(&device, &[Value::from("Car")]),
        Outcome::Success(true)
    );
}

#[test]
fn test_null_argument_logged_as_null() {
    let device = FakeDevice::new(ADDRESS)
        .with_hidden(|hidden| hidden.throwing("setAlias", &[ValueType::Str], "NullPointerException"));
    let set_alias = BoundMethod::bind(&device, "setAlias", STRING_PARAM);
    let logs = LogCapture::new();

    let outcome = logs.capture(|| set_alias.invoke(&device, &[Value::Null]));

    assert!(outcome.is_invocation_failure());
    assert!(logs.contains("args=[null]"));
    assert!(logs.contains("NullPointerException"));
}

#[test]
fn test_concurrent_first_use_binds_once() {
    static IS_CONNECTED: MethodSlot<usize> = MethodSlot::new("isConnected", NO_PARAMS);

    let device = FakeDevice::new(ADDRESS).with_hidden(|hidden| hidden.returning("isConnected", &[], true));

    let results: Vec<Outcome<bool>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| scope.spawn(|| IS_CONNECTED.invoke_as::<bool, _>(&device, &[], true)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker panicked"))
            .collect()
    });

    assert!(results.iter().all(|outcome| *outcome == Outcome::Success(true)));
    assert_eq!(device.hidden().lookups(), 1);
    assert_eq!(device.hidden().call_count("isConnected"), 16);
}

#[test]
fn test_type_descriptor_resolves_static_methods() {
    let adapter_class = FakeObject::new(ADAPTER_CLASS)
        .as_type()
        .returning("checkBluetoothAddress", STRING_PARAM, true);
    assert_eq!(adapter_class.receiver(), Receiver::Type);

    let check = BoundMethod::bind(&adapter_class, "checkBluetoothAddress", STRING_PARAM);
    assert_eq!(check.bound_to(), ADAPTER_CLASS);
    assert_eq!(
        check.invoke_as::<bool, _>(&adapter_class, &[Value::from(ADDRESS)]),
        Outcome::Success(true)
    );
    assert!(matches!(
        adapter_class.calls()[0].args.as_slice(),
        [Value::Str(address)] if address == ADDRESS
    ));
}

#[test]
fn test_type_descriptor_bind_failure_names_receiver() {
    let adapter_class = FakeObject::new(ADAPTER_CLASS).as_type();
    let logs = LogCapture::new();

    let missing = logs.capture(|| BoundMethod::bind(&adapter_class, "getDefaultAdapter", NO_PARAMS));

    assert!(!missing.is_valid());
    assert_eq!(logs.count("Can't find hidden method"), 1);
    assert!(logs.contains(ADAPTER_CLASS));
    assert!(logs.contains(r#"receiver="type""#));
}
