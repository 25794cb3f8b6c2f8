//! Reflective introspection model
//!
//! Hidden platform methods are resolved by exact name and declared parameter
//! types, then called with dynamically typed arguments. This module defines
//! the value model shared by every reflective backend and the [`Reflect`]
//! trait a backend implements for its objects.

use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use uuid::Uuid;

use crate::errors::{BindError, InvokeError};

// ----------------------------------------------------------------------------
// Value Types
// ----------------------------------------------------------------------------

/// Declared type of a reflective parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Long,
    Bytes,
    Str,
    Uuids,
    /// A platform object of the named class
    Object(Cow<'static, str>),
}

impl ValueType {
    /// Object type for a fully qualified class name
    pub const fn object(class: &'static str) -> Self {
        Self::Object(Cow::Borrowed(class))
    }

    /// Primitive types cannot carry `null`
    pub fn is_primitive(&self) -> bool {
        matches!(self, ValueType::Bool | ValueType::Int | ValueType::Long)
    }

    /// Check whether `value` may be passed where this type is declared
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ty, Value::Null) => !ty.is_primitive(),
            (ValueType::Bool, Value::Bool(_))
            | (ValueType::Int, Value::Int(_))
            | (ValueType::Long, Value::Long(_))
            | (ValueType::Bytes, Value::Bytes(_))
            | (ValueType::Str, Value::Str(_))
            | (ValueType::Uuids, Value::Uuids(_)) => true,
            (ValueType::Object(expected), Value::Object(object)) => {
                expected.as_ref() == object.class_name()
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "boolean"),
            ValueType::Int => write!(f, "int"),
            ValueType::Long => write!(f, "long"),
            ValueType::Bytes => write!(f, "byte[]"),
            ValueType::Str => write!(f, "String"),
            ValueType::Uuids => write!(f, "ParcelUuid[]"),
            ValueType::Object(class) => write!(f, "{}", class),
        }
    }
}

// ----------------------------------------------------------------------------
// Opaque Platform Objects
// ----------------------------------------------------------------------------

/// A platform object passed through the compat layer unchanged
#[derive(Clone)]
pub struct Opaque {
    class: Cow<'static, str>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(class: impl Into<Cow<'static, str>>, inner: T) -> Self {
        Self {
            class: class.into(),
            inner: Arc::new(inner),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// True when both handles refer to the same platform object
    pub fn same_object(&self, other: &Opaque) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({}@{:p})", self.class, Arc::as_ptr(&self.inner))
    }
}

// ----------------------------------------------------------------------------
// Values
// ----------------------------------------------------------------------------

/// A dynamically typed argument or return value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Bytes(Vec<u8>),
    Str(String),
    Uuids(Vec<Uuid>),
    Object(Opaque),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the runtime type, used in error messages
    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed("null"),
            Value::Bool(_) => Cow::Borrowed("boolean"),
            Value::Int(_) => Cow::Borrowed("int"),
            Value::Long(_) => Cow::Borrowed("long"),
            Value::Bytes(_) => Cow::Borrowed("byte[]"),
            Value::Str(_) => Cow::Borrowed("String"),
            Value::Uuids(_) => Cow::Borrowed("ParcelUuid[]"),
            Value::Object(object) => Cow::Borrowed(object.class_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Int(value) => write!(f, "{}", value),
            Value::Long(value) => write!(f, "{}", value),
            Value::Bytes(bytes) => write!(f, "[{}]", hex::encode(bytes)),
            // Quoted, never equal to the rendering of `Value::Null`
            Value::Str(value) => write!(f, "{:?}", value),
            Value::Uuids(uuids) => {
                write!(f, "[")?;
                for (i, uuid) in uuids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", uuid)?;
                }
                write!(f, "]")
            }
            Value::Object(object) => write!(f, "{:?}", object),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Opaque> for Value {
    fn from(value: Opaque) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// ----------------------------------------------------------------------------
// Typed Extraction
// ----------------------------------------------------------------------------

/// Conversion from a reflective return value into a typed result
pub trait FromValue: Sized {
    /// Name used when the value has the wrong shape
    const EXPECTED: &'static str;

    fn from_value(value: Value) -> Result<Self, InvokeError>;
}

fn mismatch<T: FromValue>(value: &Value) -> InvokeError {
    InvokeError::ReturnType {
        expected: T::EXPECTED,
        actual: value.type_name().into_owned(),
    }
}

macro_rules! impl_from_value {
    ($ty:ty, $expected:literal, $variant:ident) => {
        impl FromValue for $ty {
            const EXPECTED: &'static str = $expected;

            fn from_value(value: Value) -> Result<Self, InvokeError> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    };
}

impl_from_value!(bool, "boolean", Bool);
impl_from_value!(i32, "int", Int);
impl_from_value!(i64, "long", Long);
impl_from_value!(Vec<u8>, "byte[]", Bytes);
impl_from_value!(String, "String", Str);
impl_from_value!(Vec<Uuid>, "ParcelUuid[]", Uuids);
impl_from_value!(Opaque, "object", Object);

impl FromValue for () {
    const EXPECTED: &'static str = "void";

    fn from_value(_value: Value) -> Result<Self, InvokeError> {
        Ok(())
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: Value) -> Result<Self, InvokeError> {
        Ok(value)
    }
}

/// Reference-typed results may legitimately be `null`
impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: Value) -> Result<Self, InvokeError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// ----------------------------------------------------------------------------
// Introspection Facility
// ----------------------------------------------------------------------------

/// How a lookup resolves methods on a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Virtual lookup on the runtime type of an instance
    Instance,
    /// Static lookup on a type descriptor
    Type,
}

/// A platform object (or type descriptor) whose methods can be resolved
/// and invoked by name.
///
/// Implementations must not panic; every failure is reported through the
/// returned errors so the reflective tier can degrade the capability.
pub trait Reflect {
    /// Resolved, invocable method handle
    type Method;

    /// Human-readable description of the target for diagnostics
    fn describe(&self) -> String;

    fn receiver(&self) -> Receiver {
        Receiver::Instance
    }

    /// Resolve a method by exact name and exact parameter types
    fn lookup(&self, name: &str, params: &[ValueType]) -> Result<Self::Method, BindError>;

    /// Invoke a previously resolved method on this target
    fn call(&self, method: &Self::Method, args: &[Value]) -> Result<Value, InvokeError>;
}

impl<T: Reflect + ?Sized> Reflect for &T {
    type Method = T::Method;

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn receiver(&self) -> Receiver {
        (**self).receiver()
    }

    fn lookup(&self, name: &str, params: &[ValueType]) -> Result<Self::Method, BindError> {
        (**self).lookup(name, params)
    }

    fn call(&self, method: &Self::Method, args: &[Value]) -> Result<Value, InvokeError> {
        (**self).call(method, args)
    }
}
