//! Android backend over JNI
//!
//! [`JniTarget`] resolves hidden methods on a live Java object (or a class,
//! for static methods) and invokes them through JNI. Method signatures are
//! derived from the declared [`ValueType`]s; the return type is read back
//! through `java.lang.reflect.Method`, the same facility the platform's own
//! reflection uses. Pending Java exceptions are always cleared before a
//! call returns.
//!
//! ## Integration
//!
//! [`JniTarget`] covers the hidden tier only. This module ships no
//! [`BluetoothAdapter`](crate::BluetoothAdapter) or
//! [`BluetoothDevice`](crate::BluetoothDevice) implementation, because the
//! documented entry points and their associated types (contexts, callbacks,
//! proxies, sockets) belong to the host application's own JNI layer. To
//! drive [`AdapterCompat`](crate::AdapterCompat) or
//! [`DeviceCompat`](crate::DeviceCompat) on a device, wrap a `JniTarget` in
//! a host type, forward [`Reflect`] to it, and implement the platform trait
//! on that type:
//!
//! ```rust,ignore
//! struct HostDevice {
//!     target: JniTarget,
//! }
//!
//! impl Reflect for HostDevice {
//!     type Method = JniMethod;
//!
//!     fn describe(&self) -> String { self.target.describe() }
//!     fn receiver(&self) -> Receiver { self.target.receiver() }
//!     fn lookup(&self, name: &str, params: &[ValueType]) -> Result<JniMethod, BindError> {
//!         self.target.lookup(name, params)
//!     }
//!     fn call(&self, method: &JniMethod, args: &[Value]) -> Result<Value, InvokeError> {
//!         self.target.call(method, args)
//!     }
//! }
//!
//! impl BluetoothDevice for HostDevice {
//!     // Documented entry points through the host's JNI bindings
//! }
//! ```

use jni::errors::Error as JniError;
use jni::objects::{GlobalRef, JByteArray, JClass, JMethodID, JObject, JObjectArray, JStaticMethodID, JString, JValue, JValueOwned};
use jni::signature::{Primitive, ReturnType};
use jni::sys::{jsize, jvalue};
use jni::{JNIEnv, JavaVM};
use tracing::{debug, warn};
use uuid::Uuid;

use bluecompat_core::{
    ApiLevel, BindError, CompatError, InvokeError, Opaque, Receiver, Reflect, Result, Value,
    ValueType,
};

// ----------------------------------------------------------------------------
// JNI Bootstrap
// ----------------------------------------------------------------------------

const CLASS_STRING: &str = "java.lang.String";
const CLASS_BYTES: &str = "[B";
const CLASS_UUIDS: &str = "[Landroid.os.ParcelUuid;";

/// Obtain the process `JavaVM` registered by the NDK glue code
fn java_vm() -> core::result::Result<JavaVM, JniError> {
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` is the `JavaVM*` set by the NDK glue code and stays
    // valid for the lifetime of the process.
    unsafe { JavaVM::from_raw(ctx.vm().cast()) }
}

/// Read `android.os.Build.VERSION.SDK_INT`
pub fn detect_api_level() -> Result<ApiLevel> {
    let vm = java_vm().map_err(jni_error)?;
    let mut env = vm.attach_current_thread().map_err(jni_error)?;
    let sdk_int = env
        .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
        .and_then(|value| value.i())
        .map_err(jni_error)?;
    let level = u32::try_from(sdk_int)
        .map_err(|_| CompatError::config_error(format!("Invalid SDK_INT: {}", sdk_int)))?;
    debug!(level, "Detected platform API level");
    Ok(ApiLevel::new(level))
}

fn jni_error(err: JniError) -> CompatError {
    CompatError::Platform(bluecompat_core::PlatformError::Other(err.to_string()))
}

// ----------------------------------------------------------------------------
// Method Handles
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum MethodId {
    Instance(JMethodID),
    Static(JStaticMethodID),
}

/// A resolved hidden method
#[derive(Debug, Clone)]
pub struct JniMethod {
    id: MethodId,
    ret: ReturnType,
    /// Binary name of the declared return type, e.g. `java.lang.String`
    ret_class: String,
}

// ----------------------------------------------------------------------------
// JNI Target
// ----------------------------------------------------------------------------

/// A Java object, or class, whose hidden methods can be bound
pub struct JniTarget {
    vm: JavaVM,
    object: GlobalRef,
    receiver: Receiver,
    description: String,
}

impl JniTarget {
    /// Wrap an instance; instance methods are resolved on its runtime class
    pub fn instance(env: &mut JNIEnv<'_>, object: &JObject<'_>) -> Result<Self> {
        Self::wrap(env, object, Receiver::Instance)
    }

    /// Wrap a class so its static methods can be bound, e.g.
    /// `android/bluetooth/BluetoothAdapter`
    pub fn class(env: &mut JNIEnv<'_>, class_name: &str) -> Result<Self> {
        let class = env.find_class(class_name).map_err(jni_error)?;
        Self::wrap(env, &class, Receiver::Type)
    }

    fn wrap(env: &mut JNIEnv<'_>, object: &JObject<'_>, receiver: Receiver) -> Result<Self> {
        let vm = env.get_java_vm().map_err(jni_error)?;
        let object = env.new_global_ref(object).map_err(jni_error)?;
        let description = to_java_string(env, object.as_obj()).map_err(jni_error)?;
        Ok(Self {
            vm,
            object,
            receiver,
            description,
        })
    }

    /// The wrapped object, for passing to other JNI calls
    pub fn as_global(&self) -> &GlobalRef {
        &self.object
    }

    /// The wrapped object as a value usable in hidden method arguments
    pub fn to_value(&self, class_name: &'static str) -> Value {
        Value::Object(Opaque::new(class_name, self.object.clone()))
    }

    fn class_of<'local>(
        &self,
        env: &mut JNIEnv<'local>,
    ) -> core::result::Result<JClass<'local>, JniError> {
        match self.receiver {
            Receiver::Instance => env.get_object_class(self.object.as_obj()),
            Receiver::Type => env.new_local_ref(self.object.as_obj()).map(JClass::from),
        }
    }

    fn resolve(
        &self,
        env: &mut JNIEnv<'_>,
        name: &str,
        params: &[ValueType],
    ) -> core::result::Result<Option<JniMethod>, JniError> {
        let class = self.class_of(env)?;

        let param_classes = env.new_object_array(
            params.len() as jsize,
            "java/lang/Class",
            JObject::null(),
        )?;
        for (index, param) in params.iter().enumerate() {
            let param_class = class_for(env, param)?;
            env.set_object_array_element(&param_classes, index as jsize, param_class)?;
        }

        let method_name = env.new_string(name)?;
        let reflected = env.call_method(
            &class,
            "getMethod",
            "(Ljava/lang/String;[Ljava/lang/Class;)Ljava/lang/reflect/Method;",
            &[JValue::Object(&method_name), JValue::Object(&param_classes)],
        );
        let reflected = match reflected {
            Ok(value) => value.l()?,
            Err(JniError::JavaException) => {
                // NoSuchMethodException, SecurityException
                env.exception_clear()?;
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let ret_type = env
            .call_method(&reflected, "getReturnType", "()Ljava/lang/Class;", &[])?
            .l()?;
        let ret_name = env
            .call_method(&ret_type, "getName", "()Ljava/lang/String;", &[])?
            .l()?;
        let ret_class: String = env.get_string(&JString::from(ret_name))?.into();

        let signature = format!(
            "({}){}",
            params.iter().map(descriptor).collect::<String>(),
            return_descriptor(&ret_class)
        );
        let id = match self.receiver {
            Receiver::Instance => MethodId::Instance(env.get_method_id(&class, name, &signature)?),
            Receiver::Type => {
                MethodId::Static(env.get_static_method_id(&class, name, &signature)?)
            }
        };

        Ok(Some(JniMethod {
            id,
            ret: return_type(&ret_class),
            ret_class,
        }))
    }

    fn invoke(
        &self,
        env: &mut JNIEnv<'_>,
        method: &JniMethod,
        args: &[Value],
    ) -> core::result::Result<Value, JniError> {
        let owned = args
            .iter()
            .map(|arg| to_java(env, arg))
            .collect::<core::result::Result<Vec<_>, _>>()?;
        let raw: Vec<jvalue> = owned.iter().map(|arg| arg.borrow().as_jni()).collect();

        // SAFETY: the method ID was resolved against this object's class with
        // a signature built from the same parameter types the arguments were
        // checked against, and the return type matches the declared one.
        let result = unsafe {
            match method.id {
                MethodId::Instance(id) => {
                    env.call_method_unchecked(self.object.as_obj(), id, method.ret.clone(), &raw)
                }
                MethodId::Static(id) => {
                    let class: &JClass = self.object.as_obj().into();
                    env.call_static_method_unchecked(class, id, method.ret.clone(), &raw)
                }
            }
        }?;

        from_java(env, result, &method.ret_class)
    }
}

impl Reflect for JniTarget {
    type Method = JniMethod;

    fn describe(&self) -> String {
        self.description.clone()
    }

    fn receiver(&self) -> Receiver {
        self.receiver
    }

    fn lookup(&self, name: &str, params: &[ValueType]) -> core::result::Result<JniMethod, BindError> {
        let lookup_failed = |err: JniError| BindError::LookupFailed {
            method: name.to_string(),
            target: self.description.clone(),
            reason: err.to_string(),
        };

        let mut env = self.vm.attach_current_thread().map_err(lookup_failed)?;
        let resolved = env
            .with_local_frame(16, |env| self.resolve(env, name, params))
            .map_err(|err| {
                clear_pending(&mut env);
                lookup_failed(err)
            })?;

        resolved.ok_or_else(|| BindError::MethodNotFound {
            method: name.to_string(),
            target: self.description.clone(),
        })
    }

    fn call(&self, method: &JniMethod, args: &[Value]) -> core::result::Result<Value, InvokeError> {
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|err| InvokeError::IllegalAccess {
                reason: err.to_string(),
            })?;

        let frame_size = (args.len() as i32).saturating_add(8);
        match env.with_local_frame(frame_size, |env| self.invoke(env, method, args)) {
            Ok(value) => Ok(value),
            Err(JniError::JavaException) => Err(InvokeError::target_exception(take_exception(&mut env))),
            Err(err) => {
                clear_pending(&mut env);
                Err(InvokeError::IllegalAccess {
                    reason: err.to_string(),
                })
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Exceptions
// ----------------------------------------------------------------------------

/// Clear the pending exception and describe it
fn take_exception(env: &mut JNIEnv<'_>) -> String {
    let throwable = match env.exception_occurred() {
        Ok(throwable) if !throwable.is_null() => throwable,
        _ => return "unknown Java exception".to_string(),
    };
    clear_pending(env);
    to_java_string(env, &throwable).unwrap_or_else(|err| {
        clear_pending(env);
        format!("Java exception ({})", err)
    })
}

fn clear_pending(env: &mut JNIEnv<'_>) {
    if env.exception_check().unwrap_or(false) {
        if let Err(err) = env.exception_clear() {
            warn!(error = %err, "Failed to clear pending Java exception");
        }
    }
}

fn to_java_string(env: &mut JNIEnv<'_>, object: &JObject<'_>) -> core::result::Result<String, JniError> {
    let text = env
        .call_method(object, "toString", "()Ljava/lang/String;", &[])?
        .l()?;
    Ok(env.get_string(&JString::from(text))?.into())
}

// ----------------------------------------------------------------------------
// Signatures
// ----------------------------------------------------------------------------

fn descriptor(param: &ValueType) -> String {
    match param {
        ValueType::Bool => "Z".to_string(),
        ValueType::Int => "I".to_string(),
        ValueType::Long => "J".to_string(),
        ValueType::Bytes => "[B".to_string(),
        ValueType::Str => "Ljava/lang/String;".to_string(),
        ValueType::Uuids => "[Landroid/os/ParcelUuid;".to_string(),
        ValueType::Object(class) => format!("L{};", class.replace('.', "/")),
    }
}

/// Descriptor for a binary class name as returned by `Class.getName()`
fn return_descriptor(class: &str) -> String {
    match class {
        "void" => "V".to_string(),
        "boolean" => "Z".to_string(),
        "byte" => "B".to_string(),
        "char" => "C".to_string(),
        "short" => "S".to_string(),
        "int" => "I".to_string(),
        "long" => "J".to_string(),
        "float" => "F".to_string(),
        "double" => "D".to_string(),
        array if array.starts_with('[') => array.replace('.', "/"),
        object => format!("L{};", object.replace('.', "/")),
    }
}

fn return_type(class: &str) -> ReturnType {
    match class {
        "void" => ReturnType::Primitive(Primitive::Void),
        "boolean" => ReturnType::Primitive(Primitive::Boolean),
        "byte" => ReturnType::Primitive(Primitive::Byte),
        "char" => ReturnType::Primitive(Primitive::Char),
        "short" => ReturnType::Primitive(Primitive::Short),
        "int" => ReturnType::Primitive(Primitive::Int),
        "long" => ReturnType::Primitive(Primitive::Long),
        "float" => ReturnType::Primitive(Primitive::Float),
        "double" => ReturnType::Primitive(Primitive::Double),
        array if array.starts_with('[') => ReturnType::Array,
        _ => ReturnType::Object,
    }
}

fn class_for<'local>(
    env: &mut JNIEnv<'local>,
    param: &ValueType,
) -> core::result::Result<JObject<'local>, JniError> {
    let name = match param {
        ValueType::Bool => return primitive_class(env, "java/lang/Boolean"),
        ValueType::Int => return primitive_class(env, "java/lang/Integer"),
        ValueType::Long => return primitive_class(env, "java/lang/Long"),
        ValueType::Bytes => "[B".to_string(),
        ValueType::Str => "java/lang/String".to_string(),
        ValueType::Uuids => "[Landroid/os/ParcelUuid;".to_string(),
        ValueType::Object(class) => class.replace('.', "/"),
    };
    env.find_class(name).map(JObject::from)
}

/// `Boolean.TYPE` and friends
fn primitive_class<'local>(
    env: &mut JNIEnv<'local>,
    boxed: &str,
) -> core::result::Result<JObject<'local>, JniError> {
    env.get_static_field(boxed, "TYPE", "Ljava/lang/Class;")?.l()
}

// ----------------------------------------------------------------------------
// Value Conversion
// ----------------------------------------------------------------------------

fn to_java<'local>(
    env: &mut JNIEnv<'local>,
    value: &Value,
) -> core::result::Result<JValueOwned<'local>, JniError> {
    let converted = match value {
        Value::Null => JValueOwned::Object(JObject::null()),
        Value::Bool(b) => JValueOwned::Bool(u8::from(*b)),
        Value::Int(i) => JValueOwned::Int(*i),
        Value::Long(l) => JValueOwned::Long(*l),
        Value::Bytes(bytes) => JValueOwned::Object(env.byte_array_from_slice(bytes)?.into()),
        Value::Str(text) => JValueOwned::Object(env.new_string(text)?.into()),
        Value::Uuids(uuids) => {
            let array =
                env.new_object_array(uuids.len() as jsize, "android/os/ParcelUuid", JObject::null())?;
            for (index, uuid) in uuids.iter().enumerate() {
                let text = env.new_string(uuid.to_string())?;
                let parcel = env
                    .call_static_method(
                        "android/os/ParcelUuid",
                        "fromString",
                        "(Ljava/lang/String;)Landroid/os/ParcelUuid;",
                        &[JValue::Object(&text)],
                    )?
                    .l()?;
                env.set_object_array_element(&array, index as jsize, parcel)?;
            }
            JValueOwned::Object(array.into())
        }
        Value::Object(opaque) => match opaque.downcast_ref::<GlobalRef>() {
            Some(global) => JValueOwned::Object(env.new_local_ref(global.as_obj())?),
            None => {
                return Err(JniError::WrongJValueType(
                    "platform object",
                    "non-JNI opaque value",
                ))
            }
        },
    };
    Ok(converted)
}

fn from_java(
    env: &mut JNIEnv<'_>,
    value: JValueOwned<'_>,
    ret_class: &str,
) -> core::result::Result<Value, JniError> {
    let object = match value {
        JValueOwned::Void => return Ok(Value::Null),
        JValueOwned::Bool(b) => return Ok(Value::Bool(b != 0)),
        JValueOwned::Byte(b) => return Ok(Value::Int(i32::from(b))),
        JValueOwned::Char(c) => return Ok(Value::Int(i32::from(c))),
        JValueOwned::Short(s) => return Ok(Value::Int(i32::from(s))),
        JValueOwned::Int(i) => return Ok(Value::Int(i)),
        JValueOwned::Long(l) => return Ok(Value::Long(l)),
        JValueOwned::Float(_) | JValueOwned::Double(_) => {
            return Err(JniError::WrongJValueType("int or long", "floating point"))
        }
        JValueOwned::Object(object) => object,
    };

    if object.is_null() {
        return Ok(Value::Null);
    }

    match ret_class {
        CLASS_STRING => {
            let text: String = env.get_string(&JString::from(object))?.into();
            Ok(Value::Str(text))
        }
        CLASS_BYTES => Ok(Value::Bytes(env.convert_byte_array(JByteArray::from(object))?)),
        CLASS_UUIDS => {
            let array = JObjectArray::from(object);
            let length = env.get_array_length(&array)?;
            let mut uuids = Vec::with_capacity(length as usize);
            for index in 0..length {
                let parcel = env.get_object_array_element(&array, index)?;
                let text = to_java_string(env, &parcel)?;
                match Uuid::parse_str(&text) {
                    Ok(uuid) => uuids.push(uuid),
                    Err(err) => warn!(uuid = %text, error = %err, "Skipping malformed service UUID"),
                }
            }
            Ok(Value::Uuids(uuids))
        }
        class => {
            let global = env.new_global_ref(object)?;
            Ok(Value::Object(Opaque::new(class.to_string(), global)))
        }
    }
}
