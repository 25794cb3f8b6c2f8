//! Scriptable reflective target
//!
//! A [`FakeObject`] exposes a fixed table of methods, each backed by a
//! handler closure. It counts lookups and records every call so tests can
//! assert that a binding happened once and which arguments reached the
//! platform.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bluecompat_core::{BindError, InvokeError, Receiver, Reflect, Value, ValueType};

type Handler = Arc<dyn Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync>;

// ----------------------------------------------------------------------------
// Recorded Calls
// ----------------------------------------------------------------------------

/// A call that reached a fake method
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub args: Vec<Value>,
}

// ----------------------------------------------------------------------------
// Fake Object
// ----------------------------------------------------------------------------

struct FakeMethod {
    name: String,
    params: Vec<ValueType>,
    handler: Handler,
}

/// Reflective target with a scripted method table
pub struct FakeObject {
    description: String,
    receiver: Receiver,
    methods: Vec<FakeMethod>,
    lookups: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeObject {
    /// Create an object with no methods
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            receiver: Receiver::Instance,
            methods: Vec::new(),
            lookups: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make lookups static, as on a type descriptor
    pub fn as_type(mut self) -> Self {
        self.receiver = Receiver::Type;
        self
    }

    /// Add a method backed by `handler`
    pub fn with_method<F>(mut self, name: &str, params: &[ValueType], handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.methods.push(FakeMethod {
            name: name.to_string(),
            params: params.to_vec(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Add a method that always returns `value`
    pub fn returning(self, name: &str, params: &[ValueType], value: impl Into<Value>) -> Self {
        let value = value.into();
        self.with_method(name, params, move |_| Ok(value.clone()))
    }

    /// Add a method whose body always raises `message`
    pub fn throwing(self, name: &str, params: &[ValueType], message: &str) -> Self {
        let message = message.to_string();
        self.with_method(name, params, move |_| {
            Err(InvokeError::target_exception(message.clone()))
        })
    }

    /// Number of lookups performed so far, successful or not
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls made to `method`
    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.method == method)
            .count()
    }
}

impl fmt::Debug for FakeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<&str> = self.methods.iter().map(|method| method.name.as_str()).collect();
        f.debug_struct("FakeObject")
            .field("description", &self.description)
            .field("receiver", &self.receiver)
            .field("methods", &methods)
            .field("lookups", &self.lookups())
            .finish()
    }
}

impl Reflect for FakeObject {
    /// Index into the method table
    type Method = usize;

    fn describe(&self) -> String {
        self.description.clone()
    }

    fn receiver(&self) -> Receiver {
        self.receiver
    }

    fn lookup(&self, name: &str, params: &[ValueType]) -> Result<usize, BindError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.methods
            .iter()
            .position(|method| method.name == name && method.params == params)
            .ok_or_else(|| BindError::MethodNotFound {
                method: name.to_string(),
                target: self.description.clone(),
            })
    }

    fn call(&self, method: &usize, args: &[Value]) -> Result<Value, InvokeError> {
        let method = self.methods.get(*method).ok_or_else(|| InvokeError::IllegalAccess {
            reason: format!("no method at index {}", method),
        })?;

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                method: method.name.clone(),
                args: args.to_vec(),
            });
        (method.handler)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_matches_name_and_params() {
        let object = FakeObject::new("Fake@1").returning("getAlias", &[], "alias");
        assert!(object.lookup("getAlias", &[]).is_ok());
        assert!(object.lookup("getAlias", &[ValueType::Int]).is_err());
        assert!(object.lookup("setAlias", &[ValueType::Str]).is_err());
        assert_eq!(object.lookups(), 3);
    }

    #[test]
    fn test_calls_are_recorded() {
        let object = FakeObject::new("Fake@1").throwing("removeBond", &[], "boom");
        let method = object.lookup("removeBond", &[]).unwrap();
        let err = object.call(&method, &[]).unwrap_err();
        assert_eq!(err, InvokeError::target_exception("boom"));
        assert_eq!(object.call_count("removeBond"), 1);
    }

    #[test]
    fn test_debug_lists_methods_without_handlers() {
        let object = FakeObject::new("Fake@1").returning("getAlias", &[], "alias");
        let rendered = format!("{:?}", object);
        assert!(rendered.contains("Fake@1"));
        assert!(rendered.contains("getAlias"));
    }
}
