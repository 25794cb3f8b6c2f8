//! Reflective tier: bind once, invoke many
//!
//! A [`BoundMethod`] is the result of resolving a hidden method by name and
//! parameter types. Resolution happens exactly once; a failed resolution
//! leaves the handle permanently invalid and every later invocation yields
//! [`Outcome::Failed`] without touching the platform again. Invocation
//! failures of any kind are logged together with the target description, the
//! method name and every argument, then returned as [`Outcome::Failed`].
//!
//! [`MethodSlot`] is the per-call-site cache: a write-once cell that binds on
//! first use and is only read afterwards, so concurrent callers never race.

use alloc::borrow::Cow;
use std::sync::OnceLock;
use tracing::{debug, error, warn};

use crate::errors::{BindError, InvokeError};
use crate::outcome::{Failure, Outcome};
use crate::reflect::{FromValue, Receiver, Reflect, Value, ValueType};

// ----------------------------------------------------------------------------
// Argument Rendering
// ----------------------------------------------------------------------------

/// Render invocation arguments for diagnostics, `null` for nulls
pub fn render_arguments(args: &[Value]) -> String {
    let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

fn render_signature(name: &str, params: &[ValueType]) -> String {
    let params: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("{}({})", name, params.join(", "))
}

// ----------------------------------------------------------------------------
// Bound Method
// ----------------------------------------------------------------------------

/// A hidden method resolved against a target's runtime type
#[derive(Debug)]
pub struct BoundMethod<M> {
    name: Cow<'static, str>,
    params: Cow<'static, [ValueType]>,
    bound_to: String,
    state: Result<M, BindError>,
    log_arguments: bool,
}

impl<M> BoundMethod<M> {
    /// Resolve `name(params)` on `target`.
    ///
    /// Never fails: a missing method is logged once and recorded, and the
    /// returned handle stays invalid for its whole lifetime.
    pub fn bind<T>(
        target: &T,
        name: impl Into<Cow<'static, str>>,
        params: impl Into<Cow<'static, [ValueType]>>,
    ) -> Self
    where
        T: Reflect<Method = M> + ?Sized,
    {
        let name = name.into();
        let params = params.into();
        let bound_to = target.describe();
        let state = target.lookup(&name, &params);

        match &state {
            Ok(_) => debug!(
                method = %render_signature(&name, &params),
                target = %bound_to,
                "Bound hidden method"
            ),
            Err(err) => {
                let kind = match target.receiver() {
                    Receiver::Instance => "instance",
                    Receiver::Type => "type",
                };
                error!(
                    method = %render_signature(&name, &params),
                    target = %bound_to,
                    receiver = kind,
                    error = %err,
                    "Can't find hidden method"
                );
            }
        }

        Self {
            name,
            params,
            bound_to,
            state,
            log_arguments: true,
        }
    }

    /// Enable or disable argument values in failure logs
    pub fn with_argument_logging(mut self, enabled: bool) -> Self {
        self.log_arguments = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    /// Description of the target the method was resolved against
    pub fn bound_to(&self) -> &str {
        &self.bound_to
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_ok()
    }

    pub fn binding_error(&self) -> Option<&BindError> {
        self.state.as_ref().err()
    }

    /// Invoke the bound method on `target`.
    ///
    /// `target` must share the runtime type the method was bound against.
    pub fn invoke<T>(&self, target: &T, args: &[Value]) -> Outcome<Value>
    where
        T: Reflect<Method = M> + ?Sized,
    {
        let method = match &self.state {
            Ok(method) => method,
            Err(err) => {
                warn!(
                    method = %self.name,
                    target = %target.describe(),
                    "invoke() called without a valid method"
                );
                let not_bound = InvokeError::NotBound {
                    method: self.name.to_string(),
                    target: self.bound_to.clone(),
                };
                self.log_failure(target, args, &not_bound);
                return Outcome::Failed(Failure::Binding(err.clone()));
            }
        };

        if let Err(err) = self.check_arguments(args) {
            self.log_failure(target, args, &err);
            return Outcome::Failed(Failure::Invocation(err));
        }

        match target.call(method, args) {
            Ok(value) => Outcome::Success(value),
            Err(err) => {
                self.log_failure(target, args, &err);
                Outcome::Failed(Failure::Invocation(err))
            }
        }
    }

    /// Invoke and convert the result, a wrong result shape counts as failure
    pub fn invoke_as<R, T>(&self, target: &T, args: &[Value]) -> Outcome<R>
    where
        R: FromValue,
        T: Reflect<Method = M> + ?Sized,
    {
        self.invoke(target, args)
            .and_then(|value| match R::from_value(value) {
                Ok(result) => Outcome::Success(result),
                Err(err) => {
                    self.log_failure(target, args, &err);
                    Outcome::Failed(Failure::Invocation(err))
                }
            })
    }

    fn check_arguments(&self, args: &[Value]) -> Result<(), InvokeError> {
        if args.len() != self.params.len() {
            return Err(InvokeError::illegal_argument(format!(
                "wrong number of arguments: expected {}, got {}",
                self.params.len(),
                args.len()
            )));
        }

        for (index, (param, arg)) in self.params.iter().zip(args).enumerate() {
            if !param.accepts(arg) {
                return Err(InvokeError::illegal_argument(format!(
                    "argument {} type mismatch: expected {}, got {}",
                    index,
                    param,
                    arg.type_name()
                )));
            }
        }
        Ok(())
    }

    fn log_failure<T>(&self, target: &T, args: &[Value], err: &InvokeError)
    where
        T: Reflect<Method = M> + ?Sized,
    {
        if self.log_arguments {
            error!(
                method = %self.name,
                target = %target.describe(),
                args = %render_arguments(args),
                error = %err,
                "Caught exception when invoking hidden method"
            );
        } else {
            error!(
                method = %self.name,
                target = %target.describe(),
                arg_count = args.len(),
                error = %err,
                "Caught exception when invoking hidden method"
            );
        }
    }
}

// ----------------------------------------------------------------------------
// Per-Call-Site Cache
// ----------------------------------------------------------------------------

/// Write-once cache of a [`BoundMethod`] for one call site
#[derive(Debug)]
pub struct MethodSlot<M> {
    name: &'static str,
    params: &'static [ValueType],
    cell: OnceLock<BoundMethod<M>>,
}

impl<M> MethodSlot<M> {
    pub const fn new(name: &'static str, params: &'static [ValueType]) -> Self {
        Self {
            name,
            params,
            cell: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The binding, if a call has already attempted it
    pub fn get(&self) -> Option<&BoundMethod<M>> {
        self.cell.get()
    }

    /// Bind against `target` on first use, reuse the result afterwards
    pub fn get_or_bind<T>(&self, target: &T, log_arguments: bool) -> &BoundMethod<M>
    where
        T: Reflect<Method = M> + ?Sized,
    {
        self.cell.get_or_init(|| {
            BoundMethod::bind(target, self.name, self.params).with_argument_logging(log_arguments)
        })
    }

    /// Bind if needed, then invoke and convert the result
    pub fn invoke_as<R, T>(&self, target: &T, args: &[Value], log_arguments: bool) -> Outcome<R>
    where
        R: FromValue,
        T: Reflect<Method = M> + ?Sized,
    {
        self.get_or_bind(target, log_arguments)
            .invoke_as(target, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Minimal target exposing a single `add(int, int)` method
    struct Adder {
        lookups: Cell<u32>,
    }

    impl Adder {
        fn new() -> Self {
            Self {
                lookups: Cell::new(0),
            }
        }
    }

    impl Reflect for Adder {
        type Method = ();

        fn describe(&self) -> String {
            "Adder@1".to_string()
        }

        fn lookup(&self, name: &str, params: &[ValueType]) -> Result<(), BindError> {
            self.lookups.set(self.lookups.get() + 1);
            if name == "add" && params == [ValueType::Int, ValueType::Int] {
                Ok(())
            } else {
                Err(BindError::MethodNotFound {
                    method: name.to_string(),
                    target: self.describe(),
                })
            }
        }

        fn call(&self, _method: &(), args: &[Value]) -> Result<Value, InvokeError> {
            match args {
                [Value::Int(a), Value::Int(b)] => a
                    .checked_add(*b)
                    .map(Value::Int)
                    .ok_or_else(|| InvokeError::target_exception("integer overflow")),
                _ => Err(InvokeError::illegal_argument("expected two ints")),
            }
        }
    }

    const ADD: &[ValueType] = &[ValueType::Int, ValueType::Int];

    #[test]
    fn test_bind_and_invoke() {
        let adder = Adder::new();
        let add = BoundMethod::bind(&adder, "add", ADD);
        assert!(add.is_valid());
        assert_eq!(
            add.invoke_as::<i32, _>(&adder, &[Value::Int(2), Value::Int(3)]),
            Outcome::Success(5)
        );
    }

    #[test]
    fn test_missing_method_is_binding_failure_every_time() {
        let adder = Adder::new();
        for _ in 0..2 {
            let missing = BoundMethod::bind(&adder, "subtract", ADD);
            assert!(!missing.is_valid());
            assert!(matches!(
                missing.binding_error(),
                Some(BindError::MethodNotFound { method, .. }) if method == "subtract"
            ));
        }
    }

    #[test]
    fn test_invalid_method_invocation_always_fails() {
        let adder = Adder::new();
        let missing = BoundMethod::bind(&adder, "subtract", ADD);
        for _ in 0..3 {
            let outcome = missing.invoke(&adder, &[Value::Int(1), Value::Int(1)]);
            assert!(outcome.is_binding_failure());
        }
        // The invalid binding is never retried
        assert_eq!(adder.lookups.get(), 1);
    }

    #[test]
    fn test_mismatched_argument_is_invocation_failure() {
        let adder = Adder::new();
        let add = BoundMethod::bind(&adder, "add", ADD);
        let outcome = add.invoke(&adder, &[Value::Int(1), Value::Str("2".into())]);
        assert!(matches!(
            outcome,
            Outcome::Failed(Failure::Invocation(InvokeError::IllegalArgument { .. }))
        ));

        let outcome = add.invoke(&adder, &[Value::Int(1)]);
        assert!(outcome.is_invocation_failure());

        // Null is never a valid primitive argument
        let outcome = add.invoke(&adder, &[Value::Null, Value::Int(1)]);
        assert!(outcome.is_invocation_failure());
    }

    #[test]
    fn test_exception_in_target_is_invocation_failure() {
        let adder = Adder::new();
        let add = BoundMethod::bind(&adder, "add", ADD);
        let outcome = add.invoke(&adder, &[Value::Int(i32::MAX), Value::Int(1)]);
        assert_eq!(
            outcome.failure(),
            Some(&Failure::Invocation(InvokeError::target_exception(
                "integer overflow"
            )))
        );
    }

    #[test]
    fn test_wrong_return_type_is_invocation_failure() {
        let adder = Adder::new();
        let add = BoundMethod::bind(&adder, "add", ADD);
        let outcome = add.invoke_as::<bool, _>(&adder, &[Value::Int(1), Value::Int(1)]);
        assert!(matches!(
            outcome,
            Outcome::Failed(Failure::Invocation(InvokeError::ReturnType { expected: "boolean", .. }))
        ));
    }

    #[test]
    fn test_slot_binds_once() {
        static SLOT: MethodSlot<()> = MethodSlot::new("add", ADD);
        let adder = Adder::new();
        for _ in 0..4 {
            let sum: Outcome<i32> = SLOT.invoke_as(&adder, &[Value::Int(1), Value::Int(1)], true);
            assert_eq!(sum, Outcome::Success(2));
        }
        assert_eq!(adder.lookups.get(), 1);
        assert!(SLOT.get().is_some_and(BoundMethod::is_valid));
    }

    #[test]
    fn test_render_arguments() {
        let args = [Value::Int(1), Value::Null, Value::Str("alias".into())];
        assert_eq!(render_arguments(&args), r#"[1, null, "alias"]"#);
        assert_eq!(render_arguments(&[]), "[]");
    }
}
