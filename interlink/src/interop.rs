//!
//! Cross-runtime call placeholders.
//!
//! `ForeignRuntime` is the seam a real foreign-call mechanism (JNI, a C ABI
//! shim, an embedded interpreter) would plug into. The only implementation
//! shipped is `UnimplementedRuntime`, which refuses every call with
//! `NotImplemented` and reports the runtime and symbol that were asked for.
//!

use crate::driver::Value;
use crate::error::{InterlinkError, Result};

pub const MOJO_RUNTIME: &str = "mojo";
pub const JAVA_RUNTIME: &str = "java";
pub const SWIFT_RUNTIME: &str = "swift";

pub trait ForeignRuntime: Send + Sync {
    fn invoke(&self, runtime: &str, symbol: &str, args: &[Value]) -> Result<Value>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedRuntime;

impl ForeignRuntime for UnimplementedRuntime {
    fn invoke(&self, runtime: &str, symbol: &str, args: &[Value]) -> Result<Value> {
        tracing::debug!(runtime, symbol, args = args.len(), "foreign call refused");
        Err(InterlinkError::NotImplemented {
            runtime: runtime.to_string(),
            symbol: symbol.to_string(),
        })
    }
}

pub fn call_mojo_function(function: &str, args: &[Value]) -> Result<Value> {
    UnimplementedRuntime.invoke(MOJO_RUNTIME, function, args)
}

pub fn call_java_method(class: &str, method: &str, args: &[Value]) -> Result<Value> {
    UnimplementedRuntime.invoke(JAVA_RUNTIME, &format!("{}.{}", class, method), args)
}

pub fn call_swift_function(function: &str, args: &[Value]) -> Result<Value> {
    UnimplementedRuntime.invoke(SWIFT_RUNTIME, function, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_always_fails() {
        let runtime: &dyn ForeignRuntime = &UnimplementedRuntime;
        for args in [vec![], vec![Value::Integer(1), Value::from("x")]] {
            let err = runtime.invoke("other-runtime", "anyFunc", &args).unwrap_err();
            assert!(matches!(
                err,
                InterlinkError::NotImplemented { ref runtime, ref symbol }
                    if runtime == "other-runtime" && symbol == "anyFunc"
            ));
        }
    }

    #[test]
    fn test_named_entry_points() {
        assert!(matches!(
            call_mojo_function("predict", &[]),
            Err(InterlinkError::NotImplemented { ref runtime, .. }) if runtime == "mojo"
        ));
        assert!(matches!(
            call_java_method("UserService", "getUser", &[Value::Integer(1)]),
            Err(InterlinkError::NotImplemented { ref symbol, .. }) if symbol == "UserService.getUser"
        ));
        assert!(matches!(
            call_swift_function("render", &[]),
            Err(InterlinkError::NotImplemented { ref runtime, .. }) if runtime == "swift"
        ));
    }
}
