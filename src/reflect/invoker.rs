//! Dynamic Method Invoker
//!
//! Looks a method up by name on an instance's type and calls it with loosely
//! typed arguments. An exact parameter-type match wins; otherwise the first
//! overload with the name is used and the provider adapts the arguments
//! itself.

use thiserror::Error;

use super::component::{Instance, MethodInfo, TypeInfo};
use super::types::Value;

#[derive(Debug, Error)]
pub enum InvokeError {
    /// No method with that name exists on the type
    #[error("method {method} not found on {type_name}")]
    MethodNotFound { method: String, type_name: String },

    /// The provider raised an error or panicked
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

/// Find the overload of `name` to call with `args`
pub fn find_method<'a>(ty: &'a TypeInfo, name: &str, args: &[Value]) -> Option<&'a MethodInfo> {
    if let Some(exact) = ty.methods_named(name).find(|m| m.signature.matches(args)) {
        return Some(exact);
    }

    let mut named = ty.methods_named(name);
    let fallback = named.next()?;
    let others = named.count();
    if others > 0 {
        log::warn!(
            "{}.{}: no overload matches the argument types; using {} out of {} overloads",
            ty.full_name(),
            name,
            fallback.signature,
            others + 1
        );
    } else {
        log::debug!(
            "{}.{}: calling {} by name",
            ty.full_name(),
            name,
            fallback.signature
        );
    }
    Some(fallback)
}

/// Invoke `name` on `instance`
pub fn invoke(instance: &mut Instance, name: &str, args: &[Value]) -> Result<Value, InvokeError> {
    let ty = std::sync::Arc::clone(instance.type_info());
    let method = find_method(&ty, name, args).ok_or_else(|| InvokeError::MethodNotFound {
        method: name.to_string(),
        type_name: ty.full_name(),
    })?;

    log::trace!("invoking {}.{} with {:?}", ty.full_name(), method.signature, args);
    method
        .call(instance.state_mut(), args)
        .map_err(|e| InvokeError::Fault(e.context(format!("{}.{}", ty.full_name(), name))))
}
