//! Live instances of bound opaque types.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use super::registry::RuntimeType;
use crate::ffi::{Args, CallError, NativeHandle, Value};
use crate::header::decl::DESTRUCTOR_METHOD;

/// An object created by a bound constructor.
///
/// Methods are called with the native handle prepended as the first argument.
/// Dropping an instance calls its `destroy` method once, but only when that
/// method takes the handle alone; destructors with extra parameters must be
/// called explicitly.
pub struct Instance {
    ty: Arc<RuntimeType>,
    handle: NativeHandle,
    released: Cell<bool>,
}

impl Instance {
    pub(crate) fn new(ty: Arc<RuntimeType>, handle: NativeHandle) -> Self {
        Self {
            ty,
            handle,
            released: Cell::new(false),
        }
    }

    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    pub fn runtime_type(&self) -> &Arc<RuntimeType> {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    /// Call `method` on this instance.
    pub fn call(&self, method: &str, args: Args) -> Result<Value, CallError> {
        if self.released.get() {
            return Err(CallError::Released {
                type_name: self.ty.name().to_string(),
            });
        }
        let function = self.ty.method(method).ok_or_else(|| CallError::UnknownMethod {
            type_name: self.ty.name().to_string(),
            method: method.to_string(),
        })?;

        let result = function.call(&args.prepend(Value::Handle(self.handle)))?;
        if method == DESTRUCTOR_METHOD {
            self.released.set(true);
        }
        Ok(result)
    }

    /// Release the native object now.
    ///
    /// Returns `Ok(false)` when there is no single-argument `destroy` method;
    /// the object is then left alive. Releasing twice is a no-op.
    pub fn release(&self) -> Result<bool, CallError> {
        if self.released.get() {
            return Ok(true);
        }
        if !self.ty.auto_release() {
            return Ok(false);
        }
        self.call(DESTRUCTOR_METHOD, Args::new())?;
        Ok(true)
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        match self.release() {
            Ok(true) => log::trace!("released {} {}", self.ty.name(), self.handle),
            Ok(false) => {}
            Err(err) => log::warn!("failed to release {}: {}", self.ty.name(), err),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.ty.name())
            .field("handle", &self.handle)
            .field("released", &self.released.get())
            .finish()
    }
}
