// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host objects: reference-counted handles wrapping backend-native objects.

use crate::backend::BackendModule;
use crate::error::HostError;
use crate::host::types::{NativeBox, TypeHandle};
use crate::host::{Args, HostValue};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

struct ObjectInner {
    ty: TypeHandle,
    module: Arc<BackendModule>,
    native: Option<NativeBox>,
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        // Native first, then the host instance.
        if let Some(native) = self.native.take() {
            log::trace!("Releasing native '{}'", self.ty.qualified_name());
            self.ty.release(native);
        }
    }
}

/// An instance of a registered backend type.
///
/// Clones share one native object; the type's destructor hook runs exactly
/// once, when the last clone drops, on whichever thread drops it.
#[derive(Clone)]
pub struct HostObject {
    inner: Arc<ObjectInner>,
}

impl HostObject {
    pub(crate) fn new(ty: TypeHandle, module: Arc<BackendModule>, native: NativeBox) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                ty,
                module,
                native: Some(native),
            }),
        }
    }

    /// The type this object is an instance of.
    pub fn type_identity(&self) -> &TypeHandle {
        &self.inner.ty
    }

    /// The module whose type this object is an instance of.
    pub fn module(&self) -> &Arc<BackendModule> {
        &self.inner.module
    }

    /// Borrows the native object as `T`.
    pub fn native<T: Any>(&self) -> Option<&T> {
        self.inner.native.as_deref()?.downcast_ref::<T>()
    }

    /// Borrows the native object as `T`, or reports what was expected.
    pub fn downcast<T: Any>(&self) -> Result<&T, HostError> {
        self.native::<T>().ok_or_else(|| HostError::TypeMismatch {
            expected: self.inner.ty.name().to_string(),
            found: self.inner.ty.qualified_name().to_string(),
        })
    }

    /// The number of live references to this object.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Returns `true` if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Reads an attribute.
    pub fn getattr(&self, name: &str) -> Result<HostValue, HostError> {
        let attribute = self
            .inner
            .ty
            .find_attribute(name)
            .ok_or_else(|| HostError::NoSuchAttribute {
                owner: self.inner.ty.qualified_name().to_string(),
                name: name.to_string(),
            })?;
        (attribute.getter)(self)
    }

    /// Invokes an operation.
    pub fn call(&self, name: &str, args: &Args) -> Result<HostValue, HostError> {
        let operation = self
            .inner
            .ty
            .find_operation(name)
            .ok_or_else(|| HostError::NoSuchOperation {
                owner: self.inner.ty.qualified_name().to_string(),
                name: name.to_string(),
            })?;
        (operation.call)(self, args)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} object at {:p}>",
            self.inner.ty.qualified_name(),
            Arc::as_ptr(&self.inner)
        )
    }
}

/// A host object whose native value is statically known to be a `T`.
///
/// Holding one keeps the object alive, so the borrowed native pointer can
/// never dangle.
pub struct Native<T> {
    object: HostObject,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> Native<T> {
    /// Wraps `object` if its native value is a `T`.
    pub fn new(object: HostObject) -> Option<Self> {
        object.native::<T>()?;
        Some(Self {
            object,
            _marker: PhantomData,
        })
    }

    /// The wrapping host object.
    pub fn object(&self) -> &HostObject {
        &self.object
    }

    /// Releases the typed view, keeping the object.
    pub fn into_object(self) -> HostObject {
        self.object
    }
}

impl<T: Any> Deref for Native<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.object.native::<T>() {
            Some(native) => native,
            None => unreachable!("native type is checked when a Native<T> is built"),
        }
    }
}

impl<T> Clone for Native<T> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Native<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Native").field(&self.object).finish()
    }
}
