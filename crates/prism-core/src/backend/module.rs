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

//! The live backend module.

use crate::backend::descriptor::{BackendState, DescriptorParts};
use crate::backend::entity::{EntityKind, EntityMap};
use crate::backend::validator;
use crate::error::{CategoryError, ErrorCategory, ErrorCategoryKind, HostError};
use crate::host::{Args, FunctionTable, HostObject, HostValue, Native, TypeHandle};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// The seven error categories of one module instance.
#[derive(Debug)]
pub struct ErrorCategories([Arc<ErrorCategory>; 7]);

impl ErrorCategories {
    pub(crate) fn new(module_path: &str, instance: Uuid) -> Self {
        Self(ErrorCategoryKind::ALL.map(|kind| Arc::new(ErrorCategory::new(kind, module_path, instance))))
    }

    /// The category of `kind`.
    pub fn get(&self, kind: ErrorCategoryKind) -> &Arc<ErrorCategory> {
        &self.0[kind.index()]
    }

    /// Iterates the categories in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ErrorCategory>> {
        self.0.iter()
    }
}

/// A registered backend: its finalized types, functions, error categories
/// and state.
///
/// Handed out by [`BackendLifecycle::load`](crate::backend::BackendLifecycle::load).
/// Every host object keeps its module alive, so types and categories stay
/// valid for as long as an instance exists, even after teardown.
pub struct BackendModule {
    name: String,
    path: String,
    instance: Uuid,
    functions: FunctionTable,
    types: EntityMap<TypeHandle>,
    errors: ErrorCategories,
    state: RwLock<Option<BackendState>>,
    live: AtomicBool,
}

impl BackendModule {
    pub(crate) fn new(parts: DescriptorParts, types: EntityMap<TypeHandle>, instance: Uuid) -> Self {
        let errors = ErrorCategories::new(&parts.path, instance);
        Self {
            name: parts.name,
            path: parts.path,
            instance,
            functions: parts.functions,
            types,
            errors,
            state: RwLock::new(parts.state),
            live: AtomicBool::new(true),
        }
    }

    /// The backend name, e.g. `software`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module path, e.g. `prism.backends.software`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Identifies this load of the module.
    pub fn instance(&self) -> Uuid {
        self.instance
    }

    /// The module-level function table.
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// The finalized type of `kind`.
    pub fn entity_type(&self, kind: EntityKind) -> &TypeHandle {
        &self.types[kind]
    }

    /// The module's error categories.
    pub fn errors(&self) -> &ErrorCategories {
        &self.errors
    }

    /// The category of `kind`.
    pub fn error(&self, kind: ErrorCategoryKind) -> &Arc<ErrorCategory> {
        self.errors.get(kind)
    }

    /// Builds an error raised under this module's `kind` category.
    pub fn raise(&self, kind: ErrorCategoryKind, message: impl Into<String>) -> HostError {
        CategoryError::new(Arc::clone(self.error(kind)), message).into()
    }

    /// Wraps `native` in a new instance of the `kind` type.
    pub fn instantiate<T: Any + Send + Sync>(
        self: &Arc<Self>,
        kind: EntityKind,
        native: T,
    ) -> Result<HostObject, HostError> {
        if !self.is_live() {
            return Err(HostError::ModuleUnloaded(self.path.clone()));
        }
        let ty = self.entity_type(kind);
        if !ty.accepts_native::<T>() {
            return Err(HostError::TypeMismatch {
                expected: ty.name().to_string(),
                found: std::any::type_name::<T>().to_string(),
            });
        }
        Ok(HostObject::new(Arc::clone(ty), Arc::clone(self), Box::new(native)))
    }

    /// Runs the resource list validator against this module's `kind` type.
    pub fn collect<T: Any>(
        &self,
        kind: EntityKind,
        values: Option<&HostValue>,
    ) -> Result<Vec<Native<T>>, HostError> {
        validator::collect_native(self.entity_type(kind), values)
    }

    /// Calls a module-level function.
    pub fn call(self: &Arc<Self>, name: &str, args: &Args) -> Result<HostValue, HostError> {
        if !self.is_live() {
            return Err(HostError::ModuleUnloaded(self.path.clone()));
        }
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| HostError::NoSuchOperation {
                owner: self.path.clone(),
                name: name.to_string(),
            })?;
        (function.call)(self, args)
    }

    /// The backend state, if one of type `T` was attached and the module is
    /// still live.
    pub fn state<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(state.as_ref()?).downcast::<T>().ok()
    }

    /// Returns `false` once the module has been torn down.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Marks the module unloaded and hands back its state for release.
    pub(crate) fn mark_unloaded(&self) -> Option<BackendState> {
        self.live.store(false, Ordering::Release);
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl fmt::Debug for BackendModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendModule")
            .field("path", &self.path)
            .field("instance", &self.instance)
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, Tracked};
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn categories_are_qualified_by_module_path() {
        let fixture = testing::load_fixture("categories");
        let names: Vec<&str> = fixture
            .module
            .errors()
            .iter()
            .map(|category| category.qualified_name())
            .collect();
        assert_eq!(
            names,
            [
                "prism.backends.categories.DeviceError",
                "prism.backends.categories.BufferError",
                "prism.backends.categories.Texture1DError",
                "prism.backends.categories.Texture2DError",
                "prism.backends.categories.Texture3DError",
                "prism.backends.categories.SamplerError",
                "prism.backends.categories.HeapError",
            ]
        );
        let err = fixture.module.raise(ErrorCategoryKind::Sampler, "bad filter");
        let category = err.as_category().unwrap();
        assert!(category.is(fixture.module.error(ErrorCategoryKind::Sampler)));
        assert_eq!(category.category().module_instance(), fixture.module.instance());
    }

    #[test]
    fn instantiate_checks_the_native_type() {
        let fixture = testing::load_fixture("natives");
        assert!(matches!(
            fixture.module.instantiate(EntityKind::Heap, 3u8),
            Err(HostError::TypeMismatch { .. })
        ));
        let object = fixture.instantiate(EntityKind::Heap, 3);
        assert!(Arc::ptr_eq(object.type_identity(), fixture.module.entity_type(EntityKind::Heap)));
        assert!(Arc::ptr_eq(object.module(), &fixture.module));
    }

    #[test]
    fn functions_and_state() {
        let fixture = testing::load_fixture("functions");
        let module = &fixture.module;
        assert_eq!(
            module.call("ping", &Args::new()).unwrap().as_str(),
            Some("pong")
        );
        assert_eq!(module.call("count", &Args::new()).unwrap().as_int(), Some(1));
        assert_eq!(module.call("count", &Args::new()).unwrap().as_int(), Some(2));
        assert_eq!(
            module.state::<AtomicUsize>().map(|c| c.load(Ordering::SeqCst)),
            Some(2)
        );
        assert!(module.state::<Tracked>().is_none());
        assert!(matches!(
            module.call("pong", &Args::new()),
            Err(HostError::NoSuchOperation { .. })
        ));
    }

    #[test]
    fn unloaded_module_rejects_calls() {
        let mut fixture = testing::load_fixture("unloaded");
        let object = fixture.instantiate(EntityKind::Device, 1);
        fixture.lifecycle.teardown();

        assert!(!fixture.module.is_live());
        assert!(fixture.module.state::<AtomicUsize>().is_none());
        assert!(matches!(
            fixture.module.call("ping", &Args::new()),
            Err(HostError::ModuleUnloaded(_))
        ));
        assert!(matches!(
            fixture.module.instantiate(EntityKind::Device, Tracked::detached(2)),
            Err(HostError::ModuleUnloaded(_))
        ));
        // Existing instances keep working.
        assert_eq!(object.getattr("id").unwrap().as_int(), Some(1));
    }
}
