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

//! The host namespace: where types, modules and error categories live.

use crate::backend::BackendModule;
use crate::error::{ErrorCategory, RegistrationError};
use crate::host::types::{TypeHandle, TypeIdentity};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Namespace {
    types: HashMap<String, TypeHandle>,
    modules: HashMap<String, Arc<BackendModule>>,
    categories: HashMap<String, Arc<ErrorCategory>>,
}

/// The host runtime's object namespace.
///
/// Shared by every backend loaded into the same host. Names are opaque keys:
/// nothing here parses them.
pub struct HostRuntime {
    root: TypeHandle,
    namespace: RwLock<Namespace>,
}

impl HostRuntime {
    /// Creates an empty namespace holding only the root type.
    pub fn new() -> Self {
        Self {
            root: TypeIdentity::root(),
            namespace: RwLock::new(Namespace::default()),
        }
    }

    /// The type every registered type derives from.
    pub fn root_type(&self) -> &TypeHandle {
        &self.root
    }

    fn read(&self) -> RwLockReadGuard<'_, Namespace> {
        self.namespace.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Namespace> {
        self.namespace.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a finalized type under its qualified name.
    pub fn register_type(&self, ty: TypeHandle) -> Result<(), RegistrationError> {
        let mut namespace = self.write();
        let name = ty.qualified_name().to_string();
        if namespace.types.contains_key(&name) {
            return Err(RegistrationError::DuplicateType(name));
        }
        log::debug!("Registered type '{name}'");
        namespace.types.insert(name, ty);
        Ok(())
    }

    /// Removes `ty` from the namespace.
    ///
    /// Only the exact identity is removed; an unrelated type that happens to
    /// share the name is left alone. Returns `true` if something was removed.
    pub fn unregister_type(&self, ty: &TypeHandle) -> bool {
        let mut namespace = self.write();
        let name = ty.qualified_name();
        match namespace.types.get(name) {
            Some(existing) if Arc::ptr_eq(existing, ty) => {
                namespace.types.remove(name);
                log::debug!("Unregistered type '{name}'");
                true
            }
            _ => false,
        }
    }

    /// Looks up a type by qualified name.
    pub fn lookup_type(&self, qualified_name: &str) -> Option<TypeHandle> {
        self.read().types.get(qualified_name).cloned()
    }

    /// Returns `true` if a type with this qualified name is registered.
    pub fn contains_type(&self, qualified_name: &str) -> bool {
        self.read().types.contains_key(qualified_name)
    }

    /// Registers a module and its error categories.
    ///
    /// Either everything is registered or nothing is.
    pub fn register_module(&self, module: Arc<BackendModule>) -> Result<(), RegistrationError> {
        let mut namespace = self.write();
        let path = module.path().to_string();
        if namespace.modules.contains_key(&path) {
            return Err(RegistrationError::DuplicateModule(path));
        }
        if let Some(clash) = module
            .errors()
            .iter()
            .find(|category| namespace.categories.contains_key(category.qualified_name()))
        {
            return Err(RegistrationError::DuplicateType(
                clash.qualified_name().to_string(),
            ));
        }
        for category in module.errors().iter() {
            namespace
                .categories
                .insert(category.qualified_name().to_string(), Arc::clone(category));
        }
        log::debug!("Registered module '{path}'");
        namespace.modules.insert(path, module);
        Ok(())
    }

    /// Removes a module and its error categories. Returns the module if it
    /// was registered.
    pub fn unregister_module(&self, path: &str) -> Option<Arc<BackendModule>> {
        let mut namespace = self.write();
        let module = namespace.modules.remove(path)?;
        for category in module.errors().iter() {
            namespace.categories.remove(category.qualified_name());
        }
        log::debug!("Unregistered module '{path}'");
        Some(module)
    }

    /// Looks up a live module by path.
    pub fn module(&self, path: &str) -> Option<Arc<BackendModule>> {
        self.read().modules.get(path).cloned()
    }

    /// Looks up an error category by qualified name.
    pub fn error_category(&self, qualified_name: &str) -> Option<Arc<ErrorCategory>> {
        self.read().categories.get(qualified_name).cloned()
    }

    /// Every registered type name, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every registered module path, sorted.
    pub fn module_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.read().modules.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HostRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let namespace = self.read();
        f.debug_struct("HostRuntime")
            .field("types", &namespace.types.len())
            .field("modules", &namespace.modules.len())
            .field("categories", &namespace.categories.len())
            .finish()
    }
}
