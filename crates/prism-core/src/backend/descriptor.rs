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

//! The registration payload a backend hands to the lifecycle manager.

use crate::backend::entity::{EntityKind, EntityMap};
use crate::error::RegistrationError;
use crate::host::{FunctionTable, TypeSpec};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The suite every backend module lives under.
pub const SUITE: &str = "prism";

/// Backend state carried from the descriptor into the live module.
pub(crate) type BackendState = Arc<dyn Any + Send + Sync>;

/// Returns the module path of a backend, e.g. `prism.backends.software`.
pub fn module_path(backend: &str) -> String {
    format!("{SUITE}.backends.{backend}")
}

fn is_valid_backend_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// One backend's complete registration payload.
///
/// Built once by the backend's type-construction code, then consumed by
/// [`BackendLifecycle::load`](crate::backend::BackendLifecycle::load). Entity
/// specs are named `prism.backends.<backend>.<EntityKind>` as they are set.
pub struct BackendDescriptor {
    name: String,
    path: String,
    functions: FunctionTable,
    entities: EntityMap<Option<TypeSpec>>,
    state: Option<BackendState>,
}

/// A validated descriptor split into the pieces the lifecycle manager needs.
pub(crate) struct DescriptorParts {
    pub name: String,
    pub path: String,
    pub functions: FunctionTable,
    pub entities: EntityMap<Option<TypeSpec>>,
    pub state: Option<BackendState>,
}

impl BackendDescriptor {
    /// Starts a descriptor for `name` with its module-level functions.
    ///
    /// The name must be non-empty and use only `[a-z0-9_]`.
    pub fn new(name: &str, functions: FunctionTable) -> Result<Self, RegistrationError> {
        if !is_valid_backend_name(name) {
            return Err(RegistrationError::InvalidBackendName(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            path: module_path(name),
            functions,
            entities: EntityMap::default(),
            state: None,
        })
    }

    /// The backend name, e.g. `software`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module path, e.g. `prism.backends.software`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The qualified type name of `kind` in this backend.
    pub fn qualified_name(&self, kind: EntityKind) -> String {
        format!("{}.{}", self.path, kind.name())
    }

    /// The module-level function table.
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Supplies the type spec for `kind`, replacing any earlier one.
    pub fn set_entity(&mut self, kind: EntityKind, spec: TypeSpec) {
        let spec = spec.named(kind.name(), self.qualified_name(kind));
        self.entities[kind] = Some(spec);
    }

    /// Builder form of [`set_entity`](Self::set_entity).
    #[must_use]
    pub fn with_entity(mut self, kind: EntityKind, spec: TypeSpec) -> Self {
        self.set_entity(kind, spec);
        self
    }

    /// The spec supplied for `kind`, if any.
    pub fn entity(&self, kind: EntityKind) -> Option<&TypeSpec> {
        self.entities[kind].as_ref()
    }

    /// Attaches backend state the live module will own.
    #[must_use]
    pub fn with_state<T: Any + Send + Sync>(mut self, state: T) -> Self {
        self.state = Some(Arc::new(state));
        self
    }

    /// Checks the whole descriptor.
    ///
    /// Every entity kind must be present and individually valid, and module
    /// function names must be unique.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        for kind in EntityKind::ALL {
            let spec = self.entities[kind]
                .as_ref()
                .ok_or_else(|| RegistrationError::MissingEntity {
                    backend: self.name.clone(),
                    kind,
                })?;
            spec.validate()?;
        }
        if let Some(function) = self.functions.first_duplicate() {
            return Err(RegistrationError::DuplicateMember {
                owner: self.path.clone(),
                member: function.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> DescriptorParts {
        DescriptorParts {
            name: self.name,
            path: self.path,
            functions: self.functions,
            entities: self.entities,
            state: self.state,
        }
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let supplied: Vec<EntityKind> = self
            .entities
            .iter()
            .filter(|(_, spec)| spec.is_some())
            .map(|(kind, _)| kind)
            .collect();
        f.debug_struct("BackendDescriptor")
            .field("path", &self.path)
            .field("functions", &self.functions)
            .field("entities", &supplied)
            .field("has_state", &self.state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FunctionDef, OperationDef};
    use crate::testing;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn descriptor_is_shareable() {
        assert_send_sync::<BackendDescriptor>();
    }

    #[test]
    fn backend_names_are_restricted() {
        for name in ["", "Software", "soft-ware", "soft.ware", "sóft"] {
            assert_eq!(
                BackendDescriptor::new(name, FunctionTable::new()).unwrap_err(),
                RegistrationError::InvalidBackendName(name.to_string())
            );
        }
        assert!(BackendDescriptor::new("d3d12", FunctionTable::new()).is_ok());
        assert!(BackendDescriptor::new("metal_2", FunctionTable::new()).is_ok());
    }

    #[test]
    fn entity_specs_are_namespaced() {
        let descriptor = testing::descriptor("vulkan");
        assert_eq!(descriptor.path(), "prism.backends.vulkan");
        for kind in EntityKind::ALL {
            assert_eq!(
                descriptor.entity(kind).unwrap().qualified_name(),
                format!("prism.backends.vulkan.{kind}")
            );
        }
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn every_kind_is_required() {
        for missing in EntityKind::ALL {
            let mut descriptor = BackendDescriptor::new("partial", FunctionTable::new()).unwrap();
            for kind in EntityKind::ALL.into_iter().filter(|kind| *kind != missing) {
                descriptor.set_entity(kind, testing::entity_spec(kind));
            }
            assert_eq!(
                descriptor.validate(),
                Err(RegistrationError::MissingEntity {
                    backend: "partial".to_string(),
                    kind: missing,
                })
            );
        }
    }

    #[test]
    fn dangling_attribute_fails_validation() {
        fn noop(
            _: &crate::host::HostObject,
            _: &crate::host::Args,
        ) -> Result<crate::host::HostValue, crate::error::HostError> {
            Ok(crate::host::HostValue::None)
        }

        let spec = testing::entity_spec(EntityKind::Heap)
            .operation(OperationDef::new("resize", "", noop).uses(&["capacity"]));
        let descriptor = testing::descriptor("broken").with_entity(EntityKind::Heap, spec);
        assert_eq!(
            descriptor.validate(),
            Err(RegistrationError::DanglingAttribute {
                type_name: "prism.backends.broken.Heap".to_string(),
                operation: "resize".to_string(),
                attribute: "capacity".to_string(),
            })
        );
    }

    #[test]
    fn duplicate_module_functions_fail_validation() {
        let functions = FunctionTable::new()
            .with(FunctionDef::new("ping", "", testing::ping))
            .with(FunctionDef::new("ping", "", testing::ping));
        let mut descriptor = BackendDescriptor::new("twice", functions).unwrap();
        for kind in EntityKind::ALL {
            descriptor.set_entity(kind, testing::entity_spec(kind));
        }
        assert_eq!(
            descriptor.validate(),
            Err(RegistrationError::DuplicateMember {
                owner: "prism.backends.twice".to_string(),
                member: "ping".to_string(),
            })
        );
    }
}
