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

//! Defines the error taxonomy shared by the host object model, the backend
//! contract and every backend implementation.

use crate::backend::EntityKind;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A backend descriptor is malformed, or registering it into the host failed.
///
/// Fatal to the load of that backend only; other loaded backends are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The backend name is empty or contains characters outside `[a-z0-9_]`.
    #[error("invalid backend name '{0}'")]
    InvalidBackendName(String),
    /// One of the six entity kinds was never supplied.
    #[error("backend '{backend}' does not provide the {kind} entity kind")]
    MissingEntity {
        /// The backend being registered.
        backend: String,
        /// The missing entity kind.
        kind: EntityKind,
    },
    /// A type was supplied without a destructor hook.
    #[error("type '{type_name}' has no destructor hook")]
    MissingDestructor {
        /// The qualified type name.
        type_name: String,
    },
    /// An operation declares a dependency on an attribute its type does not have.
    #[error("operation '{operation}' of '{type_name}' references undeclared attribute '{attribute}'")]
    DanglingAttribute {
        /// The qualified type name.
        type_name: String,
        /// The operation holding the reference.
        operation: String,
        /// The attribute that could not be found.
        attribute: String,
    },
    /// Two members of the same table share a name.
    #[error("duplicate member '{member}' in '{owner}'")]
    DuplicateMember {
        /// The qualified name of the type or module owning the table.
        owner: String,
        /// The repeated member name.
        member: String,
    },
    /// The host namespace already holds a type with this qualified name.
    #[error("type '{0}' is already registered")]
    DuplicateType(String),
    /// The host namespace already holds a module with this path.
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),
    /// The lifecycle manager already owns a live module.
    #[error("backend module '{0}' is already loaded by this lifecycle manager")]
    AlreadyLoaded(String),
}

/// The host-visible error kinds a backend module exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorCategoryKind {
    /// Device creation or device-level failures.
    Device,
    /// Buffer failures (resource family).
    Buffer,
    /// 1D texture failures (resource family).
    Texture1D,
    /// 2D texture failures (resource family).
    Texture2D,
    /// 3D texture failures (resource family).
    Texture3D,
    /// Sampler failures.
    Sampler,
    /// Heap failures.
    Heap,
}

impl ErrorCategoryKind {
    /// Every category, in registration order.
    pub const ALL: [ErrorCategoryKind; 7] = [
        ErrorCategoryKind::Device,
        ErrorCategoryKind::Buffer,
        ErrorCategoryKind::Texture1D,
        ErrorCategoryKind::Texture2D,
        ErrorCategoryKind::Texture3D,
        ErrorCategoryKind::Sampler,
        ErrorCategoryKind::Heap,
    ];

    /// The unqualified name host code sees, e.g. `DeviceError`.
    pub const fn name(self) -> &'static str {
        match self {
            ErrorCategoryKind::Device => "DeviceError",
            ErrorCategoryKind::Buffer => "BufferError",
            ErrorCategoryKind::Texture1D => "Texture1DError",
            ErrorCategoryKind::Texture2D => "Texture2DError",
            ErrorCategoryKind::Texture3D => "Texture3DError",
            ErrorCategoryKind::Sampler => "SamplerError",
            ErrorCategoryKind::Heap => "HeapError",
        }
    }

    /// Returns `true` for the buffer and texture categories.
    pub const fn is_resource_family(self) -> bool {
        matches!(
            self,
            ErrorCategoryKind::Buffer
                | ErrorCategoryKind::Texture1D
                | ErrorCategoryKind::Texture2D
                | ErrorCategoryKind::Texture3D
        )
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// A signalable error kind scoped to one loaded module instance.
///
/// Two backends loaded side by side own two distinct `DeviceError` categories.
#[derive(Debug, PartialEq, Eq)]
pub struct ErrorCategory {
    kind: ErrorCategoryKind,
    qualified_name: String,
    module_instance: Uuid,
}

impl ErrorCategory {
    pub(crate) fn new(kind: ErrorCategoryKind, module_path: &str, module_instance: Uuid) -> Self {
        Self {
            kind,
            qualified_name: format!("{module_path}.{}", kind.name()),
            module_instance,
        }
    }

    /// The kind of this category.
    pub fn kind(&self) -> ErrorCategoryKind {
        self.kind
    }

    /// The qualified name, e.g. `prism.backends.software.DeviceError`.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The instance id of the module that owns this category.
    pub fn module_instance(&self) -> Uuid {
        self.module_instance
    }
}

/// A runtime failure raised by a backend operation under one of its categories.
#[derive(Debug, Clone)]
pub struct CategoryError {
    category: Arc<ErrorCategory>,
    message: String,
}

impl CategoryError {
    /// Creates an error under `category`.
    pub fn new(category: Arc<ErrorCategory>, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// The category the error was raised under.
    pub fn category(&self) -> &Arc<ErrorCategory> {
        &self.category
    }

    /// The kind of the category.
    pub fn kind(&self) -> ErrorCategoryKind {
        self.category.kind
    }

    /// The backend supplied message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this error was raised under exactly `category`.
    pub fn is(&self, category: &ErrorCategory) -> bool {
        *self.category == *category
    }
}

impl fmt::Display for CategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category.qualified_name, self.message)
    }
}

impl std::error::Error for CategoryError {}

/// An error surfaced to host code by a call into the object model.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    /// A resource list element is not an instance of the expected entity kind.
    #[error("expected a {expected} object, got '{found}'")]
    TypeMismatch {
        /// The expected entity kind name.
        expected: String,
        /// The type name of the offending value.
        found: String,
    },
    /// The type of a value could not be determined.
    #[error("cannot determine the type of {0}")]
    NotIntrospectable(String),
    /// A collection argument is not iterable.
    #[error("'{0}' object is not iterable")]
    NotIterable(String),
    /// A required argument was not supplied.
    #[error("missing required argument '{0}'")]
    MissingArgument(String),
    /// An argument has the wrong host type.
    #[error("argument '{name}' must be {expected}, got '{found}'")]
    ArgumentType {
        /// The argument name.
        name: String,
        /// What was expected.
        expected: &'static str,
        /// The type name of what was supplied.
        found: String,
    },
    /// An argument has the right type but an unusable value.
    #[error("invalid value for '{name}': {reason}")]
    InvalidValue {
        /// The argument name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// Attribute lookup failed.
    #[error("'{owner}' object has no attribute '{name}'")]
    NoSuchAttribute {
        /// The qualified type name.
        owner: String,
        /// The attribute requested.
        name: String,
    },
    /// Operation or function lookup failed.
    #[error("'{owner}' has no operation '{name}'")]
    NoSuchOperation {
        /// The qualified type or module name.
        owner: String,
        /// The operation requested.
        name: String,
    },
    /// The module has been torn down.
    #[error("module '{0}' has been unloaded")]
    ModuleUnloaded(String),
    /// A backend raised one of its module-scoped categories.
    #[error(transparent)]
    Category(#[from] CategoryError),
}

impl HostError {
    /// Returns the category error, if this is one.
    pub fn as_category(&self) -> Option<&CategoryError> {
        match self {
            HostError::Category(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` for validator failures (type mismatch, failed introspection).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            HostError::TypeMismatch { .. } | HostError::NotIntrospectable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn category_names_are_qualified_by_module() {
        let instance = Uuid::new_v4();
        let category = ErrorCategory::new(ErrorCategoryKind::Heap, "prism.backends.software", instance);
        assert_eq!(category.qualified_name(), "prism.backends.software.HeapError");
        assert_eq!(category.module_instance(), instance);
    }

    #[test]
    fn categories_from_distinct_instances_differ() {
        let a = ErrorCategory::new(ErrorCategoryKind::Device, "prism.backends.software", Uuid::new_v4());
        let b = ErrorCategory::new(ErrorCategoryKind::Device, "prism.backends.software", Uuid::new_v4());
        assert_ne!(a, b);

        let err = CategoryError::new(Arc::new(a), "device lost");
        assert!(!err.is(&b));
    }

    #[test]
    fn host_error_wraps_category_transparently() {
        let category = Arc::new(ErrorCategory::new(
            ErrorCategoryKind::Buffer,
            "prism.backends.null",
            Uuid::new_v4(),
        ));
        let err: HostError = CategoryError::new(category.clone(), "out of memory").into();
        assert_eq!(err.to_string(), "prism.backends.null.BufferError: out of memory");
        assert!(err.as_category().unwrap().is(&category));
        assert!(err.as_category().unwrap().kind().is_resource_family());
        assert!(err.source().is_none());
    }

    #[test]
    fn registration_error_display() {
        let err = RegistrationError::MissingEntity {
            backend: "software".to_string(),
            kind: EntityKind::Heap,
        };
        assert_eq!(err.to_string(), "backend 'software' does not provide the Heap entity kind");

        let err = RegistrationError::DanglingAttribute {
            type_name: "prism.backends.software.Resource".to_string(),
            operation: "upload".to_string(),
            attribute: "size".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'upload' of 'prism.backends.software.Resource' references undeclared attribute 'size'"
        );
    }

    #[test]
    fn validation_classification() {
        let err = HostError::TypeMismatch {
            expected: "Resource".to_string(),
            found: "int".to_string(),
        };
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "expected a Resource object, got 'int'");
        assert!(!HostError::NotIterable("int".to_string()).is_validation());
    }
}
