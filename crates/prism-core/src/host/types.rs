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

//! Type identities: the host-side record of a registered type.

use crate::error::RegistrationError;
use crate::host::members::{AttributeDef, AttributeTable, OperationDef, OperationTable};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A backend-native object, exclusively owned by the host object wrapping it.
pub type NativeBox = Box<dyn Any + Send + Sync>;

/// Releases a native object. Called exactly once, when the last reference to
/// the wrapping host object drops.
pub type Destructor = fn(NativeBox);

/// A shared, immutable type identity.
pub type TypeHandle = Arc<TypeIdentity>;

/// Default-behaviour flags of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeFlags {
    bits: u32,
}

impl TypeFlags {
    /// No flags.
    pub const NONE: Self = Self { bits: 0 };
    /// Instances get the host's default attribute and operation lookup.
    pub const DEFAULT: Self = Self { bits: 1 << 0 };
    /// The type may be used as a base for other types.
    pub const BASETYPE: Self = Self { bits: 1 << 1 };
    /// The type has been finalized and may be instantiated.
    pub const READY: Self = Self { bits: 1 << 2 };
    /// The type cannot be instantiated directly.
    pub const ABSTRACT: Self = Self { bits: 1 << 3 };

    /// Flags a derived type picks up from its base.
    const INHERITED: Self = Self::DEFAULT;

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Keeps only the flags present in both sets.
    pub const fn intersection(self, other: Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    /// Checks whether every flag of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for TypeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for TypeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A finalized type registered (or registrable) with the host.
pub struct TypeIdentity {
    name: String,
    qualified_name: String,
    instance_size: usize,
    native_type: Option<TypeId>,
    destructor: Destructor,
    doc: String,
    flags: TypeFlags,
    base: Option<TypeHandle>,
    attributes: AttributeTable,
    operations: OperationTable,
}

impl TypeIdentity {
    /// Creates the root `object` type every other type derives from.
    pub fn root() -> TypeHandle {
        Arc::new(Self {
            name: "object".to_string(),
            qualified_name: "object".to_string(),
            instance_size: 0,
            native_type: None,
            destructor: drop_native,
            doc: "The base of every host type.".to_string(),
            flags: TypeFlags::DEFAULT | TypeFlags::BASETYPE | TypeFlags::READY | TypeFlags::ABSTRACT,
            base: None,
            attributes: AttributeTable::new(),
            operations: OperationTable::new(),
        })
    }

    /// The unqualified name, e.g. `Resource`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The qualified name, e.g. `prism.backends.software.Resource`.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The size of the native instance layout.
    pub fn instance_size(&self) -> usize {
        self.instance_size
    }

    /// The documentation string.
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// The resolved flags.
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// The base type, if any.
    pub fn base(&self) -> Option<&TypeHandle> {
        self.base.as_ref()
    }

    /// Attributes declared directly on this type.
    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// Operations declared directly on this type.
    pub fn operations(&self) -> &OperationTable {
        &self.operations
    }

    /// This type followed by its bases, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &TypeIdentity> {
        std::iter::successors(Some(self), |ty| ty.base.as_deref())
    }

    /// Returns `true` if `self` is `other` or derives from it.
    pub fn is_subtype_of(&self, other: &TypeIdentity) -> bool {
        self.ancestors().any(|ty| std::ptr::eq(ty, other))
    }

    /// Resolves an attribute through the base chain.
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.ancestors().find_map(|ty| ty.attributes.get(name))
    }

    /// Resolves an operation through the base chain.
    pub fn find_operation(&self, name: &str) -> Option<&OperationDef> {
        self.ancestors().find_map(|ty| ty.operations.get(name))
    }

    /// Returns `true` if instances may wrap a native value of type `T`.
    pub(crate) fn accepts_native<T: Any>(&self) -> bool {
        self.native_type.map_or(true, |id| id == TypeId::of::<T>())
    }

    pub(crate) fn release(&self, native: NativeBox) {
        (self.destructor)(native);
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeIdentity")
            .field("qualified_name", &self.qualified_name)
            .field("instance_size", &self.instance_size)
            .field("flags", &self.flags)
            .field("base", &self.base.as_ref().map(|b| b.qualified_name()))
            .finish_non_exhaustive()
    }
}

fn drop_native(native: NativeBox) {
    drop(native);
}

/// A type record under construction.
///
/// Every entity kind a backend supplies is one of these: layout size,
/// destructor hook, doc string, flags and the two member tables.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    name: String,
    qualified_name: String,
    instance_size: usize,
    native_type: Option<TypeId>,
    destructor: Option<Destructor>,
    doc: String,
    flags: TypeFlags,
    attributes: AttributeTable,
    operations: OperationTable,
}

impl TypeSpec {
    /// Starts a spec for instances wrapping native values of type `T`.
    pub fn of<T: Any + Send + Sync>(doc: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            qualified_name: String::new(),
            instance_size: std::mem::size_of::<T>(),
            native_type: Some(TypeId::of::<T>()),
            destructor: None,
            doc: doc.into(),
            flags: TypeFlags::DEFAULT,
            attributes: AttributeTable::new(),
            operations: OperationTable::new(),
        }
    }

    /// Sets the unqualified and qualified names.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        self.name = name.into();
        self.qualified_name = qualified_name.into();
        self
    }

    /// Sets the destructor hook.
    #[must_use]
    pub fn destructor(mut self, destructor: Destructor) -> Self {
        self.destructor = Some(destructor);
        self
    }

    /// Adds default-behaviour flags.
    #[must_use]
    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Appends an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: AttributeDef) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Appends an operation.
    #[must_use]
    pub fn operation(mut self, operation: OperationDef) -> Self {
        self.operations.push(operation);
        self
    }

    /// The qualified name assigned so far.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Returns `true` if a destructor hook has been set.
    pub fn has_destructor(&self) -> bool {
        self.destructor.is_some()
    }

    /// Checks the spec for contract violations.
    ///
    /// A missing destructor, a duplicate member name or an operation that
    /// depends on an attribute absent from this spec's own attribute table
    /// are all rejected.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.destructor.is_none() {
            return Err(RegistrationError::MissingDestructor {
                type_name: self.qualified_name.clone(),
            });
        }
        let duplicate = self
            .attributes
            .first_duplicate()
            .or_else(|| self.operations.first_duplicate());
        if let Some(member) = duplicate {
            return Err(RegistrationError::DuplicateMember {
                owner: self.qualified_name.clone(),
                member: member.to_string(),
            });
        }
        for operation in self.operations.iter() {
            if let Some(missing) = operation
                .uses
                .iter()
                .find(|attribute| !self.attributes.contains(attribute))
            {
                return Err(RegistrationError::DanglingAttribute {
                    type_name: self.qualified_name.clone(),
                    operation: operation.name.to_string(),
                    attribute: missing.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validates the spec and turns it into an immutable identity deriving
    /// from `base`.
    pub fn finalize(self, base: &TypeHandle) -> Result<TypeHandle, RegistrationError> {
        self.validate()?;
        let destructor = self
            .destructor
            .ok_or_else(|| RegistrationError::MissingDestructor {
                type_name: self.qualified_name.clone(),
            })?;
        let flags = self
            .flags
            .union(base.flags.intersection(TypeFlags::INHERITED))
            .union(TypeFlags::READY);
        Ok(Arc::new(TypeIdentity {
            name: self.name,
            qualified_name: self.qualified_name,
            instance_size: self.instance_size,
            native_type: self.native_type,
            destructor,
            doc: self.doc,
            flags,
            base: Some(Arc::clone(base)),
            attributes: self.attributes,
            operations: self.operations,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::{Args, HostObject, HostValue};

    struct Native {
        _value: u64,
    }

    fn release_native(native: NativeBox) {
        drop(native);
    }

    fn size(_: &HostObject) -> Result<HostValue, HostError> {
        Ok(HostValue::Int(4))
    }

    fn noop(_: &HostObject, _: &Args) -> Result<HostValue, HostError> {
        Ok(HostValue::None)
    }

    fn spec(name: &str) -> TypeSpec {
        TypeSpec::of::<Native>("test type")
            .named(name, format!("test.{name}"))
            .destructor(release_native)
    }

    #[test]
    fn finalize_resolves_flags_and_base() {
        let root = TypeIdentity::root();
        let ty = spec("Thing").finalize(&root).unwrap();
        assert!(ty.flags().contains(TypeFlags::READY));
        assert!(ty.flags().contains(TypeFlags::DEFAULT));
        assert!(!ty.flags().contains(TypeFlags::ABSTRACT));
        assert_eq!(ty.instance_size(), std::mem::size_of::<Native>());
        assert!(ty.is_subtype_of(&root));
        assert!(!root.is_subtype_of(&ty));
    }

    #[test]
    fn subtype_check_is_polymorphic_not_nominal() {
        let root = TypeIdentity::root();
        let base = spec("Resource")
            .flags(TypeFlags::BASETYPE)
            .attribute(AttributeDef::new("size", "", size))
            .finalize(&root)
            .unwrap();
        let derived = spec("Buffer").finalize(&base).unwrap();
        let sibling = spec("Resource").finalize(&root).unwrap();

        assert!(derived.is_subtype_of(&base));
        assert!(!sibling.is_subtype_of(&base), "same name, different identity");
        assert!(derived.find_attribute("size").is_some(), "inherited through the base chain");
        assert_eq!(derived.ancestors().count(), 3);
    }

    #[test]
    fn missing_destructor_is_rejected() {
        let root = TypeIdentity::root();
        let err = TypeSpec::of::<Native>("")
            .named("Device", "test.Device")
            .finalize(&root)
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::MissingDestructor {
                type_name: "test.Device".to_string()
            }
        );
    }

    #[test]
    fn dangling_attribute_is_rejected() {
        let err = spec("Heap")
            .operation(OperationDef::new("grow", "", noop).uses(&["size"]))
            .validate()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DanglingAttribute { ref attribute, .. } if attribute == "size"));
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let err = spec("Heap")
            .operation(OperationDef::new("grow", "", noop))
            .operation(OperationDef::new("grow", "", noop))
            .validate()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateMember { ref member, .. } if member == "grow"));
    }

    #[test]
    fn native_type_is_tracked() {
        let root = TypeIdentity::root();
        let ty = spec("Thing").finalize(&root).unwrap();
        assert!(ty.accepts_native::<Native>());
        assert!(!ty.accepts_native::<u32>());
    }
}
