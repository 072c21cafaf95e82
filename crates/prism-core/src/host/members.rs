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

//! Attribute, operation and function tables.
//!
//! These are the per-type member and method tables a backend hands to the
//! host. Entries are plain function pointers so a finished table is `Send`,
//! `Sync` and trivially shareable.

use crate::backend::BackendModule;
use crate::error::HostError;
use crate::host::{Args, HostObject, HostValue};
use std::fmt;
use std::sync::Arc;

/// Reads an attribute off an instance.
pub type Getter = fn(&HostObject) -> Result<HostValue, HostError>;

/// An operation bound to an instance.
pub type MethodFn = fn(&HostObject, &Args) -> Result<HostValue, HostError>;

/// A module-level function.
pub type FunctionFn = fn(&Arc<BackendModule>, &Args) -> Result<HostValue, HostError>;

/// Anything stored in a [`MemberTable`].
pub trait Member {
    /// The lookup key.
    fn name(&self) -> &str;
}

/// A read-only attribute.
#[derive(Clone)]
pub struct AttributeDef {
    /// The attribute name.
    pub name: &'static str,
    /// Documentation shown to host code.
    pub doc: &'static str,
    /// Reads the value.
    pub getter: Getter,
}

impl AttributeDef {
    /// Creates an attribute entry.
    pub const fn new(name: &'static str, doc: &'static str, getter: Getter) -> Self {
        Self { name, doc, getter }
    }
}

/// An operation on instances of a type.
#[derive(Clone)]
pub struct OperationDef {
    /// The operation name.
    pub name: &'static str,
    /// Documentation shown to host code.
    pub doc: &'static str,
    /// Attributes of the same type the operation depends on.
    pub uses: &'static [&'static str],
    /// The implementation.
    pub call: MethodFn,
}

impl OperationDef {
    /// Creates an operation entry with no attribute dependencies.
    pub const fn new(name: &'static str, doc: &'static str, call: MethodFn) -> Self {
        Self {
            name,
            doc,
            uses: &[],
            call,
        }
    }

    /// Declares the attributes the operation reads.
    pub const fn uses(mut self, attributes: &'static [&'static str]) -> Self {
        self.uses = attributes;
        self
    }
}

/// A function callable on the module itself.
#[derive(Clone)]
pub struct FunctionDef {
    /// The function name.
    pub name: &'static str,
    /// Documentation shown to host code.
    pub doc: &'static str,
    /// The implementation.
    pub call: FunctionFn,
}

impl FunctionDef {
    /// Creates a function entry.
    pub const fn new(name: &'static str, doc: &'static str, call: FunctionFn) -> Self {
        Self { name, doc, call }
    }
}

impl Member for AttributeDef {
    fn name(&self) -> &str {
        self.name
    }
}

impl Member for OperationDef {
    fn name(&self) -> &str {
        self.name
    }
}

impl Member for FunctionDef {
    fn name(&self) -> &str {
        self.name
    }
}

impl fmt::Debug for AttributeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDef").field("name", &self.name).finish_non_exhaustive()
    }
}

impl fmt::Debug for OperationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDef")
            .field("name", &self.name)
            .field("uses", &self.uses)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef").field("name", &self.name).finish_non_exhaustive()
    }
}

/// An ordered, name-addressed table of members.
#[derive(Debug, Clone)]
pub struct MemberTable<T> {
    entries: Vec<T>,
}

/// The attribute table of a type.
pub type AttributeTable = MemberTable<AttributeDef>;
/// The operation table of a type.
pub type OperationTable = MemberTable<OperationDef>;
/// The function table of a module.
pub type FunctionTable = MemberTable<FunctionDef>;

impl<T> Default for MemberTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Member> MemberTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, builder style.
    #[must_use]
    pub fn with(mut self, entry: T) -> Self {
        self.entries.push(entry);
        self
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// Returns `true` if an entry with `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the first name that appears more than once.
    pub fn first_duplicate(&self) -> Option<&str> {
        self.entries.iter().enumerate().find_map(|(i, entry)| {
            self.entries[..i]
                .iter()
                .any(|earlier| earlier.name() == entry.name())
                .then(|| entry.name())
        })
    }
}
