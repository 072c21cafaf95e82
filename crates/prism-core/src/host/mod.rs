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

//! The host runtime's object model.
//!
//! Backends never see the host's internals directly: they describe their types
//! with [`TypeSpec`]s and member tables, receive [`HostValue`]s and [`Args`]
//! from callers, and hand back [`HostObject`]s wrapping their native objects.

mod args;
mod members;
mod object;
mod runtime;
mod types;
mod value;

pub use self::args::{Args, FromHostValue};
pub use self::members::{
    AttributeDef, AttributeTable, FunctionDef, FunctionFn, FunctionTable, Getter, Member,
    MemberTable, MethodFn, OperationDef, OperationTable,
};
pub use self::object::{HostObject, Native};
pub use self::runtime::HostRuntime;
pub use self::types::{Destructor, NativeBox, TypeFlags, TypeHandle, TypeIdentity, TypeSpec};
pub use self::value::{HostIter, HostValue};
