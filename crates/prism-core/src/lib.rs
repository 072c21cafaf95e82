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

//! # Prism Core
//!
//! Contracts shared by every Prism GPU backend: the enumeration model, the
//! host object model backends register their types into, the backend
//! descriptor, the lifecycle manager that loads it and the resource list
//! validator every binding operation goes through.

#![warn(missing_docs)]

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod host;
pub mod selection;

#[cfg(test)]
mod testing;

pub use backend::{BackendDescriptor, BackendLifecycle, BackendModule, EntityKind};
pub use config::RuntimeConfig;
pub use error::{HostError, RegistrationError};
pub use host::{Args, HostObject, HostRuntime, HostValue};
