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

//! The backend contract: descriptors, live modules, the lifecycle manager
//! and the resource list validator.

mod descriptor;
mod entity;
mod lifecycle;
mod module;
mod validator;

pub use self::descriptor::{module_path, BackendDescriptor, SUITE};
pub use self::entity::{EntityKind, EntityMap};
pub use self::lifecycle::{BackendLifecycle, LifecycleState};
pub use self::module::{BackendModule, ErrorCategories};
pub use self::validator::collect_native;
