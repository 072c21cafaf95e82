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

//! # Prism Infra
//!
//! Concrete Prism backends and the runtime that loads them.
//!
//! - [`software`]: a CPU emulation of the whole contract.
//! - [`null`]: registers everything, supports nothing.
//! - [`Runtime`]: picks a backend from [`RuntimeConfig`](prism_core::RuntimeConfig),
//!   loads it lazily and selects a device.

#![warn(missing_docs)]

#[cfg(feature = "null")]
pub mod null;
pub mod runtime;
#[cfg(feature = "software")]
pub mod software;

pub use runtime::{available_backends, descriptor_for, Runtime};
