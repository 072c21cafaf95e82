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

//! A CPU emulation of the full backend contract.
//!
//! Memory is plain host memory, textures are linear with 256-byte aligned
//! rows, and compute dispatches are recorded rather than executed. It is the
//! reference backend the contract is tested against, and a fallback when no
//! GPU backend is available.

mod compute;
mod device;
mod heap;
mod resource;
mod sampler;
mod swapchain;

use prism_core::api::{ShaderBinaryKind, UnknownCode};
use prism_core::backend::{BackendDescriptor, BackendModule, EntityKind};
use prism_core::error::{ErrorCategoryKind, HostError, RegistrationError};
use prism_core::host::{Args, FunctionDef, FunctionTable, HostValue, Native, NativeBox};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use self::compute::SoftwareCompute;
pub use self::device::{AdapterInfo, SoftwareDevice};
pub use self::heap::SoftwareHeap;
pub use self::resource::{Dimension, SoftwareResource, ROW_PITCH_ALIGNMENT};
pub use self::sampler::SoftwareSampler;
pub use self::swapchain::SoftwareSwapchain;

/// The backend name, as used in configuration.
pub const NAME: &str = "software";

/// Upper bound on any single allocation, heaps included.
pub const MAX_ALLOCATION: u64 = 1 << 32;

/// Backing store shared by a heap and everything placed in it.
pub(crate) type Memory = Arc<Mutex<Vec<u8>>>;

/// Module state: the debug switch and the messages collected while it is on.
#[derive(Debug, Default)]
pub(crate) struct SoftwareState {
    debug: AtomicBool,
    messages: Mutex<Vec<String>>,
}

/// Builds the software backend's descriptor.
pub fn descriptor() -> Result<BackendDescriptor, RegistrationError> {
    let functions = FunctionTable::new()
        .with(FunctionDef::new(
            "get_discovered_devices",
            "Returns the list of devices this backend can drive.",
            get_discovered_devices,
        ))
        .with(FunctionDef::new(
            "get_shader_binary_type",
            "Returns the shader binary kind compute shaders must be supplied in.",
            get_shader_binary_type,
        ))
        .with(FunctionDef::new(
            "enable_debug",
            "Starts collecting debug messages.",
            enable_debug,
        ));

    Ok(BackendDescriptor::new(NAME, functions)?
        .with_entity(EntityKind::Device, device::spec())
        .with_entity(EntityKind::Resource, resource::spec())
        .with_entity(EntityKind::Swapchain, swapchain::spec())
        .with_entity(EntityKind::Compute, compute::spec())
        .with_entity(EntityKind::Sampler, sampler::spec())
        .with_entity(EntityKind::Heap, heap::spec())
        .with_state(SoftwareState::default()))
}

fn get_discovered_devices(module: &Arc<BackendModule>, _args: &Args) -> Result<HostValue, HostError> {
    let device = module.instantiate(EntityKind::Device, SoftwareDevice::new())?;
    Ok(HostValue::list([device]))
}

fn get_shader_binary_type(_module: &Arc<BackendModule>, _args: &Args) -> Result<HostValue, HostError> {
    Ok(HostValue::from(ShaderBinaryKind::Spirv.code()))
}

fn enable_debug(module: &Arc<BackendModule>, _args: &Args) -> Result<HostValue, HostError> {
    if let Some(state) = module.state::<SoftwareState>() {
        state.debug.store(true, Ordering::Relaxed);
        log::info!("Debug messages enabled for '{}'", module.path());
    }
    Ok(HostValue::None)
}

/// Records a debug message if debugging was enabled on the module.
pub(crate) fn debug_message(module: &BackendModule, message: impl FnOnce() -> String) {
    let Some(state) = module.state::<SoftwareState>() else {
        return;
    };
    if state.debug.load(Ordering::Relaxed) {
        let message = message();
        log::debug!("[{}] {message}", module.name());
        lock(&state.messages).push(message);
    }
}

/// Takes every debug message collected so far.
pub(crate) fn drain_debug_messages(module: &BackendModule) -> Vec<String> {
    module
        .state::<SoftwareState>()
        .map(|state| std::mem::take(&mut *lock(&state.messages)))
        .unwrap_or_default()
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn release<T: Any>(native: NativeBox) {
    log::trace!("Releasing {}", std::any::type_name::<T>());
    drop(native);
}

/// Reads an enumeration code, raising `category` for codes outside the
/// enumeration. A missing argument falls back to `default` if one is given.
pub(crate) fn code_arg<T>(
    module: &BackendModule,
    category: ErrorCategoryKind,
    args: &Args,
    index: usize,
    name: &str,
    default: Option<T>,
) -> Result<T, HostError>
where
    T: TryFrom<u32, Error = UnknownCode>,
{
    match (args.optional::<u32>(index, name)?, default) {
        (Some(code), _) => {
            T::try_from(code).map_err(|err| module.raise(category, format!("invalid {name}: {err}")))
        }
        (None, Some(default)) => Ok(default),
        (None, None) => Err(HostError::MissingArgument(name.to_string())),
    }
}

/// Type-checks a single object argument against this module's `kind` type.
pub(crate) fn native_arg<T: Any>(
    module: &BackendModule,
    kind: EntityKind,
    value: &HostValue,
) -> Result<Native<T>, HostError> {
    let expected = module.entity_type(kind);
    let mismatch = || HostError::TypeMismatch {
        expected: expected.name().to_string(),
        found: value.type_name(),
    };
    if !value.is_instance(expected)? {
        return Err(mismatch());
    }
    value
        .as_object()
        .cloned()
        .and_then(Native::new)
        .ok_or_else(mismatch)
}

/// Converts a byte count to an index, raising `category` if it cannot be
/// addressed.
pub(crate) fn to_index(
    module: &BackendModule,
    category: ErrorCategoryKind,
    value: u64,
) -> Result<usize, HostError> {
    usize::try_from(value).map_err(|_| module.raise(category, format!("{value} is not addressable")))
}
