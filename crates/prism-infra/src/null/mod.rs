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

//! A backend that registers every entity kind and supports nothing.
//!
//! Useful to exercise capability errors and to run several backends side by
//! side in one host.

use prism_core::api::ShaderBinaryKind;
use prism_core::backend::{BackendDescriptor, BackendModule, EntityKind};
use prism_core::error::{ErrorCategoryKind, HostError, RegistrationError};
use prism_core::host::{
    Args, AttributeDef, FunctionDef, FunctionTable, HostObject, HostValue, NativeBox, OperationDef,
    TypeSpec,
};
use std::sync::Arc;

/// The backend name, as used in configuration.
pub const NAME: &str = "null";

/// The only device of the null backend.
#[derive(Debug, Default)]
pub struct NullDevice;

/// Native placeholder for the kinds that are never instantiated.
#[derive(Debug, Default)]
pub struct NullEntity;

fn release(native: NativeBox) {
    drop(native);
}

fn unsupported(object: &HostObject, _args: &Args) -> Result<HostValue, HostError> {
    Err(object.module().raise(
        ErrorCategoryKind::Device,
        "operation not supported by the null backend",
    ))
}

const CREATE_OPERATIONS: [&str; 8] = [
    "create_buffer",
    "create_texture1d",
    "create_texture2d",
    "create_texture3d",
    "create_heap",
    "create_sampler",
    "create_compute",
    "create_swapchain",
];

fn device_spec() -> TypeSpec {
    let spec = TypeSpec::of::<NullDevice>("A device that cannot create anything.")
        .destructor(release)
        .attribute(AttributeDef::new("name", "Adapter name.", |_| Ok("Prism Null Device".into())))
        .attribute(AttributeDef::new("dedicated_video_memory", "Always 0.", |_| Ok(0u64.into())))
        .attribute(AttributeDef::new("dedicated_system_memory", "Always 0.", |_| Ok(0u64.into())))
        .attribute(AttributeDef::new("shared_system_memory", "Always 0.", |_| Ok(0u64.into())))
        .attribute(AttributeDef::new("vendor_id", "Always 0.", |_| Ok(0u32.into())))
        .attribute(AttributeDef::new("device_id", "Always 0.", |_| Ok(0u32.into())))
        .attribute(AttributeDef::new("is_hardware", "Always false.", |_| Ok(false.into())))
        .attribute(AttributeDef::new("is_discrete", "Always false.", |_| Ok(false.into())))
        .operation(OperationDef::new(
            "get_debug_messages",
            "Always empty.",
            |_, _| Ok(HostValue::list(Vec::<HostValue>::new())),
        ));
    CREATE_OPERATIONS.into_iter().fold(spec, |spec, name| {
        spec.operation(OperationDef::new(name, "Not supported.", unsupported))
    })
}

fn entity_spec(kind: EntityKind) -> TypeSpec {
    TypeSpec::of::<NullEntity>(format!("A {kind} of the null backend; never instantiated."))
        .destructor(release)
}

/// Builds the null backend's descriptor.
pub fn descriptor() -> Result<BackendDescriptor, RegistrationError> {
    let functions = FunctionTable::new()
        .with(FunctionDef::new(
            "get_discovered_devices",
            "Returns the single null device.",
            get_discovered_devices,
        ))
        .with(FunctionDef::new(
            "get_shader_binary_type",
            "Returns the shader binary kind this backend would accept.",
            |_, _| Ok(ShaderBinaryKind::Spirv.code().into()),
        ))
        .with(FunctionDef::new("enable_debug", "Does nothing.", |_, _| Ok(HostValue::None)));

    let mut descriptor = BackendDescriptor::new(NAME, functions)?;
    descriptor.set_entity(EntityKind::Device, device_spec());
    for kind in EntityKind::ALL.into_iter().filter(|kind| *kind != EntityKind::Device) {
        descriptor.set_entity(kind, entity_spec(kind));
    }
    Ok(descriptor)
}

fn get_discovered_devices(module: &Arc<BackendModule>, _args: &Args) -> Result<HostValue, HostError> {
    Ok(HostValue::list([module.instantiate(EntityKind::Device, NullDevice)?]))
}
