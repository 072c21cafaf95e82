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

//! The emulated device and its creation operations.

use super::{compute, drain_debug_messages, heap, release, resource, sampler, swapchain};
use prism_core::error::HostError;
use prism_core::host::{Args, AttributeDef, HostObject, HostValue, OperationDef, TypeSpec};

/// Adapter properties reported by the emulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    /// Human readable adapter name.
    pub name: &'static str,
    /// Device-local memory in bytes.
    pub dedicated_video_memory: u64,
    /// System memory reserved for the device in bytes.
    pub dedicated_system_memory: u64,
    /// System memory shared with the device in bytes.
    pub shared_system_memory: u64,
    /// PCI vendor id.
    pub vendor_id: u32,
    /// PCI device id.
    pub device_id: u32,
    /// `false`: this is an emulation.
    pub is_hardware: bool,
    /// `false`: memory is host memory.
    pub is_discrete: bool,
}

/// The single device exposed by the software backend.
#[derive(Debug)]
pub struct SoftwareDevice {
    info: AdapterInfo,
}

impl SoftwareDevice {
    pub(crate) fn new() -> Self {
        Self {
            info: AdapterInfo {
                name: "Prism Software Device",
                dedicated_video_memory: 0,
                dedicated_system_memory: 0,
                shared_system_memory: super::MAX_ALLOCATION,
                vendor_id: 0,
                device_id: 0,
                is_hardware: false,
                is_discrete: false,
            },
        }
    }

    /// The adapter properties.
    pub fn info(&self) -> &AdapterInfo {
        &self.info
    }
}

fn info(object: &HostObject) -> Result<&AdapterInfo, HostError> {
    Ok(&object.downcast::<SoftwareDevice>()?.info)
}

pub(super) fn spec() -> TypeSpec {
    TypeSpec::of::<SoftwareDevice>("A CPU-emulated device.")
        .destructor(release::<SoftwareDevice>)
        .attribute(AttributeDef::new("name", "Adapter name.", |object| {
            Ok(info(object)?.name.into())
        }))
        .attribute(AttributeDef::new(
            "dedicated_video_memory",
            "Device-local memory in bytes.",
            |object| {
                let adapter = info(object)?;
                HostValue::checked_int(adapter.dedicated_video_memory, "dedicated_video_memory")
            },
        ))
        .attribute(AttributeDef::new(
            "dedicated_system_memory",
            "System memory reserved for the device in bytes.",
            |object| {
                let adapter = info(object)?;
                HostValue::checked_int(adapter.dedicated_system_memory, "dedicated_system_memory")
            },
        ))
        .attribute(AttributeDef::new(
            "shared_system_memory",
            "System memory shared with the device in bytes.",
            |object| {
                let adapter = info(object)?;
                HostValue::checked_int(adapter.shared_system_memory, "shared_system_memory")
            },
        ))
        .attribute(AttributeDef::new("vendor_id", "PCI vendor id.", |object| {
            Ok(info(object)?.vendor_id.into())
        }))
        .attribute(AttributeDef::new("device_id", "PCI device id.", |object| {
            Ok(info(object)?.device_id.into())
        }))
        .attribute(AttributeDef::new("is_hardware", "Backed by real hardware.", |object| {
            Ok(info(object)?.is_hardware.into())
        }))
        .attribute(AttributeDef::new("is_discrete", "A discrete adapter.", |object| {
            Ok(info(object)?.is_discrete.into())
        }))
        .operation(OperationDef::new(
            "create_buffer",
            "create_buffer(heap_type, size, stride=0, format=0, heap=None, heap_offset=0)",
            resource::create_buffer,
        ))
        .operation(OperationDef::new(
            "create_texture1d",
            "create_texture1d(width, format, heap=None, heap_offset=0)",
            resource::create_texture1d,
        ))
        .operation(OperationDef::new(
            "create_texture2d",
            "create_texture2d(width, height, format, heap=None, heap_offset=0)",
            resource::create_texture2d,
        ))
        .operation(OperationDef::new(
            "create_texture3d",
            "create_texture3d(width, height, depth, format, heap=None, heap_offset=0)",
            resource::create_texture3d,
        ))
        .operation(OperationDef::new(
            "create_heap",
            "create_heap(heap_type, size)",
            heap::create,
        ))
        .operation(OperationDef::new(
            "create_sampler",
            "create_sampler(address_mode_u, address_mode_v, address_mode_w, filter_min, filter_mag)",
            sampler::create,
        ))
        .operation(OperationDef::new(
            "create_compute",
            "create_compute(shader, cbv=[], srv=[], uav=[], samplers=[])",
            compute::create,
        ))
        .operation(OperationDef::new(
            "create_swapchain",
            "create_swapchain(window_handle, format, num_buffers=3, width=0, height=0)",
            swapchain::create,
        ))
        .operation(OperationDef::new(
            "get_debug_messages",
            "Returns and clears the debug messages collected so far.",
            get_debug_messages,
        ))
}

fn get_debug_messages(object: &HostObject, _args: &Args) -> Result<HostValue, HostError> {
    Ok(HostValue::list(drain_debug_messages(object.module())))
}
