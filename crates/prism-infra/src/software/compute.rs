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

//! Compute pipelines.

use super::resource::{Dimension, SoftwareResource};
use super::sampler::SoftwareSampler;
use super::{debug_message, lock, release};
use prism_core::backend::EntityKind;
use prism_core::error::{ErrorCategoryKind, HostError};
use prism_core::host::{Args, AttributeDef, HostObject, HostValue, Native, OperationDef, TypeSpec};
use std::sync::Mutex;

/// A compute shader together with the resources bound to it.
///
/// The emulation does not run shader code; dispatches are validated and
/// recorded.
#[derive(Debug)]
pub struct SoftwareCompute {
    shader: Vec<u8>,
    cbv: Vec<Native<SoftwareResource>>,
    srv: Vec<Native<SoftwareResource>>,
    uav: Vec<Native<SoftwareResource>>,
    samplers: Vec<Native<SoftwareSampler>>,
    dispatches: Mutex<Vec<[u32; 3]>>,
}

impl SoftwareCompute {
    /// The shader bytes.
    pub fn shader(&self) -> &[u8] {
        &self.shader
    }

    /// Every dispatch recorded so far, as `[x, y, z]` group counts.
    pub fn dispatches(&self) -> Vec<[u32; 3]> {
        lock(&self.dispatches).clone()
    }
}

fn compute(object: &HostObject) -> Result<&SoftwareCompute, HostError> {
    object.downcast::<SoftwareCompute>()
}

pub(super) fn spec() -> TypeSpec {
    TypeSpec::of::<SoftwareCompute>("A compute pipeline with bound resources.")
        .destructor(release::<SoftwareCompute>)
        .attribute(AttributeDef::new("cbv_count", "Bound constant buffers.", |object| {
            Ok(compute(object)?.cbv.len().into())
        }))
        .attribute(AttributeDef::new("srv_count", "Bound read-only resources.", |object| {
            Ok(compute(object)?.srv.len().into())
        }))
        .attribute(AttributeDef::new("uav_count", "Bound read-write resources.", |object| {
            Ok(compute(object)?.uav.len().into())
        }))
        .attribute(AttributeDef::new("sampler_count", "Bound samplers.", |object| {
            Ok(compute(object)?.samplers.len().into())
        }))
        .attribute(AttributeDef::new("dispatches", "Dispatches recorded so far.", |object| {
            Ok(lock(&compute(object)?.dispatches).len().into())
        }))
        .operation(
            OperationDef::new("dispatch", "dispatch(x, y, z)", dispatch).uses(&["dispatches"]),
        )
}

/// `Device.create_compute(shader, cbv=[], srv=[], uav=[], samplers=[])`
pub(super) fn create(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let shader: Vec<u8> = args.required(0, "shader")?;
    if shader.is_empty() {
        return Err(module.raise(ErrorCategoryKind::Device, "shader bytecode is empty"));
    }

    let cbv = module.collect::<SoftwareResource>(EntityKind::Resource, args.present(1, "cbv"))?;
    let srv = module.collect::<SoftwareResource>(EntityKind::Resource, args.present(2, "srv"))?;
    let uav = module.collect::<SoftwareResource>(EntityKind::Resource, args.present(3, "uav"))?;
    let samplers =
        module.collect::<SoftwareSampler>(EntityKind::Sampler, args.present(4, "samplers"))?;

    if let Some(position) = cbv.iter().position(|view| view.dimension() != Dimension::Buffer) {
        return Err(module.raise(
            ErrorCategoryKind::Buffer,
            format!("constant buffer view {position} is not a buffer"),
        ));
    }

    let native = SoftwareCompute {
        shader,
        cbv,
        srv,
        uav,
        samplers,
        dispatches: Mutex::new(Vec::new()),
    };
    debug_message(module, || {
        format!(
            "Created compute pipeline ({} bytes, {} cbv, {} srv, {} uav, {} samplers)",
            native.shader.len(),
            native.cbv.len(),
            native.srv.len(),
            native.uav.len(),
            native.samplers.len()
        )
    });
    Ok(module.instantiate(EntityKind::Compute, native)?.into())
}

fn dispatch(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let this = compute(object)?;
    let groups: [u32; 3] = [
        args.required(0, "x")?,
        args.required(1, "y")?,
        args.required(2, "z")?,
    ];
    if groups.contains(&0) {
        return Err(module.raise(
            ErrorCategoryKind::Device,
            format!("dispatch group counts must be non-zero, got {groups:?}"),
        ));
    }
    lock(&this.dispatches).push(groups);
    debug_message(module, || format!("Dispatched {groups:?}"));
    Ok(HostValue::None)
}
