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

//! Samplers.

use super::{code_arg, debug_message, release};
use prism_core::api::{SamplerAddressMode, SamplerFilter};
use prism_core::backend::EntityKind;
use prism_core::error::{ErrorCategoryKind, HostError};
use prism_core::host::{Args, AttributeDef, HostObject, HostValue, TypeSpec};

/// Sampling state. Nothing samples on the CPU, so it is only stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareSampler {
    address_mode_u: SamplerAddressMode,
    address_mode_v: SamplerAddressMode,
    address_mode_w: SamplerAddressMode,
    filter_min: SamplerFilter,
    filter_mag: SamplerFilter,
}

fn sampler(object: &HostObject) -> Result<&SoftwareSampler, HostError> {
    object.downcast::<SoftwareSampler>()
}

pub(super) fn spec() -> TypeSpec {
    TypeSpec::of::<SoftwareSampler>("Texture sampling state.")
        .destructor(release::<SoftwareSampler>)
        .attribute(AttributeDef::new("address_mode_u", "U address mode code.", |object| {
            Ok(sampler(object)?.address_mode_u.code().into())
        }))
        .attribute(AttributeDef::new("address_mode_v", "V address mode code.", |object| {
            Ok(sampler(object)?.address_mode_v.code().into())
        }))
        .attribute(AttributeDef::new("address_mode_w", "W address mode code.", |object| {
            Ok(sampler(object)?.address_mode_w.code().into())
        }))
        .attribute(AttributeDef::new("filter_min", "Minification filter code.", |object| {
            Ok(sampler(object)?.filter_min.code().into())
        }))
        .attribute(AttributeDef::new("filter_mag", "Magnification filter code.", |object| {
            Ok(sampler(object)?.filter_mag.code().into())
        }))
}

/// `Device.create_sampler(address_mode_u, address_mode_v, address_mode_w, filter_min, filter_mag)`
///
/// Every argument is optional; defaults are wrap addressing and point filtering.
pub(super) fn create(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let category = ErrorCategoryKind::Sampler;
    let wrap = Some(SamplerAddressMode::default());
    let point = Some(SamplerFilter::default());
    let native = SoftwareSampler {
        address_mode_u: code_arg(module, category, args, 0, "address_mode_u", wrap)?,
        address_mode_v: code_arg(module, category, args, 1, "address_mode_v", wrap)?,
        address_mode_w: code_arg(module, category, args, 2, "address_mode_w", wrap)?,
        filter_min: code_arg(module, category, args, 3, "filter_min", point)?,
        filter_mag: code_arg(module, category, args, 4, "filter_mag", point)?,
    };
    debug_message(module, || format!("Created sampler {native:?}"));
    Ok(module.instantiate(EntityKind::Sampler, native)?.into())
}
