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

//! Heap, shader and sampler code spaces.

use super::code_enum;

code_enum! {
    /// The memory region a resource or heap lives in.
    pub enum HeapKind {
        /// Device-local memory, not visible to the host.
        Default = 0 => "HEAP_DEFAULT",
        /// Host-visible memory optimized for host writes.
        Upload = 1 => "HEAP_UPLOAD",
        /// Host-visible memory optimized for host reads.
        Readback = 2 => "HEAP_READBACK",
    }
}

impl HeapKind {
    /// Returns `true` if the host can map memory of this kind.
    pub const fn is_host_visible(self) -> bool {
        !matches!(self, HeapKind::Default)
    }
}

code_enum! {
    /// The binary format shader bytes are encoded in.
    ///
    /// Orthogonal to [`ShaderTargetKind`].
    pub enum ShaderBinaryKind {
        /// DirectX intermediate language.
        Dxil = 0 => "SHADER_BINARY_TYPE_DXIL",
        /// SPIR-V.
        Spirv = 1 => "SHADER_BINARY_TYPE_SPIRV",
        /// Legacy DirectX bytecode.
        Dxbc = 2 => "SHADER_BINARY_TYPE_DXBC",
        /// Metal shading language source.
        Msl = 3 => "SHADER_BINARY_TYPE_MSL",
        /// GLSL source.
        Glsl = 4 => "SHADER_BINARY_TYPE_GLSL",
    }
}

code_enum! {
    /// The pipeline stage a shader is built for.
    pub enum ShaderTargetKind {
        /// A compute kernel.
        Compute = 0 => "SHADER_TARGET_TYPE_CS",
        /// A raytracing library.
        RaytracingLibrary = 1 => "SHADER_TARGET_TYPE_LIB",
        /// A vertex shader.
        Vertex = 2 => "SHADER_TARGET_TYPE_VS",
        /// A pixel (fragment) shader.
        Pixel = 3 => "SHADER_TARGET_TYPE_PS",
    }
}

code_enum! {
    /// Texel filtering used by a sampler.
    pub enum SamplerFilter {
        /// Nearest texel.
        Point = 0 => "SAMPLER_FILTER_POINT",
        /// Linear interpolation.
        Linear = 1 => "SAMPLER_FILTER_LINEAR",
    }
}

code_enum! {
    /// How a sampler resolves coordinates outside `[0, 1]`.
    pub enum SamplerAddressMode {
        /// Coordinates wrap around.
        Wrap = 0 => "SAMPLER_ADDRESS_MODE_WRAP",
        /// Coordinates wrap around, mirroring at every boundary.
        Mirror = 1 => "SAMPLER_ADDRESS_MODE_MIRROR",
        /// Coordinates are clamped to the edge.
        Clamp = 2 => "SAMPLER_ADDRESS_MODE_CLAMP",
    }
}

impl Default for HeapKind {
    fn default() -> Self {
        HeapKind::Default
    }
}

impl Default for SamplerFilter {
    fn default() -> Self {
        SamplerFilter::Point
    }
}

impl Default for SamplerAddressMode {
    fn default() -> Self {
        SamplerAddressMode::Wrap
    }
}
