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

//! Pixel and depth formats.

use super::code_enum;

code_enum! {
    /// A pixel or depth/stencil format.
    ///
    /// Codes follow the DXGI numbering. A backend that cannot realize a format
    /// must fail instead of substituting a different one.
    pub enum PixelFormat {
        /// Four 32-bit float channels.
        R32G32B32A32Float = 2 => "R32G32B32A32_FLOAT",
        /// Four 32-bit unsigned integer channels.
        R32G32B32A32Uint = 3 => "R32G32B32A32_UINT",
        /// Four 32-bit signed integer channels.
        R32G32B32A32Sint = 4 => "R32G32B32A32_SINT",
        /// Three 32-bit float channels.
        R32G32B32Float = 6 => "R32G32B32_FLOAT",
        /// Three 32-bit unsigned integer channels.
        R32G32B32Uint = 7 => "R32G32B32_UINT",
        /// Three 32-bit signed integer channels.
        R32G32B32Sint = 8 => "R32G32B32_SINT",
        /// Four 16-bit float channels.
        R16G16B16A16Float = 10 => "R16G16B16A16_FLOAT",
        /// Four 16-bit unsigned normalized channels.
        R16G16B16A16Unorm = 11 => "R16G16B16A16_UNORM",
        /// Four 16-bit unsigned integer channels.
        R16G16B16A16Uint = 12 => "R16G16B16A16_UINT",
        /// Four 16-bit signed normalized channels.
        R16G16B16A16Snorm = 13 => "R16G16B16A16_SNORM",
        /// Four 16-bit signed integer channels.
        R16G16B16A16Sint = 14 => "R16G16B16A16_SINT",
        /// Two 32-bit float channels.
        R32G32Float = 16 => "R32G32_FLOAT",
        /// Two 32-bit unsigned integer channels.
        R32G32Uint = 17 => "R32G32_UINT",
        /// Two 32-bit signed integer channels.
        R32G32Sint = 18 => "R32G32_SINT",
        /// Four 8-bit unsigned normalized channels.
        R8G8B8A8Unorm = 28 => "R8G8B8A8_UNORM",
        /// Four 8-bit unsigned normalized channels in the sRGB color space.
        R8G8B8A8UnormSrgb = 29 => "R8G8B8A8_UNORM_SRGB",
        /// Four 8-bit unsigned integer channels.
        R8G8B8A8Uint = 30 => "R8G8B8A8_UINT",
        /// Four 8-bit signed normalized channels.
        R8G8B8A8Snorm = 31 => "R8G8B8A8_SNORM",
        /// Four 8-bit signed integer channels.
        R8G8B8A8Sint = 32 => "R8G8B8A8_SINT",
        /// Two 16-bit float channels.
        R16G16Float = 34 => "R16G16_FLOAT",
        /// Two 16-bit unsigned normalized channels.
        R16G16Unorm = 35 => "R16G16_UNORM",
        /// Two 16-bit unsigned integer channels.
        R16G16Uint = 36 => "R16G16_UINT",
        /// Two 16-bit signed normalized channels.
        R16G16Snorm = 37 => "R16G16_SNORM",
        /// Two 16-bit signed integer channels.
        R16G16Sint = 38 => "R16G16_SINT",
        /// 32-bit float depth.
        D32Float = 40 => "D32_FLOAT",
        /// One 32-bit float channel.
        R32Float = 41 => "R32_FLOAT",
        /// One 32-bit unsigned integer channel.
        R32Uint = 42 => "R32_UINT",
        /// One 32-bit signed integer channel.
        R32Sint = 43 => "R32_SINT",
        /// 24-bit unsigned normalized depth with 8-bit stencil.
        D24UnormS8Uint = 45 => "D24_UNORM_S8_UINT",
        /// Two 8-bit unsigned normalized channels.
        R8G8Unorm = 49 => "R8G8_UNORM",
        /// Two 8-bit unsigned integer channels.
        R8G8Uint = 50 => "R8G8_UINT",
        /// Two 8-bit signed normalized channels.
        R8G8Snorm = 51 => "R8G8_SNORM",
        /// Two 8-bit signed integer channels.
        R8G8Sint = 52 => "R8G8_SINT",
        /// One 16-bit float channel.
        R16Float = 54 => "R16_FLOAT",
        /// 16-bit unsigned normalized depth.
        D16Unorm = 55 => "D16_UNORM",
        /// One 16-bit unsigned normalized channel.
        R16Unorm = 56 => "R16_UNORM",
        /// One 16-bit unsigned integer channel.
        R16Uint = 57 => "R16_UINT",
        /// One 16-bit signed normalized channel.
        R16Snorm = 58 => "R16_SNORM",
        /// One 16-bit signed integer channel.
        R16Sint = 59 => "R16_SINT",
        /// One 8-bit unsigned normalized channel.
        R8Unorm = 61 => "R8_UNORM",
        /// One 8-bit unsigned integer channel.
        R8Uint = 62 => "R8_UINT",
        /// One 8-bit signed normalized channel.
        R8Snorm = 63 => "R8_SNORM",
        /// One 8-bit signed integer channel.
        R8Sint = 64 => "R8_SINT",
        /// Four 8-bit unsigned normalized channels in BGRA order.
        B8G8R8A8Unorm = 87 => "B8G8R8A8_UNORM",
        /// Four 8-bit unsigned normalized channels in BGRA order, sRGB.
        B8G8R8A8UnormSrgb = 91 => "B8G8R8A8_UNORM_SRGB",
    }
}

impl PixelFormat {
    /// Returns the size in bytes of a single pixel.
    pub const fn bytes_per_pixel(self) -> u32 {
        use PixelFormat::*;
        match self {
            R32G32B32A32Float | R32G32B32A32Uint | R32G32B32A32Sint => 16,
            R32G32B32Float | R32G32B32Uint | R32G32B32Sint => 12,
            R16G16B16A16Float | R16G16B16A16Unorm | R16G16B16A16Uint | R16G16B16A16Snorm
            | R16G16B16A16Sint | R32G32Float | R32G32Uint | R32G32Sint => 8,
            R8G8B8A8Unorm | R8G8B8A8UnormSrgb | R8G8B8A8Uint | R8G8B8A8Snorm | R8G8B8A8Sint
            | R16G16Float | R16G16Unorm | R16G16Uint | R16G16Snorm | R16G16Sint | D32Float
            | R32Float | R32Uint | R32Sint | D24UnormS8Uint | B8G8R8A8Unorm
            | B8G8R8A8UnormSrgb => 4,
            R8G8Unorm | R8G8Uint | R8G8Snorm | R8G8Sint | R16Float | D16Unorm | R16Unorm
            | R16Uint | R16Snorm | R16Sint => 2,
            R8Unorm | R8Uint | R8Snorm | R8Sint => 1,
        }
    }

    /// Returns `true` for depth and depth/stencil formats.
    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            PixelFormat::D32Float | PixelFormat::D24UnormS8Uint | PixelFormat::D16Unorm
        )
    }

    /// Returns `true` for formats whose channels are stored blue-first.
    pub const fn is_bgra(self) -> bool {
        matches!(
            self,
            PixelFormat::B8G8R8A8Unorm | PixelFormat::B8G8R8A8UnormSrgb
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // (name, code, bytes per pixel)
    const REFERENCE: &[(&str, u32, u32)] = &[
        ("R32G32B32A32_FLOAT", 2, 16),
        ("R32G32B32A32_UINT", 3, 16),
        ("R32G32B32A32_SINT", 4, 16),
        ("R32G32B32_FLOAT", 6, 12),
        ("R32G32B32_UINT", 7, 12),
        ("R32G32B32_SINT", 8, 12),
        ("R16G16B16A16_FLOAT", 10, 8),
        ("R16G16B16A16_UNORM", 11, 8),
        ("R16G16B16A16_UINT", 12, 8),
        ("R16G16B16A16_SNORM", 13, 8),
        ("R16G16B16A16_SINT", 14, 8),
        ("R32G32_FLOAT", 16, 8),
        ("R32G32_UINT", 17, 8),
        ("R32G32_SINT", 18, 8),
        ("R8G8B8A8_UNORM", 28, 4),
        ("R8G8B8A8_UNORM_SRGB", 29, 4),
        ("R8G8B8A8_UINT", 30, 4),
        ("R8G8B8A8_SNORM", 31, 4),
        ("R8G8B8A8_SINT", 32, 4),
        ("R16G16_FLOAT", 34, 4),
        ("R16G16_UNORM", 35, 4),
        ("R16G16_UINT", 36, 4),
        ("R16G16_SNORM", 37, 4),
        ("R16G16_SINT", 38, 4),
        ("D32_FLOAT", 40, 4),
        ("R32_FLOAT", 41, 4),
        ("R32_UINT", 42, 4),
        ("R32_SINT", 43, 4),
        ("D24_UNORM_S8_UINT", 45, 4),
        ("R8G8_UNORM", 49, 2),
        ("R8G8_UINT", 50, 2),
        ("R8G8_SNORM", 51, 2),
        ("R8G8_SINT", 52, 2),
        ("R16_FLOAT", 54, 2),
        ("D16_UNORM", 55, 2),
        ("R16_UNORM", 56, 2),
        ("R16_UINT", 57, 2),
        ("R16_SNORM", 58, 2),
        ("R16_SINT", 59, 2),
        ("R8_UNORM", 61, 1),
        ("R8_UINT", 62, 1),
        ("R8_SNORM", 63, 1),
        ("R8_SINT", 64, 1),
        ("B8G8R8A8_UNORM", 87, 4),
        ("B8G8R8A8_UNORM_SRGB", 91, 4),
    ];

    #[test]
    fn codes_match_reference_table() {
        let actual: Vec<(&str, u32, u32)> = PixelFormat::ALL
            .iter()
            .map(|f| (f.name(), f.code(), f.bytes_per_pixel()))
            .collect();
        assert_eq!(actual, REFERENCE);
    }

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<u32> = PixelFormat::ALL.iter().map(|f| f.code()).collect();
        assert_eq!(codes.len(), PixelFormat::ALL.len());
    }

    #[test]
    fn depth_and_r16_unorm_are_distinct() {
        assert_eq!(PixelFormat::try_from(55), Ok(PixelFormat::D16Unorm));
        assert_eq!(PixelFormat::try_from(56), Ok(PixelFormat::R16Unorm));
        assert_ne!(PixelFormat::D16Unorm.code(), PixelFormat::R16Unorm.code());
    }

    #[test]
    fn gaps_are_rejected() {
        for code in [0, 1, 5, 9, 15, 39, 44, 53, 60, 88, 92] {
            assert!(PixelFormat::try_from(code).is_err(), "code {code} should be unknown");
        }
    }

    #[test]
    fn classification() {
        assert!(PixelFormat::D24UnormS8Uint.is_depth());
        assert!(!PixelFormat::R32Float.is_depth());
        assert!(PixelFormat::B8G8R8A8Unorm.is_bgra());
        assert!(!PixelFormat::R8G8B8A8Unorm.is_bgra());
    }

    #[test]
    fn serializes_as_code() {
        let json = serde_json::to_string(&PixelFormat::R8G8B8A8Uint).unwrap();
        assert_eq!(json, "30");
        let back: PixelFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PixelFormat::R8G8B8A8Uint);

        let formats: Vec<PixelFormat> = serde_json::from_str("[55, 56, 87]").unwrap();
        assert_eq!(
            formats,
            [PixelFormat::D16Unorm, PixelFormat::R16Unorm, PixelFormat::B8G8R8A8Unorm]
        );
        let err = serde_json::from_str::<PixelFormat>("27").unwrap_err();
        assert!(err.to_string().contains("27 is not a valid PixelFormat code"));
        assert!(serde_json::from_str::<PixelFormat>("\"R8G8B8A8Uint\"").is_err());
    }
}
