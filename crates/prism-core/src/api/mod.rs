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

//! The shared enumeration model.
//!
//! Every backend interprets these codes identically, which is what makes data
//! portable between backends. The integer values are a wire contract: new
//! codes may be added, existing ones are never renumbered.

/// Returned when an integer does not name a variant of a code enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{code} is not a valid {enumeration} code")]
pub struct UnknownCode {
    /// The enumeration that rejected the code.
    pub enumeration: &'static str,
    /// The offending value.
    pub code: u32,
}

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `None` if `alignment` is zero or the result does not fit in a `u64`.
pub const fn align_up(value: u64, alignment: u64) -> Option<u64> {
    value.checked_next_multiple_of(alignment)
}

/// Declares a closed integer code space.
///
/// Generates the `#[repr(u32)]` enum, `ALL`, `code()`, `name()`, `Display`,
/// `TryFrom<u32>` and `Into<u32>`. Serde goes through the code. Duplicate
/// codes are rejected by the compiler as duplicate discriminants.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal => $label:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(into = "u32", try_from = "u32")]
        #[repr(u32)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant = $code,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stable integer code of this variant.
            pub const fn code(self) -> u32 {
                self as u32
            }

            /// The canonical upper-case name of this variant.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> u32 {
                value.code()
            }
        }

        impl TryFrom<u32> for $name {
            type Error = $crate::api::UnknownCode;

            fn try_from(code: u32) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok($name::$variant),)+
                    _ => Err($crate::api::UnknownCode {
                        enumeration: stringify!($name),
                        code,
                    }),
                }
            }
        }
    };
}

pub(crate) use code_enum;

mod enums;
mod formats;

pub use self::enums::{HeapKind, SamplerAddressMode, SamplerFilter, ShaderBinaryKind, ShaderTargetKind};
pub use self::formats::PixelFormat;
