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

//! Call arguments and typed extraction.

use crate::api::{
    HeapKind, PixelFormat, SamplerAddressMode, SamplerFilter, ShaderBinaryKind, ShaderTargetKind,
};
use crate::error::HostError;
use crate::host::{HostObject, HostValue};

/// The arguments of one call: positional values followed by keywords.
///
/// An argument is addressed by its position and its name at the same time,
/// the keyword form winning when both are supplied.
#[derive(Debug, Clone, Default)]
pub struct Args {
    positional: Vec<HostValue>,
    keywords: Vec<(String, HostValue)>,
}

impl Args {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<HostValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.keywords.push((name.into(), value.into()));
        self
    }

    /// Looks up the argument at `index` or named `name`.
    pub fn get(&self, index: usize, name: &str) -> Option<&HostValue> {
        self.keywords
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
            .or_else(|| self.positional.get(index))
    }

    /// Like [`get`](Self::get), but an explicit none counts as omitted.
    pub fn present(&self, index: usize, name: &str) -> Option<&HostValue> {
        self.get(index, name).filter(|value| !value.is_none())
    }

    /// Extracts a required argument.
    pub fn required<T: FromHostValue>(&self, index: usize, name: &str) -> Result<T, HostError> {
        let value = self
            .present(index, name)
            .ok_or_else(|| HostError::MissingArgument(name.to_string()))?;
        T::from_host(value, name)
    }

    /// Extracts an optional argument; omitted and none both yield `None`.
    pub fn optional<T: FromHostValue>(&self, index: usize, name: &str) -> Result<Option<T>, HostError> {
        self.present(index, name)
            .map(|value| T::from_host(value, name))
            .transpose()
    }

    /// Extracts an argument, falling back to `default` when omitted.
    pub fn or<T: FromHostValue>(&self, index: usize, name: &str, default: T) -> Result<T, HostError> {
        Ok(self.optional(index, name)?.unwrap_or(default))
    }

    /// The number of positional arguments.
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Returns `true` if there are no arguments at all.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }
}

/// Conversion from a host value into a Rust value.
pub trait FromHostValue: Sized {
    /// Converts `value`, naming the argument `name` in errors.
    fn from_host(value: &HostValue, name: &str) -> Result<Self, HostError>;
}

fn mismatch(value: &HostValue, name: &str, expected: &'static str) -> HostError {
    HostError::ArgumentType {
        name: name.to_string(),
        expected,
        found: value.type_name(),
    }
}

fn out_of_range(name: &str, value: i64) -> HostError {
    HostError::InvalidValue {
        name: name.to_string(),
        reason: format!("{value} is out of range"),
    }
}

impl FromHostValue for HostValue {
    fn from_host(value: &HostValue, _name: &str) -> Result<Self, HostError> {
        Ok(value.clone())
    }
}

impl FromHostValue for bool {
    fn from_host(value: &HostValue, name: &str) -> Result<Self, HostError> {
        match value {
            HostValue::Bool(flag) => Ok(*flag),
            HostValue::Int(number) => Ok(*number != 0),
            other => Err(mismatch(other, name, "a bool")),
        }
    }
}

impl FromHostValue for i64 {
    fn from_host(value: &HostValue, name: &str) -> Result<Self, HostError> {
        value.as_int().ok_or_else(|| mismatch(value, name, "an int"))
    }
}

macro_rules! unsigned_from_host {
    ($($ty:ty),+) => {
        $(
            impl FromHostValue for $ty {
                fn from_host(value: &HostValue, name: &str) -> Result<Self, HostError> {
                    let number = i64::from_host(value, name)?;
                    <$ty>::try_from(number).map_err(|_| out_of_range(name, number))
                }
            }
        )+
    };
}

unsigned_from_host!(u32, u64, usize);

impl FromHostValue for String {
    fn from_host(value: &HostValue, name: &str) -> Result<Self, HostError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(value, name, "a str"))
    }
}

impl FromHostValue for Vec<u8> {
    fn from_host(value: &HostValue, name: &str) -> Result<Self, HostError> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch(value, name, "bytes"))
    }
}

impl FromHostValue for HostObject {
    fn from_host(value: &HostValue, name: &str) -> Result<Self, HostError> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| mismatch(value, name, "an object"))
    }
}

macro_rules! code_from_host {
    ($($ty:ty),+) => {
        $(
            impl FromHostValue for $ty {
                fn from_host(value: &HostValue, name: &str) -> Result<Self, HostError> {
                    let code = u32::from_host(value, name)?;
                    <$ty>::try_from(code).map_err(|err| HostError::InvalidValue {
                        name: name.to_string(),
                        reason: err.to_string(),
                    })
                }
            }
        )+
    };
}

code_from_host!(
    PixelFormat,
    HeapKind,
    ShaderBinaryKind,
    ShaderTargetKind,
    SamplerFilter,
    SamplerAddressMode
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_wins_over_position() {
        let args = Args::new().arg(1i64).arg(2i64).kwarg("offset", 9i64);
        assert_eq!(args.required::<i64>(0, "size").unwrap(), 1);
        assert_eq!(args.required::<i64>(1, "offset").unwrap(), 9);
    }

    #[test]
    fn none_counts_as_omitted() {
        let args = Args::new().arg(HostValue::None);
        assert!(args.get(0, "heap").is_some());
        assert!(args.present(0, "heap").is_none());
        assert_eq!(args.optional::<u64>(0, "heap").unwrap(), None);
        assert_eq!(args.or(0, "heap", 5u64).unwrap(), 5);
        assert!(matches!(
            args.required::<u64>(0, "heap"),
            Err(HostError::MissingArgument(ref name)) if name == "heap"
        ));
    }

    #[test]
    fn type_and_range_errors() {
        let args = Args::new().arg("text").arg(-1i64);
        assert!(matches!(
            args.required::<u64>(0, "size"),
            Err(HostError::ArgumentType { expected: "an int", .. })
        ));
        assert!(matches!(
            args.required::<u64>(1, "size"),
            Err(HostError::InvalidValue { .. })
        ));
    }

    #[test]
    fn enumerations_are_checked() {
        let args = Args::new().arg(28i64).arg(27i64).arg(2i64);
        assert_eq!(
            args.required::<PixelFormat>(0, "format").unwrap(),
            PixelFormat::R8G8B8A8Unorm
        );
        let err = args.required::<PixelFormat>(1, "format").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for 'format': 27 is not a valid PixelFormat code"
        );
        assert_eq!(args.required::<HeapKind>(2, "heap_type").unwrap(), HeapKind::Readback);
    }

    #[test]
    fn bytes_and_strings() {
        let args = Args::new().arg(vec![1u8, 2, 3]).kwarg("label", "x");
        assert_eq!(args.required::<Vec<u8>>(0, "data").unwrap(), vec![1, 2, 3]);
        assert_eq!(args.required::<String>(1, "label").unwrap(), "x");
        assert!(args.required::<String>(0, "data").is_err());
    }
}
