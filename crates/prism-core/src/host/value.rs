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

//! Values exchanged between host code and backend operations.

use crate::error::HostError;
use crate::host::object::HostObject;
use crate::host::types::TypeIdentity;
use std::fmt;
use std::sync::Arc;

/// A dynamically typed value owned by the host runtime.
///
/// Cloning is cheap: strings, byte strings, lists and objects are reference
/// counted.
#[derive(Clone, Default)]
pub enum HostValue {
    /// The absence of a value.
    #[default]
    None,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A text string.
    Str(Arc<str>),
    /// A byte string.
    Bytes(Arc<[u8]>),
    /// An ordered collection. The only iterable value.
    List(Arc<[HostValue]>),
    /// An instance of a registered type.
    Object(HostObject),
    /// A value owned by something outside the host object model. Its type
    /// cannot be determined, so instance checks against it are inconclusive.
    Opaque(Arc<str>),
}

impl HostValue {
    /// Builds a list value.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<HostValue>,
    {
        HostValue::List(items.into_iter().map(Into::into).collect())
    }

    /// The host-facing name of this value's type.
    pub fn type_name(&self) -> String {
        match self {
            HostValue::None => "NoneType".to_string(),
            HostValue::Bool(_) => "bool".to_string(),
            HostValue::Int(_) => "int".to_string(),
            HostValue::Float(_) => "float".to_string(),
            HostValue::Str(_) => "str".to_string(),
            HostValue::Bytes(_) => "bytes".to_string(),
            HostValue::List(_) => "list".to_string(),
            HostValue::Object(object) => object.type_identity().qualified_name().to_string(),
            HostValue::Opaque(label) => label.to_string(),
        }
    }

    /// Returns `true` for [`HostValue::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    /// The polymorphic instance check.
    ///
    /// `Ok(true)` if this value is an object whose type is `ty` or derives from
    /// it, `Ok(false)` for any other introspectable value, and an error when the
    /// value's type cannot be determined.
    pub fn is_instance(&self, ty: &TypeIdentity) -> Result<bool, HostError> {
        match self {
            HostValue::Object(object) => Ok(object.type_identity().is_subtype_of(ty)),
            HostValue::Opaque(label) => Err(HostError::NotIntrospectable(label.to_string())),
            _ => Ok(false),
        }
    }

    /// Obtains an iterator over this value.
    ///
    /// Fails without yielding anything if the value is not iterable.
    pub fn iter(&self) -> Result<HostIter, HostError> {
        match self {
            HostValue::List(items) => Ok(HostIter {
                items: Arc::clone(items),
                position: 0,
            }),
            other => Err(HostError::NotIterable(other.type_name())),
        }
    }

    /// Returns the integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(value) => Some(&**value),
            _ => None,
        }
    }

    /// Returns the bytes, if this is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            HostValue::Bytes(value) => Some(&**value),
            _ => None,
        }
    }

    /// Returns the items, if this is a list.
    pub fn as_list(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::List(items) => Some(&**items),
            _ => None,
        }
    }

    /// Returns the object, if this is one.
    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Converts an unsigned quantity to an `Int`, failing where the `From`
    /// conversions clamp.
    pub fn checked_int(value: u64, name: &str) -> Result<HostValue, HostError> {
        i64::try_from(value)
            .map(HostValue::Int)
            .map_err(|_| HostError::InvalidValue {
                name: name.to_string(),
                reason: format!("{value} does not fit in a host integer"),
            })
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::None => f.write_str("None"),
            HostValue::Bool(value) => write!(f, "{value}"),
            HostValue::Int(value) => write!(f, "{value}"),
            HostValue::Float(value) => write!(f, "{value}"),
            HostValue::Str(value) => write!(f, "{value:?}"),
            HostValue::Bytes(value) => write!(f, "bytes[{}]", value.len()),
            HostValue::List(items) => f.debug_list().entries(items.iter()).finish(),
            HostValue::Object(object) => write!(f, "{object:?}"),
            HostValue::Opaque(label) => write!(f, "<opaque {label}>"),
        }
    }
}

/// An iterator over a host collection.
///
/// Every item is yielded as a new reference; the caller releases it by
/// dropping it.
pub struct HostIter {
    items: Arc<[HostValue]>,
    position: usize,
}

impl Iterator for HostIter {
    type Item = HostValue;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.get(self.position)?.clone();
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HostIter {}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(value.into())
    }
}

impl From<u32> for HostValue {
    fn from(value: u32) -> Self {
        HostValue::Int(value.into())
    }
}

/// Values above `i64::MAX` clamp to it; see [`HostValue::checked_int`].
impl From<u64> for HostValue {
    fn from(value: u64) -> Self {
        HostValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// Values above `i64::MAX` clamp to it; see [`HostValue::checked_int`].
impl From<usize> for HostValue {
    fn from(value: usize) -> Self {
        HostValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Float(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Str(value.into())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Str(value.into())
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(value: Vec<u8>) -> Self {
        HostValue::Bytes(value.into())
    }
}

impl From<&[u8]> for HostValue {
    fn from(value: &[u8]) -> Self {
        HostValue::Bytes(value.into())
    }
}

impl From<HostObject> for HostValue {
    fn from(value: HostObject) -> Self {
        HostValue::Object(value)
    }
}

impl From<&HostObject> for HostValue {
    fn from(value: &HostObject) -> Self {
        HostValue::Object(value.clone())
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(value: Vec<HostValue>) -> Self {
        HostValue::List(value.into())
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_conversions_clamp_or_fail() {
        assert_eq!(HostValue::from(u64::MAX).as_int(), Some(i64::MAX));
        assert_eq!(HostValue::from(usize::MAX).as_int(), Some(i64::MAX));

        let fits = HostValue::checked_int(i64::MAX as u64, "size");
        assert_eq!(fits.ok().and_then(|value| value.as_int()), Some(i64::MAX));
        let err = HostValue::checked_int(u64::MAX, "size").unwrap_err();
        assert!(matches!(err, HostError::InvalidValue { ref name, .. } if name == "size"));
    }

    #[test]
    fn only_lists_are_iterable() {
        assert!(HostValue::list([1i64, 2, 3]).iter().is_ok());
        for value in [
            HostValue::None,
            HostValue::Int(3),
            HostValue::from("abc"),
            HostValue::from(vec![1u8, 2]),
            HostValue::Opaque("handle".into()),
        ] {
            let err = value.iter().err().expect("not iterable");
            assert!(matches!(err, HostError::NotIterable(_)));
        }
    }

    #[test]
    fn iteration_preserves_order() {
        let list = HostValue::list([10i64, 20, 30]);
        let values: Vec<i64> = list.iter().unwrap().filter_map(|v| v.as_int()).collect();
        assert_eq!(values, vec![10, 20, 30]);
        assert_eq!(list.iter().unwrap().len(), 3);
    }

    #[test]
    fn opaque_values_are_not_introspectable() {
        let root = TypeIdentity::root();
        let opaque = HostValue::Opaque("foreign handle".into());
        assert!(matches!(opaque.is_instance(&root), Err(HostError::NotIntrospectable(_))));
        assert!(!HostValue::Int(1).is_instance(&root).unwrap());
    }

    #[test]
    fn conversions() {
        assert_eq!(HostValue::from(u64::MAX).as_int(), Some(i64::MAX));
        assert!(HostValue::from(None::<i64>).is_none());
        assert_eq!(HostValue::from(Some(7u32)).as_int(), Some(7));
        assert_eq!(HostValue::from("x").type_name(), "str");
    }
}
