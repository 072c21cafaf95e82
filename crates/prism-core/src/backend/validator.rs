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

//! The resource list validator.
//!
//! Every operation that binds a list of resources (or samplers) funnels the
//! caller's argument through [`collect_native`], which turns an arbitrary host
//! value into an ordered, fully type-checked array of native views.

use crate::error::HostError;
use crate::host::{HostValue, Native, TypeIdentity};
use std::any::Any;

fn mismatch(expected: &TypeIdentity, found: &HostValue) -> HostError {
    HostError::TypeMismatch {
        expected: expected.name().to_string(),
        found: found.type_name(),
    }
}

/// Converts an optional collection into natives of type `T`.
///
/// * `None` yields an empty array.
/// * A value that cannot be iterated fails before any element is looked at.
/// * Each element must pass the instance check against `expected`; the first
///   that does not aborts the whole call, as does an element whose type cannot
///   be determined.
///
/// The output preserves input order, and nothing partial is ever returned.
/// Elements are cloned out of the collection one at a time; on failure the
/// clones taken so far are dropped, leaving every reference count as it was.
pub fn collect_native<T: Any>(
    expected: &TypeIdentity,
    values: Option<&HostValue>,
) -> Result<Vec<Native<T>>, HostError> {
    let Some(values) = values else {
        return Ok(Vec::new());
    };
    let items = values.iter()?;
    let mut natives = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_instance(expected)? {
            return Err(mismatch(expected, &item));
        }
        let native = match &item {
            HostValue::Object(object) => Native::new(object.clone()),
            _ => None,
        };
        natives.push(native.ok_or_else(|| mismatch(expected, &item))?);
    }
    Ok(natives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EntityKind;
    use crate::host::{HostObject, TypeSpec};
    use crate::testing::{self, Fixture, Tracked};

    fn resources(fixture: &Fixture, count: usize) -> Vec<HostObject> {
        (0..count)
            .map(|id| fixture.instantiate(EntityKind::Resource, id as i64))
            .collect()
    }

    fn collect(fixture: &Fixture, values: Option<&HostValue>) -> Result<Vec<Native<Tracked>>, HostError> {
        collect_native(fixture.module.entity_type(EntityKind::Resource), values)
    }

    #[test]
    fn preserves_order() {
        let fixture = testing::load_fixture("order");
        let objects = resources(&fixture, 4);
        let list = HostValue::list(objects.iter().rev());
        let natives = collect(&fixture, Some(&list)).unwrap();
        let ids: Vec<i64> = natives.iter().map(|native| native.id).collect();
        assert_eq!(ids, [3, 2, 1, 0]);
        assert!(natives[0].object().ptr_eq(&objects[3]));
    }

    #[test]
    fn absent_or_empty_input_yields_nothing() {
        let fixture = testing::load_fixture("empty");
        assert!(collect(&fixture, None).unwrap().is_empty());
        assert!(collect(&fixture, Some(&HostValue::list(Vec::<HostValue>::new())))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn fails_fast_at_first_middle_and_last_position() {
        let fixture = testing::load_fixture("mismatch");
        let objects = resources(&fixture, 5);
        let sampler = fixture.instantiate(EntityKind::Sampler, 99);
        for position in [0, 2, 4] {
            let mut items: Vec<HostValue> = objects.iter().map(HostValue::from).collect();
            items[position] = HostValue::from(&sampler);
            let err = collect(&fixture, Some(&HostValue::list(items))).unwrap_err();
            match err {
                HostError::TypeMismatch { expected, found } => {
                    assert_eq!(expected, "Resource");
                    assert_eq!(found, "prism.backends.mismatch.Sampler");
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn plain_values_are_rejected() {
        let fixture = testing::load_fixture("plain");
        let list = HostValue::list([HostValue::Int(1)]);
        let err = collect(&fixture, Some(&list)).unwrap_err();
        assert_eq!(err.to_string(), "expected a Resource object, got 'int'");
    }

    #[test]
    fn non_iterable_input_is_rejected() {
        let fixture = testing::load_fixture("scalar");
        let object = fixture.instantiate(EntityKind::Resource, 1);
        let bare = HostValue::from(&object);
        assert!(matches!(
            collect(&fixture, Some(&bare)),
            Err(HostError::NotIterable(_))
        ));
        assert_eq!(object.ref_count(), 2);
        assert!(matches!(
            collect(&fixture, Some(&HostValue::Int(3))),
            Err(HostError::NotIterable(ref found)) if found == "int"
        ));
    }

    #[test]
    fn inconclusive_checks_propagate() {
        let fixture = testing::load_fixture("opaque");
        let objects = resources(&fixture, 2);
        let list = HostValue::list([
            HostValue::from(&objects[0]),
            HostValue::Opaque("proxy".into()),
            HostValue::from(&objects[1]),
        ]);
        let err = collect(&fixture, Some(&list)).unwrap_err();
        assert!(matches!(err, HostError::NotIntrospectable(ref label) if label == "proxy"));
        assert!(err.is_validation());
    }

    #[test]
    fn reference_counts_are_restored() {
        let fixture = testing::load_fixture("refcounts");
        for size in [0, 1, 5] {
            let objects = resources(&fixture, size);
            let list = HostValue::list(objects.iter());
            let baseline: Vec<usize> = objects.iter().map(HostObject::ref_count).collect();

            let natives = collect(&fixture, Some(&list)).unwrap();
            assert_eq!(natives.len(), size);
            drop(natives);
            let after: Vec<usize> = objects.iter().map(HostObject::ref_count).collect();
            assert_eq!(after, baseline);

            if size > 0 {
                let mut items: Vec<HostValue> = objects.iter().map(HostValue::from).collect();
                items[size - 1] = HostValue::Int(0);
                let failing = HostValue::list(items);
                let baseline: Vec<usize> = objects.iter().map(HostObject::ref_count).collect();
                assert!(collect(&fixture, Some(&failing)).is_err());
                let after: Vec<usize> = objects.iter().map(HostObject::ref_count).collect();
                assert_eq!(after, baseline);
            }
        }
        assert_eq!(fixture.released.load(std::sync::atomic::Ordering::SeqCst), 6);
    }

    #[test]
    fn subtypes_are_accepted() {
        let fixture = testing::load_fixture("subtypes");
        let base = fixture.module.entity_type(EntityKind::Resource);
        let derived = TypeSpec::of::<Tracked>("A specialised resource.")
            .named("Texture", "prism.backends.subtypes.Texture")
            .destructor(testing::release_tracked)
            .finalize(base)
            .unwrap();
        let object = HostObject::new(
            derived,
            fixture.module.clone(),
            Box::new(Tracked::detached(11)),
        );
        let list = HostValue::list([object]);
        let natives = collect(&fixture, Some(&list)).unwrap();
        assert_eq!(natives[0].id, 11);
    }
}
