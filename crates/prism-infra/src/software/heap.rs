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

//! Heaps and resource placement.

use super::{code_arg, debug_message, native_arg, release, to_index, Memory, MAX_ALLOCATION};
use prism_core::api::HeapKind;
use prism_core::backend::{BackendModule, EntityKind};
use prism_core::error::{ErrorCategoryKind, HostError};
use prism_core::host::{Args, AttributeDef, HostObject, HostValue, Native, TypeSpec};
use std::sync::{Arc, Mutex};

/// A block of emulated device memory resources can be placed into.
#[derive(Debug)]
pub struct SoftwareHeap {
    heap_type: HeapKind,
    size: u64,
    memory: Memory,
}

impl SoftwareHeap {
    /// The memory kind of the heap.
    pub fn heap_type(&self) -> HeapKind {
        self.heap_type
    }

    /// The heap size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

pub(super) fn spec() -> TypeSpec {
    TypeSpec::of::<SoftwareHeap>("A region of device memory resources can be placed into.")
        .destructor(release::<SoftwareHeap>)
        .attribute(AttributeDef::new("size", "Heap size in bytes.", |object| {
            HostValue::checked_int(object.downcast::<SoftwareHeap>()?.size, "size")
        }))
        .attribute(AttributeDef::new("heap_type", "The heap kind code.", |object| {
            Ok(HostValue::from(object.downcast::<SoftwareHeap>()?.heap_type.code()))
        }))
}

/// `Device.create_heap(heap_type, size)`
pub(super) fn create(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let heap_type: HeapKind = code_arg(module, ErrorCategoryKind::Heap, args, 0, "heap_type", None)?;
    let size: u64 = args.required(1, "size")?;
    if size == 0 {
        return Err(module.raise(ErrorCategoryKind::Heap, "heap size must be non-zero"));
    }
    if size > MAX_ALLOCATION {
        return Err(module.raise(
            ErrorCategoryKind::Heap,
            format!("cannot allocate a heap of {size} bytes"),
        ));
    }
    let len = to_index(module, ErrorCategoryKind::Heap, size)?;
    let heap = SoftwareHeap {
        heap_type,
        size,
        memory: Arc::new(Mutex::new(vec![0; len])),
    };
    debug_message(module, || format!("Created {heap_type} heap of {size} bytes"));
    Ok(module.instantiate(EntityKind::Heap, heap)?.into())
}

/// Where a resource's bytes live.
#[derive(Debug)]
pub(crate) struct Allocation {
    pub memory: Memory,
    pub offset: u64,
    /// Keeps the heap a placed resource lives in alive.
    pub heap: Option<HostObject>,
}

/// Reads the optional `heap`/`heap_offset` argument pair.
pub(super) fn placement_args(
    module: &BackendModule,
    args: &Args,
    heap_index: usize,
) -> Result<Option<(Native<SoftwareHeap>, u64)>, HostError> {
    let Some(value) = args.present(heap_index, "heap") else {
        return Ok(None);
    };
    let heap = native_arg::<SoftwareHeap>(module, EntityKind::Heap, value)?;
    let offset: u64 = args.or(heap_index + 1, "heap_offset", 0)?;
    Ok(Some((heap, offset)))
}

/// Allocates `size` bytes of `heap_type` memory, either fresh or inside the
/// given heap.
///
/// Size limits are reported under `category`; placement failures under
/// `HeapError`.
pub(super) fn allocate(
    module: &BackendModule,
    category: ErrorCategoryKind,
    heap_type: HeapKind,
    size: u64,
    placement: Option<(Native<SoftwareHeap>, u64)>,
) -> Result<Allocation, HostError> {
    if size > MAX_ALLOCATION {
        return Err(module.raise(category, format!("cannot allocate {size} bytes")));
    }
    let Some((heap, offset)) = placement else {
        let len = to_index(module, category, size)?;
        return Ok(Allocation {
            memory: Arc::new(Mutex::new(vec![0; len])),
            offset: 0,
            heap: None,
        });
    };

    if heap.heap_type != heap_type {
        return Err(module.raise(
            ErrorCategoryKind::Heap,
            format!(
                "cannot place a {heap_type} resource in a {} heap",
                heap.heap_type
            ),
        ));
    }
    let fits = offset
        .checked_add(size)
        .is_some_and(|end| end <= heap.size);
    if !fits {
        return Err(module.raise(
            ErrorCategoryKind::Heap,
            format!(
                "{size} bytes at offset {offset} do not fit in a heap of {} bytes",
                heap.size
            ),
        ));
    }
    Ok(Allocation {
        memory: Arc::clone(&heap.memory),
        offset,
        heap: Some(heap.into_object()),
    })
}
