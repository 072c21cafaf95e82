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

//! A minimal, complete backend used by the unit tests of this crate.

use crate::backend::{BackendDescriptor, BackendLifecycle, BackendModule, EntityKind};
use crate::error::HostError;
use crate::host::{
    Args, AttributeDef, FunctionDef, FunctionTable, HostObject, HostRuntime, HostValue, NativeBox,
    OperationDef, TypeSpec,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The native object behind every fixture instance.
pub(crate) struct Tracked {
    pub id: i64,
    released: Arc<AtomicUsize>,
}

impl Tracked {
    /// A fixture whose release nobody counts.
    pub fn detached(id: i64) -> Self {
        Self {
            id,
            released: Arc::new(AtomicUsize::new(0)),
        }
    }
}

pub(crate) fn release_tracked(native: NativeBox) {
    if let Ok(tracked) = native.downcast::<Tracked>() {
        tracked.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn release_any(native: NativeBox) {
    drop(native);
}

fn tracked_id(object: &HostObject) -> Result<HostValue, HostError> {
    Ok(HostValue::Int(object.downcast::<Tracked>()?.id))
}

fn tracked_double(object: &HostObject, _args: &Args) -> Result<HostValue, HostError> {
    Ok(HostValue::Int(object.downcast::<Tracked>()?.id * 2))
}

pub(crate) fn ping(_module: &Arc<BackendModule>, _args: &Args) -> Result<HostValue, HostError> {
    Ok(HostValue::from("pong"))
}

fn count(module: &Arc<BackendModule>, _args: &Args) -> Result<HostValue, HostError> {
    let counter = module
        .state::<AtomicUsize>()
        .ok_or_else(|| HostError::ModuleUnloaded(module.path().to_string()))?;
    Ok(HostValue::from(counter.fetch_add(1, Ordering::SeqCst) + 1))
}

pub(crate) fn entity_spec(kind: EntityKind) -> TypeSpec {
    TypeSpec::of::<Tracked>(format!("Test {kind}."))
        .destructor(release_tracked)
        .attribute(AttributeDef::new("id", "Fixture id.", tracked_id))
        .operation(OperationDef::new("double", "Twice the id.", tracked_double).uses(&["id"]))
}

pub(crate) fn descriptor(name: &str) -> BackendDescriptor {
    let functions = FunctionTable::new()
        .with(FunctionDef::new("ping", "Answers.", ping))
        .with(FunctionDef::new("count", "Bumps the module counter.", count));
    let mut descriptor = match BackendDescriptor::new(name, functions) {
        Ok(descriptor) => descriptor,
        Err(err) => panic!("fixture backend name '{name}' rejected: {err}"),
    };
    for kind in EntityKind::ALL {
        descriptor.set_entity(kind, entity_spec(kind));
    }
    descriptor.with_state(AtomicUsize::new(0))
}

/// A loaded fixture backend.
pub(crate) struct Fixture {
    pub lifecycle: BackendLifecycle,
    pub module: Arc<BackendModule>,
    pub released: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn instantiate(&self, kind: EntityKind, id: i64) -> HostObject {
        let tracked = Tracked {
            id,
            released: Arc::clone(&self.released),
        };
        match self.module.instantiate(kind, tracked) {
            Ok(object) => object,
            Err(err) => panic!("cannot instantiate fixture {kind}: {err}"),
        }
    }
}

pub(crate) fn load_fixture(name: &str) -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut lifecycle = BackendLifecycle::new(Arc::new(HostRuntime::new()));
    let module = match lifecycle.load(descriptor(name)) {
        Ok(module) => module,
        Err(err) => panic!("fixture backend '{name}' failed to load: {err}"),
    };
    Fixture {
        lifecycle,
        module,
        released: Arc::new(AtomicUsize::new(0)),
    }
}
