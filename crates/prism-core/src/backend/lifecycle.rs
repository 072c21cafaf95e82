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

//! Loads a backend descriptor into a host runtime, and tears it down again.

use crate::backend::descriptor::{BackendDescriptor, DescriptorParts};
use crate::backend::entity::{EntityKind, EntityMap};
use crate::backend::module::BackendModule;
use crate::error::RegistrationError;
use crate::host::{HostRuntime, TypeHandle};
use std::sync::Arc;
use uuid::Uuid;

/// Where a [`BackendLifecycle`] is in its load/teardown cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing is registered.
    Unloaded,
    /// The type of the given kind is being finalized and registered.
    Registering(EntityKind),
    /// All six types and the module are registered.
    Live,
    /// Teardown is in progress.
    Unregistering,
}

/// Owns the registration state of one backend module.
///
/// Several lifecycle managers may share a host runtime, one per backend. A
/// module is either fully registered or not registered at all.
#[derive(Debug)]
pub struct BackendLifecycle {
    host: Arc<HostRuntime>,
    state: LifecycleState,
    module: Option<Arc<BackendModule>>,
}

impl BackendLifecycle {
    /// Creates a manager registering into `host`.
    pub fn new(host: Arc<HostRuntime>) -> Self {
        Self {
            host,
            state: LifecycleState::Unloaded,
            module: None,
        }
    }

    /// The host runtime this manager registers into.
    pub fn host(&self) -> &Arc<HostRuntime> {
        &self.host
    }

    /// The current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The live module, if any.
    pub fn module(&self) -> Option<&Arc<BackendModule>> {
        self.module.as_ref()
    }

    /// Registers every type of `descriptor`, then the module and its error
    /// categories.
    ///
    /// On failure everything this call registered is removed again and the
    /// manager is back in [`LifecycleState::Unloaded`].
    pub fn load(
        &mut self,
        descriptor: BackendDescriptor,
    ) -> Result<Arc<BackendModule>, RegistrationError> {
        if let Some(module) = &self.module {
            return Err(RegistrationError::AlreadyLoaded(module.path().to_string()));
        }
        log::info!("Loading backend module '{}'", descriptor.path());
        if let Err(err) = descriptor.validate() {
            log::error!("Backend descriptor '{}' is invalid: {err}", descriptor.path());
            return Err(err);
        }

        let mut parts = descriptor.into_parts();
        let mut registered: Vec<TypeHandle> = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            self.state = LifecycleState::Registering(kind);
            match self.register_entity(&mut parts, kind) {
                Ok(ty) => registered.push(ty),
                Err(err) => {
                    self.roll_back(&parts.path, &registered, &err);
                    return Err(err);
                }
            }
        }

        let types = EntityMap::from_fn(|kind| Arc::clone(&registered[kind.index()]));
        let module = Arc::new(BackendModule::new(parts, types, Uuid::new_v4()));
        if let Err(err) = self.host.register_module(Arc::clone(&module)) {
            self.roll_back(module.path(), &registered, &err);
            return Err(err);
        }

        log::info!(
            "Backend module '{}' is live (instance {})",
            module.path(),
            module.instance()
        );
        self.state = LifecycleState::Live;
        self.module = Some(Arc::clone(&module));
        Ok(module)
    }

    fn register_entity(
        &self,
        parts: &mut DescriptorParts,
        kind: EntityKind,
    ) -> Result<TypeHandle, RegistrationError> {
        let spec = parts.entities[kind]
            .take()
            .ok_or_else(|| RegistrationError::MissingEntity {
                backend: parts.name.clone(),
                kind,
            })?;
        let ty = spec.finalize(self.host.root_type())?;
        self.host.register_type(Arc::clone(&ty))?;
        Ok(ty)
    }

    fn roll_back(&mut self, path: &str, registered: &[TypeHandle], err: &RegistrationError) {
        log::warn!(
            "Registration of '{path}' failed at {:?}: {err}; removing {} registered type(s)",
            self.state,
            registered.len()
        );
        for ty in registered.iter().rev() {
            self.host.unregister_type(ty);
        }
        self.state = LifecycleState::Unloaded;
    }

    /// Unregisters the module, its categories and its types and releases the
    /// backend state. Does nothing if no module is live.
    ///
    /// Host objects created before teardown stay usable; their module handle
    /// keeps the type identities alive.
    pub fn teardown(&mut self) {
        let Some(module) = self.module.take() else {
            return;
        };
        self.state = LifecycleState::Unregistering;
        log::info!("Tearing down backend module '{}'", module.path());

        self.host.unregister_module(module.path());
        for kind in EntityKind::ALL.into_iter().rev() {
            self.host.unregister_type(module.entity_type(kind));
        }
        drop(module.mark_unloaded());

        self.state = LifecycleState::Unloaded;
    }
}

impl Drop for BackendLifecycle {
    fn drop(&mut self) {
        self.teardown();
    }
}
