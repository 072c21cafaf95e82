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

//! The six entity kinds every backend provides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the six object kinds a backend exposes to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A physical or emulated device.
    Device,
    /// A buffer or texture.
    Resource,
    /// A presentation surface.
    Swapchain,
    /// A compute pipeline with its bound resources.
    Compute,
    /// A texture sampler.
    Sampler,
    /// A device memory region resources can be placed into.
    Heap,
}

impl EntityKind {
    /// Every kind, in registration order.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Device,
        EntityKind::Resource,
        EntityKind::Swapchain,
        EntityKind::Compute,
        EntityKind::Sampler,
        EntityKind::Heap,
    ];

    /// The unqualified type name, e.g. `Resource`.
    pub const fn name(self) -> &'static str {
        match self {
            EntityKind::Device => "Device",
            EntityKind::Resource => "Resource",
            EntityKind::Swapchain => "Swapchain",
            EntityKind::Compute => "Compute",
            EntityKind::Sampler => "Sampler",
            EntityKind::Heap => "Heap",
        }
    }

    /// Position in [`EntityKind::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-size table holding one value per entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMap<T>([T; 6]);

impl<T> EntityMap<T> {
    /// Builds the table by calling `f` for every kind in registration order.
    pub fn from_fn(mut f: impl FnMut(EntityKind) -> T) -> Self {
        Self(EntityKind::ALL.map(&mut f))
    }

    /// Iterates `(kind, value)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &T)> {
        EntityKind::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T: Default> Default for EntityMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<EntityKind> for EntityMap<T> {
    type Output = T;

    fn index(&self, kind: EntityKind) -> &T {
        &self.0[kind.index()]
    }
}

impl<T> IndexMut<EntityKind> for EntityMap<T> {
    fn index_mut(&mut self, kind: EntityKind) -> &mut T {
        &mut self.0[kind.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_order_matches_indices() {
        for (position, kind) in EntityKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
    }

    #[test]
    fn map_is_indexed_by_kind() {
        let mut map = EntityMap::from_fn(|kind| kind.name().len());
        assert_eq!(map[EntityKind::Swapchain], 9);
        map[EntityKind::Heap] = 0;
        let collected: Vec<_> = map.iter().map(|(kind, len)| (kind, *len)).collect();
        assert_eq!(collected.last(), Some(&(EntityKind::Heap, 0)));
        assert_eq!(collected.len(), 6);
    }

    #[test]
    fn serializes_by_name() {
        assert_eq!(serde_json::to_string(&EntityKind::Compute).unwrap(), "\"Compute\"");
    }
}
