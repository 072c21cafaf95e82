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

//! Picks the device a runtime should use.

use crate::error::HostError;
use crate::host::{FromHostValue, HostObject};

/// Ranking key of a device: hardware beats software, discrete beats
/// integrated, then more dedicated video memory wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeviceRank {
    /// Backed by real hardware.
    pub is_hardware: bool,
    /// A discrete adapter.
    pub is_discrete: bool,
    /// Dedicated video memory in bytes.
    pub dedicated_video_memory: u64,
}

impl DeviceRank {
    /// Reads the ranking attributes off a device object.
    pub fn of(device: &HostObject) -> Result<Self, HostError> {
        Ok(Self {
            is_hardware: bool::from_host(&device.getattr("is_hardware")?, "is_hardware")?,
            is_discrete: bool::from_host(&device.getattr("is_discrete")?, "is_discrete")?,
            dedicated_video_memory: u64::from_host(
                &device.getattr("dedicated_video_memory")?,
                "dedicated_video_memory",
            )?,
        })
    }
}

/// Chooses a device out of `devices`.
///
/// A `pinned` index wins when it is in range and is an error otherwise.
/// Without one, the highest [`DeviceRank`] wins; ties go to the device
/// discovered last.
pub fn best_device(devices: &[HostObject], pinned: Option<usize>) -> Result<HostObject, HostError> {
    if devices.is_empty() {
        return Err(HostError::InvalidValue {
            name: "devices".to_string(),
            reason: "no devices were discovered".to_string(),
        });
    }
    if let Some(index) = pinned {
        return devices
            .get(index)
            .cloned()
            .ok_or_else(|| HostError::InvalidValue {
                name: "device_index".to_string(),
                reason: format!("{index} is out of range for {} device(s)", devices.len()),
            });
    }

    let mut best: Option<(DeviceRank, &HostObject)> = None;
    for device in devices {
        let rank = DeviceRank::of(device)?;
        if best.as_ref().map_or(true, |(current, _)| rank >= *current) {
            best = Some((rank, device));
        }
    }
    match best {
        Some((rank, device)) => {
            log::debug!("Selected device {device:?} ({rank:?})");
            Ok(device.clone())
        }
        None => Err(HostError::InvalidValue {
            name: "devices".to_string(),
            reason: "no devices were discovered".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendLifecycle, BackendModule, EntityKind};
    use crate::host::{AttributeDef, HostRuntime, TypeSpec};
    use crate::testing;
    use std::sync::Arc;

    fn adapter_spec() -> TypeSpec {
        TypeSpec::of::<DeviceRank>("An adapter with fixed ranking attributes.")
            .destructor(testing::release_any)
            .attribute(AttributeDef::new("is_hardware", "", |object| {
                Ok(object.downcast::<DeviceRank>()?.is_hardware.into())
            }))
            .attribute(AttributeDef::new("is_discrete", "", |object| {
                Ok(object.downcast::<DeviceRank>()?.is_discrete.into())
            }))
            .attribute(AttributeDef::new("dedicated_video_memory", "", |object| {
                Ok(object.downcast::<DeviceRank>()?.dedicated_video_memory.into())
            }))
    }

    fn load_adapters() -> (BackendLifecycle, Arc<BackendModule>) {
        let mut lifecycle = BackendLifecycle::new(Arc::new(HostRuntime::new()));
        let descriptor =
            testing::descriptor("adapters").with_entity(EntityKind::Device, adapter_spec());
        let module = lifecycle.load(descriptor).unwrap();
        (lifecycle, module)
    }

    fn adapter(module: &Arc<BackendModule>, hardware: bool, discrete: bool, memory: u64) -> HostObject {
        let rank = DeviceRank {
            is_hardware: hardware,
            is_discrete: discrete,
            dedicated_video_memory: memory,
        };
        module.instantiate(EntityKind::Device, rank).unwrap()
    }

    #[test]
    fn highest_rank_wins() {
        let (_lifecycle, module) = load_adapters();
        let integrated = adapter(&module, true, false, 1 << 34);
        let discrete = adapter(&module, true, true, 1 << 30);
        let software = adapter(&module, false, false, 0);
        let devices = [integrated, discrete.clone(), software];
        assert!(best_device(&devices, None).unwrap().ptr_eq(&discrete));
    }

    #[test]
    fn ties_go_to_the_last_device() {
        let (_lifecycle, module) = load_adapters();
        let first = adapter(&module, false, false, 0);
        let second = adapter(&module, false, false, 0);
        let worse = adapter(&module, false, false, 0);
        let devices = [first.clone(), second.clone()];
        assert!(best_device(&devices, None).unwrap().ptr_eq(&second));

        let big = adapter(&module, true, true, 1 << 32);
        let also_big = adapter(&module, true, true, 1 << 32);
        let devices = [big, also_big.clone(), worse];
        assert!(best_device(&devices, None).unwrap().ptr_eq(&also_big));

        assert!(best_device(&[first.clone()], None).unwrap().ptr_eq(&first));
    }

    #[test]
    fn pinned_index_overrides_rank() {
        let (_lifecycle, module) = load_adapters();
        let weak = adapter(&module, false, false, 0);
        let strong = adapter(&module, true, true, 1 << 33);
        let devices = [weak.clone(), strong];
        assert!(best_device(&devices, Some(0)).unwrap().ptr_eq(&weak));
        assert!(best_device(&devices, Some(2)).is_err());
    }

    #[test]
    fn ranks_order_hardware_then_discrete_then_memory() {
        let software = DeviceRank {
            is_hardware: false,
            is_discrete: true,
            dedicated_video_memory: u64::MAX,
        };
        let integrated = DeviceRank {
            is_hardware: true,
            is_discrete: false,
            dedicated_video_memory: 1 << 34,
        };
        let small = DeviceRank {
            is_hardware: true,
            is_discrete: true,
            dedicated_video_memory: 1 << 30,
        };
        let large = DeviceRank {
            dedicated_video_memory: 1 << 33,
            ..small
        };
        let mut ranks = vec![large, software, small, integrated];
        ranks.sort();
        assert_eq!(ranks, [software, integrated, small, large]);
    }

    #[test]
    fn empty_and_out_of_range() {
        assert!(matches!(
            best_device(&[], None),
            Err(HostError::InvalidValue { ref name, .. }) if name == "devices"
        ));
        assert!(matches!(
            best_device(&[], Some(0)),
            Err(HostError::InvalidValue { .. })
        ));
    }
}
