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

//! The runtime: loads the configured backend on first use and tracks the
//! current device.

use anyhow::{anyhow, Context, Result};
use prism_core::backend::{BackendDescriptor, BackendLifecycle, BackendModule};
use prism_core::config::RuntimeConfig;
use prism_core::host::{Args, FromHostValue, HostObject, HostRuntime, HostValue};
use prism_core::selection::best_device;
use std::sync::Arc;

/// Names of the backends compiled into this crate.
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = Vec::new();
    #[cfg(feature = "software")]
    backends.push(crate::software::NAME);
    #[cfg(feature = "null")]
    backends.push(crate::null::NAME);
    backends
}

/// Builds the descriptor of the backend called `name`.
pub fn descriptor_for(name: &str) -> Result<BackendDescriptor> {
    let descriptor = match name {
        #[cfg(feature = "software")]
        crate::software::NAME => crate::software::descriptor()?,
        #[cfg(feature = "null")]
        crate::null::NAME => crate::null::descriptor()?,
        other => {
            return Err(anyhow!(
                "Unknown backend '{other}' (available: {})",
                available_backends().join(", ")
            ))
        }
    };
    Ok(descriptor)
}

/// Owns one loaded backend and the device selection state on top of it.
///
/// Nothing is loaded until a backend or device is first asked for.
#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    lifecycle: BackendLifecycle,
    module: Option<Arc<BackendModule>>,
    devices: Option<Vec<HostObject>>,
    current: Option<HostObject>,
}

impl Runtime {
    /// Creates a runtime with its own host namespace.
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_host(config, Arc::new(HostRuntime::new()))
    }

    /// Creates a runtime registering its backend into a shared `host`.
    pub fn with_host(config: RuntimeConfig, host: Arc<HostRuntime>) -> Self {
        Self {
            config,
            lifecycle: BackendLifecycle::new(host),
            module: None,
            devices: None,
            current: None,
        }
    }

    /// Creates a runtime from the default configuration and the `PRISM_*`
    /// environment variables.
    pub fn from_env() -> Result<Self> {
        let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;
        Ok(Self::new(config))
    }

    /// The configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The host namespace the backend registers into.
    pub fn host(&self) -> &Arc<HostRuntime> {
        self.lifecycle.host()
    }

    /// The backend module, loading it on first use.
    pub fn backend(&mut self) -> Result<Arc<BackendModule>> {
        if let Some(module) = &self.module {
            return Ok(Arc::clone(module));
        }
        let descriptor = descriptor_for(&self.config.backend)?;
        let module = self
            .lifecycle
            .load(descriptor)
            .with_context(|| format!("Failed to load backend '{}'", self.config.backend))?;
        if self.config.debug {
            module
                .call("enable_debug", &Args::new())
                .context("Failed to enable backend debugging")?;
        }
        self.module = Some(Arc::clone(&module));
        Ok(module)
    }

    /// Every device the backend discovered. Queried once, then cached.
    pub fn discovered_devices(&mut self) -> Result<Vec<HostObject>> {
        if let Some(devices) = &self.devices {
            return Ok(devices.clone());
        }
        let module = self.backend()?;
        let listed = module
            .call("get_discovered_devices", &Args::new())
            .context("Device discovery failed")?;
        let devices: Vec<HostObject> = list_of(&listed, "device")?;
        log::info!(
            "Backend '{}' discovered {} device(s)",
            module.name(),
            devices.len()
        );
        self.devices = Some(devices.clone());
        Ok(devices)
    }

    /// Makes the device at discovery `index` the current one.
    pub fn set_current_device(&mut self, index: usize) -> Result<()> {
        let devices = self.discovered_devices()?;
        let device = devices
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("Device index {index} is out of range for {} device(s)", devices.len()))?;
        self.current = Some(device);
        Ok(())
    }

    /// The current device, picking the best one on first use.
    pub fn current_device(&mut self) -> Result<HostObject> {
        if let Some(device) = &self.current {
            return Ok(device.clone());
        }
        let devices = self.discovered_devices()?;
        let device = best_device(&devices, self.config.device_index)
            .context("No usable device")?;
        log::info!("Using device {}", device.getattr("name")?.as_str().unwrap_or("<unnamed>"));
        self.current = Some(device.clone());
        Ok(device)
    }

    /// Drains the current device's debug messages.
    pub fn debug_messages(&mut self) -> Result<Vec<String>> {
        let device = self.current_device()?;
        let messages = device.call("get_debug_messages", &Args::new())?;
        list_of(&messages, "message")
    }

    /// Releases the devices and tears the backend down. The runtime can load
    /// again afterwards.
    pub fn shutdown(&mut self) {
        if self.module.is_none() {
            return;
        }
        if self.config.debug {
            match self.debug_messages() {
                Ok(messages) => {
                    for message in messages {
                        log::debug!("{message}");
                    }
                }
                Err(err) => log::warn!("Could not collect debug messages: {err:#}"),
            }
        }
        self.current = None;
        self.devices = None;
        self.module = None;
        self.lifecycle.teardown();
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn list_of<T: FromHostValue>(value: &HostValue, name: &str) -> Result<Vec<T>> {
    Ok(value
        .iter()?
        .map(|item| T::from_host(&item, name))
        .collect::<Result<Vec<_>, _>>()?)
}
