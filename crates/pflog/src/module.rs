//! Load and unload of the logging module.

use std::sync::Arc;

use crate::config::PflogConfig;
use crate::control::Control;
use crate::error::Result;
use crate::registry::InterfaceRegistry;

/// A loaded pflog module: the registry plus its lifecycle.
///
/// Dropping a loaded module tears down every interface, same as
/// [`unload`](Self::unload).
#[derive(Debug)]
pub struct PflogModule {
    registry: Arc<InterfaceRegistry>,
}

impl PflogModule {
    /// Validate `config`, build the registry and create the initial units.
    pub fn load(config: PflogConfig) -> Result<Self> {
        config.validate()?;
        let initial = config.initial_units;
        let module = Self {
            registry: Arc::new(InterfaceRegistry::new(config)),
        };
        for unit in 0..initial {
            module.registry.create(Some(unit))?;
        }
        tracing::info!(
            name = %module.registry.config().name,
            interfaces = initial,
            "pflog module loaded"
        );
        Ok(module)
    }

    pub fn control(&self) -> Control {
        Control::new(Arc::clone(&self.registry))
    }

    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }

    /// Destroy all interfaces. Returns how many were destroyed.
    pub fn unload(self) -> usize {
        let destroyed = self.registry.teardown();
        tracing::info!(destroyed, "pflog module unloaded");
        destroyed
    }
}

impl Drop for PflogModule {
    fn drop(&mut self) {
        let destroyed = self.registry.teardown();
        if destroyed > 0 {
            tracing::info!(destroyed, "pflog module unloaded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_load_creates_initial_units() {
        let module = PflogModule::load(PflogConfig {
            initial_units: 2,
            ..Default::default()
        })
        .unwrap();
        let names: Vec<_> = module.control().list().into_iter().map(|id| id.name).collect();
        assert_eq!(names, ["pflog0", "pflog1"]);
        assert_eq!(module.unload(), 2);
    }

    #[test]
    fn test_load_without_units() {
        let module = PflogModule::load(PflogConfig {
            initial_units: 0,
            ..Default::default()
        })
        .unwrap();
        assert!(module.registry().is_empty());
    }

    #[test]
    fn test_load_rejects_bad_config() {
        let err = PflogModule::load(PflogConfig {
            name: String::new(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_control_outlives_module() {
        let module = PflogModule::load(PflogConfig::default()).unwrap();
        let control = module.control();
        drop(module);
        assert!(control.list().is_empty());
        assert!(control.destroy(0).unwrap_err().is_not_found());
    }
}
