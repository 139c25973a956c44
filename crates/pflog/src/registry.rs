//! Registry of live logging interfaces.
//!
//! The unit map is an immutable snapshot behind an [`ArcSwap`]. Lookups used
//! by the injection path load the current snapshot without locking. Create,
//! destroy and teardown serialize on a control-plane mutex, build a new map
//! and publish it with a single store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;

use crate::config::PflogConfig;
use crate::error::{Error, Result};
use crate::interface::{ControlRequest, InterfaceId, PseudoInterface};

type UnitMap = BTreeMap<u32, Arc<PseudoInterface>>;

/// Collection of live interfaces keyed by unit.
#[derive(Debug)]
pub struct InterfaceRegistry {
    config: PflogConfig,
    units: ArcSwap<UnitMap>,
    control: Mutex<()>,
}

impl InterfaceRegistry {
    /// Create an empty registry.
    pub fn new(config: PflogConfig) -> Self {
        Self {
            config,
            units: ArcSwap::from_pointee(BTreeMap::new()),
            control: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &PflogConfig {
        &self.config
    }

    fn control_plane(&self) -> MutexGuard<'_, ()> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an interface.
    ///
    /// With `None` the lowest free unit is used.
    pub fn create(&self, unit: Option<u32>) -> Result<Arc<PseudoInterface>> {
        let _cp = self.control_plane();
        let current = self.units.load_full();

        let unit = match unit {
            Some(unit) => unit,
            None => lowest_free(&current, self.config.max_unit).ok_or_else(|| {
                Error::ResourceExhausted(format!("no free unit up to {}", self.config.max_unit))
            })?,
        };
        if let Some(existing) = current.get(&unit) {
            return Err(Error::AlreadyExists {
                name: existing.name().to_string(),
            });
        }
        if unit > self.config.max_unit {
            return Err(Error::ResourceExhausted(format!(
                "unit {} above maximum {}",
                unit, self.config.max_unit
            )));
        }
        if current.len() >= self.config.max_interfaces {
            return Err(Error::ResourceExhausted(format!(
                "interface limit {} reached",
                self.config.max_interfaces
            )));
        }

        let ifp = Arc::new(PseudoInterface::new(
            &self.config.name,
            unit,
            self.config.mtu,
            self.config.queue_len,
        ));
        let mut next = (*current).clone();
        next.insert(unit, Arc::clone(&ifp));
        self.units.store(Arc::new(next));

        tracing::info!(interface = %ifp.name(), mtu = ifp.mtu(), "created");
        Ok(ifp)
    }

    /// Destroy an interface.
    ///
    /// The instance is marked dead before the new map is published, so an
    /// injection holding an older snapshot fails with `NotFound`.
    pub fn destroy(&self, unit: u32) -> Result<()> {
        let _cp = self.control_plane();
        let mut next = (*self.units.load_full()).clone();
        let ifp = next.remove(&unit).ok_or(Error::NotFound { unit })?;
        ifp.mark_dead();
        self.units.store(Arc::new(next));
        Self::release(&ifp);
        Ok(())
    }

    fn release(ifp: &PseudoInterface) {
        ifp.drain_and_discard();
        ifp.detach();
        tracing::info!(interface = %ifp.name(), "destroyed");
    }

    /// Apply a control request to one interface.
    pub fn configure(&self, unit: u32, request: ControlRequest) -> Result<()> {
        let _cp = self.control_plane();
        self.get(unit)?.configure(request)
    }

    /// Look up a live interface.
    pub fn get(&self, unit: u32) -> Result<Arc<PseudoInterface>> {
        self.units
            .load()
            .get(&unit)
            .cloned()
            .ok_or(Error::NotFound { unit })
    }

    /// The interface used when injection names no unit: the lowest live unit.
    pub fn pick_default(&self) -> Result<Arc<PseudoInterface>> {
        self.units
            .load()
            .values()
            .next()
            .cloned()
            .ok_or(Error::NoDefaultInterface)
    }

    /// Resolve an optional unit to an interface.
    pub fn resolve(&self, unit: Option<u32>) -> Result<Arc<PseudoInterface>> {
        match unit {
            Some(unit) => self.get(unit),
            None => self.pick_default(),
        }
    }

    /// Identities of all live interfaces, in unit order.
    pub fn list(&self) -> Vec<InterfaceId> {
        self.units.load().values().map(|ifp| ifp.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.units.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.load().is_empty()
    }

    /// Destroy every remaining interface. Returns how many were destroyed.
    pub fn teardown(&self) -> usize {
        let _cp = self.control_plane();
        let drained = self.units.swap(Arc::new(BTreeMap::new()));
        let count = drained.len();
        for ifp in drained.values() {
            ifp.mark_dead();
            Self::release(ifp);
        }
        count
    }
}

fn lowest_free(units: &UnitMap, max_unit: u32) -> Option<u32> {
    let mut candidate = 0u32;
    for &unit in units.keys() {
        if unit != candidate {
            break;
        }
        candidate = candidate.checked_add(1)?;
    }
    (candidate <= max_unit).then_some(candidate)
}
