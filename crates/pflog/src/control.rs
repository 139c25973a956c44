//! Control surface: the operations external callers invoke.
//!
//! Every call forwards to the registry or to one interface and returns its
//! outcome unchanged. There is no state here beyond the registry handle.

use std::sync::Arc;

use bytes::Bytes;

use crate::consumer::CaptureConsumer;
use crate::decision::Decision;
use crate::error::Result;
use crate::interface::{
    ControlRequest, Delivery, InterfaceId, RouteEntry, RouteRequest, StatsSnapshot,
};
use crate::registry::InterfaceRegistry;

/// Cheap, cloneable handle for driving logging interfaces.
#[derive(Debug, Clone)]
pub struct Control {
    registry: Arc<InterfaceRegistry>,
}

impl Control {
    pub fn new(registry: Arc<InterfaceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }

    /// Clone-create an interface. `None` picks the lowest free unit.
    pub fn create(&self, unit: Option<u32>) -> Result<InterfaceId> {
        self.registry.create(unit).map(|ifp| ifp.id())
    }

    /// Clone-destroy an interface.
    pub fn destroy(&self, unit: u32) -> Result<()> {
        self.registry.destroy(unit)
    }

    pub fn configure(&self, unit: u32, request: ControlRequest) -> Result<()> {
        self.registry.configure(unit, request)
    }

    /// Log a packet via `unit`, or via the default interface when `None`.
    pub fn inject(
        &self,
        unit: Option<u32>,
        packet: &[u8],
        decision: &Decision,
    ) -> Result<Delivery> {
        self.registry.resolve(unit)?.inject(packet, decision)
    }

    /// Discard everything queued for transmission on `unit`.
    pub fn drain(&self, unit: u32) -> Result<usize> {
        Ok(self.registry.get(unit)?.drain_and_discard())
    }

    /// Queue a unit for transmission on `unit`.
    pub fn enqueue(&self, unit: u32, packet: Bytes) -> Result<bool> {
        Ok(self.registry.get(unit)?.enqueue(packet))
    }

    /// Send a packet out through `unit`; it is discarded.
    pub fn output(&self, unit: u32, packet: Bytes) -> Result<()> {
        self.registry.get(unit)?.output(packet);
        Ok(())
    }

    pub fn route_mtu_hint(
        &self,
        unit: u32,
        request: RouteRequest,
        route: Option<&mut RouteEntry>,
    ) -> Result<()> {
        self.registry.get(unit)?.route_mtu_hint(request, route);
        Ok(())
    }

    pub fn attach(&self, unit: u32, consumer: &Arc<dyn CaptureConsumer>) -> Result<()> {
        self.registry.get(unit)?.attach(consumer);
        Ok(())
    }

    pub fn detach(&self, unit: u32) -> Result<()> {
        self.registry.get(unit)?.detach();
        Ok(())
    }

    pub fn stats(&self, unit: u32) -> Result<StatsSnapshot> {
        Ok(self.registry.get(unit)?.stats())
    }

    pub fn list(&self) -> Vec<InterfaceId> {
        self.registry.list()
    }
}
