//! The logging pseudo-interface.
//!
//! A [`PseudoInterface`] is a sink: the packet filter injects decision
//! records into it, it turns them into pflog records for whatever capture
//! consumer is attached, and anything sent out through it is discarded.

use std::collections::VecDeque;
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::consumer::CaptureConsumer;
use crate::decision::Decision;
use crate::error::{Error, Result};
use crate::header::{LogHeader, PFLOG_HDRLEN};

/// Size of an mbuf on the historical host.
const MSIZE: u32 = 256;
/// Data bytes in a plain mbuf.
const MLEN: u32 = MSIZE - 20;
/// Data bytes in a packet-header mbuf.
const MHLEN: u32 = MLEN - 24;

/// Default MTU: room for a 32k packet plus header mbufs.
pub const PFLOG_MTU: u32 = 32768 + MHLEN + MLEN;

/// Default send queue length (`ifqmaxlen`).
pub const DEFAULT_QUEUE_LEN: usize = 50;

/// Interface flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IfFlags(u32);

impl IfFlags {
    /// Administratively up.
    pub const UP: Self = Self(0x1);
    /// Resources allocated; derived from `UP`.
    pub const RUNNING: Self = Self(0x40);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl fmt::Display for IfFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::UP) {
            names.push("UP");
        }
        if self.contains(Self::RUNNING) {
            names.push("RUNNING");
        }
        write!(f, "<{}>", names.join(","))
    }
}

/// Interface control request (the ioctl set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlRequest {
    /// Set the interface address.
    SetAddress(IpAddr),
    /// Add an alias address.
    AddAlias(IpAddr),
    /// Set the point-to-point destination address.
    SetDestination(IpAddr),
    /// Replace the interface flags.
    SetFlags(IfFlags),
    /// Change the MTU. Not supported.
    SetMtu(u32),
    /// Any other request code. Not supported.
    Other(u64),
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetAddress(a) => write!(f, "set address {}", a),
            Self::AddAlias(a) => write!(f, "add alias {}", a),
            Self::SetDestination(a) => write!(f, "set destination {}", a),
            Self::SetFlags(flags) => write!(f, "set flags {:#x}", flags.bits()),
            Self::SetMtu(mtu) => write!(f, "set mtu {}", mtu),
            Self::Other(code) => write!(f, "request {:#x}", code),
        }
    }
}

/// Routing table notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequest {
    Add,
    Change,
    Delete,
}

/// A route pointing at a logging interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub destination: IpAddr,
    pub prefix_len: u8,
    /// Advertised path MTU.
    pub mtu: Option<u32>,
}

impl RouteEntry {
    pub fn new(destination: IpAddr, prefix_len: u8) -> Self {
        Self {
            destination,
            prefix_len,
            mtu: None,
        }
    }
}

/// Outcome of a successful injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The consumer accepted the record.
    Delivered,
    /// Nobody is listening; nothing was produced.
    NoConsumer,
    /// The consumer refused the record; counted as a drop.
    Dropped,
}

/// Per-interface counters.
#[derive(Debug, Default)]
struct InterfaceStats {
    delivered: AtomicU64,
    delivered_bytes: AtomicU64,
    consumer_drops: AtomicU64,
    unobserved: AtomicU64,
    output_discards: AtomicU64,
    queue_drops: AtomicU64,
}

/// Point-in-time copy of an interface's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Records accepted by the consumer.
    pub delivered: u64,
    /// Bytes accepted by the consumer, headers included.
    pub delivered_bytes: u64,
    /// Records the consumer refused.
    pub consumer_drops: u64,
    /// Injections with no consumer attached.
    pub unobserved: u64,
    /// Packets discarded on the output path.
    pub output_discards: u64,
    /// Units discarded from the send queue.
    pub queue_drops: u64,
}

/// Name and unit of an interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InterfaceId {
    pub name: String,
    pub unit: u32,
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One logging interface.
pub struct PseudoInterface {
    name: String,
    unit: u32,
    mtu: u32,
    flags: AtomicU32,
    consumer: ArcSwapOption<Weak<dyn CaptureConsumer>>,
    send_queue: Mutex<VecDeque<Bytes>>,
    queue_len: usize,
    live: AtomicBool,
    stats: InterfaceStats,
}

impl fmt::Debug for PseudoInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PseudoInterface")
            .field("name", &self.name)
            .field("unit", &self.unit)
            .field("mtu", &self.mtu)
            .field("flags", &self.flags())
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

impl PseudoInterface {
    pub(crate) fn new(base: &str, unit: u32, mtu: u32, queue_len: usize) -> Self {
        Self {
            name: format!("{}{}", base, unit),
            unit,
            mtu,
            flags: AtomicU32::new(0),
            consumer: ArcSwapOption::empty(),
            send_queue: Mutex::new(VecDeque::new()),
            queue_len,
            live: AtomicBool::new(true),
            stats: InterfaceStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }

    pub fn id(&self) -> InterfaceId {
        InterfaceId {
            name: self.name.clone(),
            unit: self.unit,
        }
    }

    /// Fixed MTU, set at creation.
    pub fn mtu(&self) -> u32 {
        self.mtu
    }

    /// Header length advertised to capture consumers.
    pub fn hdrlen(&self) -> usize {
        PFLOG_HDRLEN
    }

    pub fn flags(&self) -> IfFlags {
        IfFlags(self.flags.load(Ordering::Acquire))
    }

    pub fn is_up(&self) -> bool {
        self.flags().contains(IfFlags::UP)
    }

    pub fn is_running(&self) -> bool {
        self.flags().contains(IfFlags::RUNNING)
    }

    /// False once the interface has been destroyed.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn mark_dead(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Handle a control request.
    ///
    /// Address and flag requests all end with `RUNNING` tracking `UP`.
    pub fn configure(&self, request: ControlRequest) -> Result<()> {
        if let ControlRequest::SetMtu(_) | ControlRequest::Other(_) = request {
            return Err(Error::UnsupportedOperation(request));
        }

        let recompute = |bits: u32| {
            let base = match request {
                ControlRequest::SetFlags(requested) => requested.without(IfFlags::RUNNING),
                _ => IfFlags(bits),
            };
            if base.contains(IfFlags::UP) {
                base.with(IfFlags::RUNNING)
            } else {
                base.without(IfFlags::RUNNING)
            }
        };
        // Single read-modify-write so concurrent requests cannot lose updates.
        let previous = self
            .flags
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some(recompute(bits).bits())
            })
            .unwrap_or_else(|bits| bits);
        let next = recompute(previous);

        tracing::debug!(interface = %self.name, %request, flags = %next, "configured");
        Ok(())
    }

    /// Annotate a route through this interface with the interface MTU.
    pub fn route_mtu_hint(&self, request: RouteRequest, route: Option<&mut RouteEntry>) {
        if let (RouteRequest::Add | RouteRequest::Change, Some(route)) = (request, route) {
            route.mtu = Some(self.mtu);
        }
    }

    /// Transmit entry point: the packet is discarded.
    pub fn output(&self, packet: Bytes) {
        drop(packet);
        self.stats.output_discards.fetch_add(1, Ordering::Relaxed);
    }

    /// Put a unit on the send queue.
    ///
    /// Returns false, counting a queue drop, if the queue is full.
    pub fn enqueue(&self, packet: Bytes) -> bool {
        let mut queue = self.send_queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.len() >= self.queue_len {
            self.stats.queue_drops.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        queue.push_back(packet);
        true
    }

    /// Number of units waiting on the send queue.
    pub fn queued(&self) -> usize {
        self.send_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Empty the send queue, discarding every unit.
    ///
    /// Returns the number of units discarded. The consumer is never involved.
    pub fn drain_and_discard(&self) -> usize {
        let mut discarded = 0;
        loop {
            let next = self
                .send_queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            match next {
                Some(packet) => {
                    drop(packet);
                    self.stats.queue_drops.fetch_add(1, Ordering::Relaxed);
                    discarded += 1;
                }
                None => break,
            }
        }
        if discarded > 0 {
            tracing::debug!(interface = %self.name, discarded, "drained send queue");
        }
        discarded
    }

    /// Attach a capture consumer. The interface keeps only a weak reference.
    pub fn attach(&self, consumer: &Arc<dyn CaptureConsumer>) {
        self.consumer.store(Some(Arc::new(Arc::downgrade(consumer))));
        tracing::debug!(interface = %self.name, "consumer attached");
    }

    /// Forget the attached consumer, if any.
    pub fn detach(&self) {
        if self.consumer.swap(None).is_some() {
            tracing::debug!(interface = %self.name, "consumer detached");
        }
    }

    /// Whether a consumer is attached and still alive.
    pub fn has_consumer(&self) -> bool {
        self.current_consumer().is_some()
    }

    fn current_consumer(&self) -> Option<Arc<dyn CaptureConsumer>> {
        self.consumer.load().as_deref().and_then(Weak::upgrade)
    }

    /// Log one packet.
    ///
    /// The packet must be non-empty and the decision must name a matched rule
    /// and a source interface. Consumer refusals are counted, not returned.
    pub fn inject(&self, packet: &[u8], decision: &Decision) -> Result<Delivery> {
        if packet.is_empty() {
            return Err(Error::InvalidArgument("empty packet"));
        }
        if decision.interface.is_empty() {
            return Err(Error::InvalidArgument("no source interface"));
        }
        let header =
            LogHeader::from_decision(decision).ok_or(Error::InvalidArgument("no matched rule"))?;

        if !self.is_live() {
            return Err(Error::NotFound { unit: self.unit });
        }

        let Some(consumer) = self.current_consumer() else {
            self.stats.unobserved.fetch_add(1, Ordering::Relaxed);
            return Ok(Delivery::NoConsumer);
        };

        match consumer.deliver(&header, packet) {
            Ok(()) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .delivered_bytes
                    .fetch_add((PFLOG_HDRLEN + packet.len()) as u64, Ordering::Relaxed);
                tracing::trace!(
                    interface = %self.name,
                    rule = header.rule_number,
                    len = packet.len(),
                    "record delivered"
                );
                Ok(Delivery::Delivered)
            }
            Err(e) => {
                self.stats.consumer_drops.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(interface = %self.name, error = %e, "record dropped");
                Ok(Delivery::Dropped)
            }
        }
    }

    /// Snapshot the counters.
    pub fn stats(&self) -> StatsSnapshot {
        let s = &self.stats;
        StatsSnapshot {
            delivered: s.delivered.load(Ordering::Relaxed),
            delivered_bytes: s.delivered_bytes.load(Ordering::Relaxed),
            consumer_drops: s.consumer_drops.load(Ordering::Relaxed),
            unobserved: s.unobserved.load(Ordering::Relaxed),
            output_discards: s.output_discards.load(Ordering::Relaxed),
            queue_drops: s.queue_drops.load(Ordering::Relaxed),
        }
    }
}
