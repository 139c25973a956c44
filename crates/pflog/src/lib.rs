//! Packet filter logging pseudo-interface.
//!
//! This crate provides the `pflog` logging tap: a virtual interface the
//! packet filter pushes logged packets into, together with its decision.
//! Each packet is prefixed with a fixed `DLT_PFLOG` header describing the
//! verdict and handed to the capture consumer attached to that interface.
//! Nothing is ever transmitted.
//!
//! # Overview
//!
//! - [`header`] - the bit-exact pflog header codec
//! - [`PseudoInterface`] - one `pflogN` interface: flags, MTU, consumer, counters
//! - [`InterfaceRegistry`] - the set of live units and the default target
//! - [`Control`] - create, destroy, configure, inject and drain
//! - [`PflogModule`] - load/unload lifecycle owning the registry
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pflog::{ChannelConsumer, CaptureConsumer, PflogConfig, PflogModule};
//! use pflog::decision::{Action, AddressFamily, Decision, Direction, Reason};
//!
//! let module = PflogModule::load(PflogConfig::default())?;
//! let control = module.control();
//!
//! // pflog0 exists after load; attach a capture consumer to it
//! let (consumer, mut rx) = ChannelConsumer::new(256);
//! let consumer: Arc<dyn CaptureConsumer> = Arc::new(consumer);
//! control.attach(0, &consumer)?;
//!
//! let decision = Decision::new("em0", AddressFamily::Inet, Action::Drop, Reason::Match, Direction::In)
//!     .matched(7);
//! control.inject(None, &packet, &decision)?;
//!
//! let record = rx.try_recv()?;
//! println!("rule {} on {}", record.header.rule_number, record.header.ifname());
//! ```

pub mod config;
pub mod consumer;
pub mod control;
pub mod decision;
pub mod error;
pub mod header;
pub mod interface;
pub mod module;
pub mod registry;

pub use config::PflogConfig;
pub use consumer::{CaptureConsumer, CaptureRecord, ChannelConsumer, DeliveryError};
pub use control::Control;
pub use decision::Decision;
pub use error::{Error, Result};
pub use header::LogHeader;
pub use interface::{
    ControlRequest, Delivery, IfFlags, InterfaceId, PseudoInterface, RouteEntry, RouteRequest,
    StatsSnapshot,
};
pub use module::PflogModule;
pub use registry::InterfaceRegistry;
