//! Integration test entry point.
//!
//! The actual tests are organized in the `integration/` directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pflog --test integration
//!
//! # Run a single module
//! cargo test -p pflog --test integration scenarios
//! ```
//!
//! # Test Organization
//!
//! - `scenarios.rs` - End-to-end create/inject/destroy flows
//! - `concurrency.rs` - Parallel injection against live and dying units
//! - `wire.rs` - Records as an external decoder sees them

#[path = "common/mod.rs"]
mod common;

#[path = "integration/scenarios.rs"]
mod scenarios;

#[path = "integration/concurrency.rs"]
mod concurrency;

#[path = "integration/wire.rs"]
mod wire;
