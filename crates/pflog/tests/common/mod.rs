//! Common test utilities for integration tests.

use std::sync::Arc;

use pflog::decision::{Action, AddressFamily, Decision, Direction, Reason};
use pflog::{CaptureConsumer, CaptureRecord, ChannelConsumer, PflogConfig, PflogModule};
use tokio::sync::mpsc;

/// Load a module with `units` initial interfaces.
pub fn module_with(units: u32) -> PflogModule {
    PflogModule::load(PflogConfig {
        initial_units: units,
        ..Default::default()
    })
    .expect("default config loads")
}

/// A channel consumer already coerced to the trait object interfaces take.
pub fn consumer(capacity: usize) -> (Arc<dyn CaptureConsumer>, mpsc::Receiver<CaptureRecord>) {
    let (consumer, rx) = ChannelConsumer::new(capacity);
    (Arc::new(consumer), rx)
}

/// The decision used by most scenarios: IPv4, pass, match, out, rule 3.
pub fn pass_out(rule: u32) -> Decision {
    Decision::new(
        "em0",
        AddressFamily::Inet,
        Action::Pass,
        Reason::Match,
        Direction::Out,
    )
    .matched(rule)
}

/// Collect everything currently queued on a receiver.
pub fn drain_records(rx: &mut mpsc::Receiver<CaptureRecord>) -> Vec<CaptureRecord> {
    let mut out = Vec::new();
    while let Ok(record) = rx.try_recv() {
        out.push(record);
    }
    out
}
