//! Shared fixtures for coordinator integration tests

#![allow(dead_code)]

use std::sync::Arc;
use trendline_monitor::config::MonitorConfig;
use trendline_monitor::testing::{FakeProvider, FlakyStore, RecordingSink};
use trendline_monitor::{Coordinator, MonitorContext};
use trendline_regression::{Kernel, KernelSpec};

pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub provider: Arc<FakeProvider>,
    pub sink: Arc<RecordingSink>,
    pub coordinator: Arc<Coordinator>,
}

pub fn harness(config: MonitorConfig) -> Harness {
    let store = Arc::new(FlakyStore::new());
    let provider = Arc::new(FakeProvider::new());
    let sink = Arc::new(RecordingSink::new());

    let context = MonitorContext::new(store.clone(), sink.clone(), provider.clone());
    let coordinator = Arc::new(Coordinator::new(context, config).unwrap());

    Harness {
        store,
        provider,
        sink,
        coordinator,
    }
}

/// Laplace, bandwidth 2, repainting; small enough to reason about by hand
pub fn test_config() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.signals.kernel = KernelSpec::new(Kernel::Laplace, 2, 2.0, true).unwrap();
    config.signals.settle_delay_secs = 0;
    config.provider.fetch_timeout_secs = 1;
    config
}

/// Falls to a trough at 2.0 and turns up on the last closed bar.
///
/// The hit holds for any open bar closing between 7 and 21.
pub const TURNING_UP: [f64; 12] = [
    30.0, 28.0, 26.0, 24.0, 22.0, 20.0, 18.0, 16.0, 14.0, 12.0, 2.0, 14.0,
];

/// Mirror of [`TURNING_UP`] around 20: turns down on the last closed bar for open
/// bars closing between 19 and 33.
pub const TURNING_DOWN: [f64; 12] = [
    10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0, 24.0, 26.0, 28.0, 38.0, 26.0,
];

/// No turning point anywhere while the open bar keeps rising
pub const RISING: [f64; 12] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];

/// Closed bars followed by one open bar closing at `open`
pub fn with_open_bar(closed: &[f64], open: f64) -> Vec<f64> {
    let mut closes = closed.to_vec();
    closes.push(open);
    closes
}
