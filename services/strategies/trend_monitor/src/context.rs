//! Handles shared by the evaluator, the scanner and the coordinator

use crate::provider::PriceProvider;
use crate::sink::NotificationSink;
use crate::store::Store;
use std::sync::Arc;

/// Store, sink and provider passed explicitly to every component
#[derive(Clone)]
pub struct MonitorContext {
    pub store: Arc<dyn Store>,
    pub sink: Arc<dyn NotificationSink>,
    pub provider: Arc<dyn PriceProvider>,
}

impl MonitorContext {
    pub fn new(
        store: Arc<dyn Store>,
        sink: Arc<dyn NotificationSink>,
        provider: Arc<dyn PriceProvider>,
    ) -> Self {
        Self {
            store,
            sink,
            provider,
        }
    }
}
