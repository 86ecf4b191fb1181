//! Default event sink
//!
//! Logs triggered events through tracing. Useful for the daemon and for
//! embeddings that have no trigger registry of their own.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

use crate::traits::{EventScope, EventSink};
use crate::Error;

/// Event sink that logs every trigger
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for TracingEventSink {
    async fn trigger(
        &self,
        scope: EventScope,
        event: &str,
        tokens: HashMap<String, String>,
    ) -> Result<(), Error> {
        info!(?scope, event, ?tokens, "event triggered");
        Ok(())
    }
}
