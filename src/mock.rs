//! Mock query service for testing.
//!
//! Returns canned JSON keyed by the view each inline query targets.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::chat::LookerClient;
use crate::error::{Result, ShapeError};
use crate::query::InlineQuery;

/// Mock client that answers inline queries from a view -> response table.
///
/// Used for unit testing without a running query service.
#[derive(Debug, Default)]
pub struct MockLookerClient {
    responses: Vec<(String, Value)>,
    delay: Option<Duration>,
    calls: Mutex<Vec<InlineQuery>>,
}

impl MockLookerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a response for queries against `view`.
    pub fn with_response(mut self, view: impl Into<String>, response: Value) -> Self {
        self.responses.push((view.into(), response));
        self
    }

    /// Sleeps before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every query received so far, in call order.
    pub fn calls(&self) -> Vec<InlineQuery> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LookerClient for MockLookerClient {
    async fn run_inline_query(&self, body: &InlineQuery) -> Result<Value> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(body.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .iter()
            .find(|(view, _)| *view == body.view)
            .map(|(_, response)| response.clone())
            .ok_or_else(|| ShapeError::upstream(format!("no such view: {}.{}", body.model, body.view)))
    }
}
