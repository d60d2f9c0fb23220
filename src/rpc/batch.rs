//! Concurrent batch execution.
//!
//! Every item runs as its own task; results are appended to a shared
//! accumulator and handed back only after all tasks have joined. Output
//! order follows completion order, not input order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::value::RawValue;
use tokio::task::JoinSet;

use crate::rpc::dispatcher::Dispatcher;
use crate::rpc::envelope::RequestEnvelope;
use crate::rpc::error::ErrorObject;
use crate::rpc::response::ResponseEnvelope;

/// Responses collected while a batch is in flight. Append-only.
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    responses: Mutex<Vec<ResponseEnvelope>>,
}

impl BatchAccumulator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            responses: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn push(&self, response: ResponseEnvelope) {
        self.lock().push(response);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> Vec<ResponseEnvelope> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ResponseEnvelope>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run every item of a batch concurrently and wait for all of them.
///
/// An item that does not decode as an envelope yields an InvalidRequest
/// response with a null id. Failures never affect sibling items.
pub async fn execute_batch(
    dispatcher: &Dispatcher,
    items: Vec<Box<RawValue>>,
) -> Vec<ResponseEnvelope> {
    if items.is_empty() {
        return Vec::new();
    }

    let total = items.len();
    let accumulator = Arc::new(BatchAccumulator::with_capacity(total));
    let mut tasks = JoinSet::new();

    for item in items {
        let dispatcher = dispatcher.clone();
        let accumulator = Arc::clone(&accumulator);
        tasks.spawn(async move {
            let response = match RequestEnvelope::from_raw(&item) {
                Ok(envelope) => dispatcher.execute(envelope).await.0,
                Err(e) => ResponseEnvelope::failure(ErrorObject::invalid_request(e.to_string()), None),
            };
            accumulator.push(response);
        });
    }

    join_all(&mut tasks, &accumulator).await;

    let responses = accumulator.take();
    tracing::debug!(items = total, responses = responses.len(), "Batch complete");
    responses
}

/// Wait for every task. A task that fails to join still answers, with an
/// InternalError and a null id, so no item goes silently missing.
async fn join_all(tasks: &mut JoinSet<()>, accumulator: &BatchAccumulator) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Batch item task failed");
            let err = ErrorObject::internal("Internal error").with_data(e.to_string());
            accumulator.push(ResponseEnvelope::failure(err, None));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::caller::reply;
    use crate::rpc::error::ErrorCode;
    use crate::rpc::registry::ServiceRegistry;
    use serde_json::{json, Value};
    use std::time::{Duration, Instant};

    fn dispatcher() -> Dispatcher {
        let registry = ServiceRegistry::new();
        registry
            .register("Echo", |req: &RequestEnvelope| reply(req.id.clone()))
            .unwrap();
        registry
            .register("Slow", |req: &RequestEnvelope| {
                std::thread::sleep(Duration::from_millis(200));
                reply(req.id.clone())
            })
            .unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    fn raw(value: Value) -> Box<RawValue> {
        serde_json::value::to_raw_value(&value).unwrap()
    }

    #[tokio::test]
    async fn test_empty_batch() {
        assert!(execute_batch(&dispatcher(), Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_item_is_isolated() {
        let items = vec![
            raw(json!({"jsonrpc": "2.0", "method": "Echo.Id", "id": 1})),
            raw(json!(17)),
            raw(json!({"jsonrpc": "2.0", "method": "Echo.Id", "id": 2})),
            raw(json!({"jsonrpc": "2.0", "method": "Ghost.Id", "id": 3})),
        ];
        let responses = execute_batch(&dispatcher(), items).await;
        assert_eq!(responses.len(), 4);

        let invalid: Vec<_> = responses
            .iter()
            .filter(|r| r.error().map(|e| e.code) == Some(ErrorCode::InvalidRequest))
            .collect();
        assert_eq!(invalid.len(), 1);
        assert!(invalid[0].id.is_none());

        let mut ok_ids: Vec<&str> = responses
            .iter()
            .filter(|r| !r.is_error())
            .filter_map(|r| r.id.as_deref().map(RawValue::get))
            .collect();
        ok_ids.sort_unstable();
        assert_eq!(ok_ids, vec!["1", "2"]);

        assert!(responses
            .iter()
            .any(|r| r.error().map(|e| e.code) == Some(ErrorCode::MethodNotFound)));
    }

    #[tokio::test]
    async fn test_items_run_concurrently() {
        let items: Vec<_> = (0..10)
            .map(|i| raw(json!({"jsonrpc": "2.0", "method": "Slow.Id", "id": i})))
            .collect();
        let start = Instant::now();
        let responses = execute_batch(&dispatcher(), items).await;
        assert_eq!(responses.len(), 10);
        // Serial execution would take two seconds.
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[test]
    fn test_accumulator_take_drains() {
        let acc = BatchAccumulator::default();
        assert!(acc.is_empty());
        acc.push(ResponseEnvelope::success(None, Some(raw(json!(1)))));
        acc.push(ResponseEnvelope::success(None, Some(raw(json!(2)))));
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.take().len(), 2);
        assert!(acc.is_empty());
    }

    #[tokio::test]
    async fn test_failed_task_still_answers() {
        let acc = BatchAccumulator::default();
        let mut tasks = JoinSet::new();
        tasks.spawn(async {});
        tasks.spawn(async { panic!("item task died") });
        tasks.spawn(async {});

        join_all(&mut tasks, &acc).await;

        let responses = acc.take();
        assert_eq!(responses.len(), 1);
        let err = responses[0].error().unwrap();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "Internal error");
        assert!(responses[0].id.is_none());
    }
}
