use crate::domain_model::*;
use crate::domain_port::{Transport, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

type Handler = dyn Fn(&RequestDescriptor) -> Result<ApiResponse, TransportError> + Send + Sync;

/// In-memory backend. Every call is recorded; calls to a gated path park
/// until the gate is given permits.
pub struct FakeTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<RequestDescriptor>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&RequestDescriptor) -> Result<ApiResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Answer calls in order, whatever the path; 404 once exhausted.
    pub fn sequence(responses: Vec<Result<ApiResponse, TransportError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| Ok(ApiResponse::new(404, serde_json::Value::Null)))
        })
    }

    /// Hold calls to `path` until permits are added to the returned semaphore.
    pub fn gate(&self, path: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<RequestDescriptor> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RequestDescriptor> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == path)
            .collect()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&request.path)
            .cloned();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;
        }

        // Behave like real I/O: give other tasks a chance to run.
        tokio::task::yield_now().await;
        (self.handler)(request)
    }
}
