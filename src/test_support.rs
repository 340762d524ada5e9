//! Fakes shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::config::ClientConfig;
use crate::gateway::{Gateway, InboundResponse, Method, OutboundRequest, Transport, TransportError};
use crate::navigator::RecordingNavigator;
use crate::session::SessionStore;
use crate::storage::{MemoryStorage, lock};

type Reply = Result<InboundResponse, TransportError>;

/// Canned replies keyed by method + path. The last reply for a route is
/// sticky, so repeated calls keep getting it. Unscripted routes answer 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, Ok(InboundResponse::new(status, body)))
    }

    pub(crate) fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Err(TransportError(message.to_owned())))
    }

    fn push(&self, method: Method, path: &str, reply: Reply) -> &Self {
        lock(&self.routes)
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn sent(&self) -> Vec<OutboundRequest> {
        lock(&self.sent).clone()
    }

    pub(crate) fn sent_count(&self) -> usize {
        lock(&self.sent).len()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<InboundResponse, TransportError> {
        let key = (request.method, request.path.clone());
        lock(&self.sent).push(request);
        let mut routes = lock(&self.routes);
        let Some(queue) = routes.get_mut(&key) else {
            return Ok(InboundResponse::new(404, Value::Null));
        };
        if queue.len() > 1 {
            return queue.pop_front().unwrap_or_else(|| Ok(InboundResponse::new(404, Value::Null)));
        }
        queue
            .front()
            .cloned()
            .unwrap_or_else(|| Ok(InboundResponse::new(404, Value::Null)))
    }
}

/// Gateway wired to fakes, plus handles on each fake.
pub(crate) struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<MemoryStorage>,
    pub session: Arc<SessionStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub gateway: Arc<Gateway>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_storage(MemoryStorage::new())
    }

    pub(crate) fn with_token(token: &str) -> Self {
        Self::with_storage(MemoryStorage::with_entry(crate::config::TOKEN_KEY, token))
    }

    fn with_storage(storage: MemoryStorage) -> Self {
        let transport = Arc::new(ScriptedTransport::new());
        let storage = Arc::new(storage);
        let session = Arc::new(SessionStore::new(storage.clone()));
        let navigator = Arc::new(RecordingNavigator::new());
        let gateway = Arc::new(Gateway::new(
            transport.clone(),
            session.clone(),
            navigator.clone(),
            &ClientConfig::default(),
        ));
        Self { transport, storage, session, navigator, gateway }
    }
}
