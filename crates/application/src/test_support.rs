//! Shared fakes for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opsdeck_domain::Environment;
use parking_lot::Mutex;

use crate::environment::EnvironmentRegistry;
use crate::error::ApiError;
use crate::ports::{ApiRequest, ApiResponse, Clock, HttpMethod, Transport};

/// Registry with `dev` (active) and `prod` environments.
pub fn test_registry() -> Arc<EnvironmentRegistry> {
    let environments = vec![
        Environment::new("dev", "Development", "http://dev.test", "local"),
        Environment::new("prod", "Production", "http://prod.test", "us"),
    ];
    Arc::new(EnvironmentRegistry::new(environments, None).unwrap_or_else(|e| panic!("{e}")))
}

/// Scripted answer for one route.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with a status and body.
    Respond(u16, Vec<u8>),
    /// Fail at the transport level.
    Error(ApiError),
    /// Never answer.
    Hang,
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::Respond(status, body.to_string().into_bytes())
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self::Respond(status, body.as_bytes().to_vec())
    }
}

/// Transport answering from per-route queues keyed by `"METHOD url"`.
///
/// The last reply of a queue repeats forever; unknown routes get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, method: HttpMethod, url: &str, reply: Reply) {
        self.routes
            .lock()
            .entry(format!("{method} {url}"))
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url))
            .collect()
    }

    pub fn count(&self, method: HttpMethod, url: &str) -> usize {
        let key = format!("{method} {url}");
        self.calls().iter().filter(|c| **c == key).count()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let key = format!("{} {}", request.method, request.url);
        self.requests.lock().push(request);

        let reply = {
            let mut routes = self.routes.lock();
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Respond(status, body)) => Ok(ApiResponse::new(status, body)),
            Some(Reply::Error(error)) => Err(error),
            Some(Reply::Hang) => std::future::pending().await,
            None => Ok(ApiResponse::new(404, br#"{"message":"no route"}"#.to_vec())),
        }
    }
}

/// Clock that advances one millisecond per reading.
pub struct StepClock {
    millis: AtomicI64,
}

impl StepClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicI64::new(1_700_000_000_000),
        })
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}
