//! Shared fixtures for application integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opsdeck_application::{
    ApiClient, ApiError, ApiRequest, ApiResponse, Clock, EnvironmentRegistry, HttpMethod,
    JobWorkflow, JobWorkflowSettings, PollerConfig, Transport,
};
use opsdeck_domain::{Environment, ImportRequest, ProcessSelector, UploadFile};
use parking_lot::Mutex;
use serde_json::json;

/// Registry with `dev` (active) and `prod`.
pub fn registry() -> Arc<EnvironmentRegistry> {
    Arc::new(
        EnvironmentRegistry::new(
            vec![
                Environment::new("dev", "Development", "http://dev.test/api", "local"),
                Environment::new("prod", "Production", "https://{region}.prod.test/api", "eu"),
            ],
            None,
        )
        .unwrap(),
    )
}

/// Builds a workflow over the fake backend without backoff jitter.
pub fn workflow(registry: &Arc<EnvironmentRegistry>, backend: &Arc<FakeBackend>) -> JobWorkflow {
    let api = ApiClient::new(Arc::clone(registry), backend.clone());
    let settings = JobWorkflowSettings {
        poller: PollerConfig {
            jitter: false,
            ..PollerConfig::default()
        },
        ..JobWorkflowSettings::default()
    };
    JobWorkflow::new(api, Arc::new(TickClock::default()), settings)
}

/// A one-file import into `billing`.
pub fn import(name: &str) -> ImportRequest {
    ImportRequest::new(
        vec![UploadFile::new(name, b"id;amount\n1;10\n".to_vec())],
        ProcessSelector::process("billing"),
    )
}

/// Clock advancing one second per reading.
#[derive(Default)]
pub struct TickClock {
    seconds: AtomicI64,
}

impl Clock for TickClock {
    fn now(&self) -> DateTime<Utc> {
        let offset = self.seconds.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(1_700_000_000 + offset, 0).unwrap()
    }
}

#[derive(Default)]
struct JobScript {
    statuses: VecDeque<String>,
    hang: bool,
}

/// In-memory job service.
///
/// Accepts `POST {base}/jobs`, answers `GET {base}/jobs/{id}` from a
/// per-job status script (the last status repeats) and acknowledges
/// `POST {base}/jobs/{id}/cancel`.
#[derive(Default)]
pub struct FakeBackend {
    next_id: AtomicU32,
    scripts: Mutex<HashMap<String, JobScript>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sets the statuses `GET /jobs/{id}` will report, in order.
    pub fn script(&self, job_id: &str, statuses: &[&str]) {
        let mut scripts = self.scripts.lock();
        let script = scripts.entry(job_id.to_string()).or_default();
        script.statuses = statuses.iter().map(ToString::to_string).collect();
        script.hang = false;
    }

    /// Makes status calls for `job_id` never answer.
    pub fn hang(&self, job_id: &str) {
        self.scripts.lock().entry(job_id.to_string()).or_default().hang = true;
    }

    /// Every call as `"METHOD url"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of calls matching `"METHOD url"` exactly.
    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    fn respond(&self, method: HttpMethod, url: &str) -> Option<ApiResponse> {
        let path = url
            .split_once("/api/")
            .map_or(url, |(_, rest)| rest)
            .trim_start_matches('/');
        let segments: Vec<&str> = path.split('/').collect();

        match (method, segments.as_slice()) {
            (HttpMethod::Post, ["jobs"]) => {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                Some(json_response(201, &json!({ "id": format!("job-{n}") })))
            }
            (HttpMethod::Post, ["jobs", _, "cancel"]) => Some(ApiResponse::new(202, Vec::new())),
            (HttpMethod::Get, ["jobs", id]) => {
                let mut scripts = self.scripts.lock();
                let script = scripts.entry((*id).to_string()).or_default();
                if script.hang {
                    return None;
                }
                let status = if script.statuses.len() > 1 {
                    script.statuses.pop_front()
                } else {
                    script.statuses.front().cloned()
                };
                Some(json_response(
                    200,
                    &json!({ "status": status.unwrap_or_else(|| "PENDING".to_string()) }),
                ))
            }
            _ => Some(json_response(404, &json!({ "message": "not found" }))),
        }
    }
}

fn json_response(status: u16, body: &serde_json::Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string().into_bytes())
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.calls
            .lock()
            .push(format!("{} {}", request.method, request.url));
        match self.respond(request.method, &request.url) {
            Some(response) => Ok(response),
            None => std::future::pending().await,
        }
    }
}
