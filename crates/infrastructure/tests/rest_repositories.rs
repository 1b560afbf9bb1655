//! REST repository tests against a recording transport.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use opsdeck_application::{
    ApiClient, ApiError, ApiErrorKind, ApiRequest, ApiResponse, ConfigurationRepository,
    EnvironmentRegistry, RequestBody, Transport, UserRepository,
};
use opsdeck_domain::{Environment, UserFilter, UserRole};
use opsdeck_infrastructure::{RestConfigurationRepository, RestUserRepository};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

/// Answers from a fixed `"METHOD url"` table and records every request.
#[derive(Default)]
struct RecordingTransport {
    routes: Mutex<HashMap<String, (u16, Value)>>,
    requests: Mutex<Vec<(String, Option<Value>)>>,
}

impl RecordingTransport {
    fn route(&self, call: &str, status: u16, body: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert(call.to_string(), (status, body));
    }

    fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(call, _)| call.clone())
            .collect()
    }

    fn body_of(&self, call: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| c == call)
            .and_then(|(_, body)| body.clone())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let call = format!("{} {}", request.method, request.url);
        let body = match request.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        };
        self.requests.lock().unwrap().push((call.clone(), body));

        let routes = self.routes.lock().unwrap();
        let (status, body) = routes
            .get(&call)
            .cloned()
            .unwrap_or((404, json!({ "message": "no route" })));
        Ok(ApiResponse::new(status, body.to_string().into_bytes()))
    }
}

fn setup() -> (Arc<EnvironmentRegistry>, Arc<RecordingTransport>, ApiClient) {
    let registry = Arc::new(
        EnvironmentRegistry::new(
            vec![
                Environment::new("dev", "Development", "http://dev.test/api", ""),
                Environment::new("prod", "Production", "https://{region}.prod.test/api", "us"),
            ],
            None,
        )
        .unwrap(),
    );
    let transport = Arc::new(RecordingTransport::default());
    let api = ApiClient::new(Arc::clone(&registry), transport.clone());
    (registry, transport, api)
}

#[tokio::test]
async fn set_parameter_reads_then_replaces_the_process() {
    let (_registry, transport, api) = setup();
    transport.route(
        "GET http://dev.test/api/processes/billing",
        200,
        json!({ "id": "billing", "name": "Billing", "parameters": { "batchSize": "100" } }),
    );
    transport.route(
        "PUT http://dev.test/api/processes/billing",
        200,
        json!({ "id": "billing", "name": "Billing", "parameters": { "batchSize": "500" } }),
    );

    let repository = RestConfigurationRepository::new(api);
    let updated = repository
        .set_parameter("billing", "batchSize", "500")
        .await
        .unwrap();

    assert_eq!(updated.parameters.get("batchSize").map(String::as_str), Some("500"));
    assert_eq!(
        transport.calls(),
        vec![
            "GET http://dev.test/api/processes/billing".to_string(),
            "PUT http://dev.test/api/processes/billing".to_string(),
        ]
    );
    let sent = transport
        .body_of("PUT http://dev.test/api/processes/billing")
        .unwrap();
    assert_eq!(sent["parameters"]["batchSize"], json!("500"));
    assert_eq!(sent["enabled"], json!(true));
}

#[tokio::test]
async fn set_parameter_on_missing_process_does_not_write() {
    let (_registry, transport, api) = setup();

    let repository = RestConfigurationRepository::new(api);
    let error = repository
        .set_parameter("ghost", "batchSize", "1")
        .await
        .unwrap_err();

    assert_eq!(error.kind, ApiErrorKind::Status);
    assert_eq!(error.status_code, Some(404));
    assert_eq!(
        transport.calls(),
        vec!["GET http://dev.test/api/processes/ghost".to_string()]
    );
}

#[tokio::test]
async fn listings_follow_the_active_environment() {
    let (registry, transport, api) = setup();
    transport.route("GET http://dev.test/api/processes", 200, json!([]));
    transport.route(
        "GET https://us.prod.test/api/processes",
        200,
        json!([{ "id": "billing", "name": "Billing" }]),
    );

    let repository = RestConfigurationRepository::new(api);
    assert!(repository.list().await.unwrap().is_empty());

    registry.set_active("prod").unwrap();
    let processes = repository.list().await.unwrap();
    assert_eq!(processes.len(), 1);
    assert_eq!(processes[0].id, "billing");
}

#[tokio::test]
async fn user_listing_sends_the_filter() {
    let (_registry, transport, api) = setup();
    transport.route(
        "GET http://dev.test/api/users?role=operator&active=true",
        200,
        json!([{ "id": "u1", "username": "ada", "role": "operator" }]),
    );

    let repository = RestUserRepository::new(api);
    let filter = UserFilter {
        role: Some(UserRole::Operator),
        active: Some(true),
        search: None,
    };
    let users = repository.list(&filter).await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].role, UserRole::Operator);
    assert_eq!(
        transport.calls(),
        vec!["GET http://dev.test/api/users?role=operator&active=true".to_string()]
    );
}

#[tokio::test]
async fn user_update_puts_to_the_record() {
    let (_registry, transport, api) = setup();
    transport.route(
        "GET http://dev.test/api/users/u1",
        200,
        json!({ "id": "u1", "username": "ada", "role": "viewer", "active": true }),
    );
    transport.route(
        "PUT http://dev.test/api/users/u1",
        200,
        json!({ "id": "u1", "username": "ada", "role": "admin", "active": true }),
    );

    let repository = RestUserRepository::new(api);
    let mut user = repository.get("u1").await.unwrap();
    user.role = UserRole::Admin;
    let stored = repository.update(&user).await.unwrap();

    assert_eq!(stored.role, UserRole::Admin);
    assert_eq!(
        transport.body_of("PUT http://dev.test/api/users/u1").unwrap()["role"],
        json!("admin")
    );
    assert!(
        transport
            .calls()
            .iter()
            .all(|call| call.contains("http://dev.test/api/users/u1"))
    );
}

#[tokio::test]
async fn record_ids_stay_one_path_segment() {
    let (_registry, transport, api) = setup();
    transport.route(
        "GET http://dev.test/api/users/ops%2Fada",
        200,
        json!({ "id": "ops/ada", "username": "ada", "role": "viewer" }),
    );
    transport.route(
        "GET http://dev.test/api/processes/batch%237",
        200,
        json!({ "id": "batch#7", "name": "Batch 7" }),
    );

    let user = RestUserRepository::new(api.clone()).get("ops/ada").await.unwrap();
    let process = RestConfigurationRepository::new(api).get("batch#7").await.unwrap();

    assert_eq!(user.id, "ops/ada");
    assert_eq!(process.id, "batch#7");
    assert_eq!(
        transport.calls(),
        vec![
            "GET http://dev.test/api/users/ops%2Fada".to_string(),
            "GET http://dev.test/api/processes/batch%237".to_string(),
        ]
    );
}
