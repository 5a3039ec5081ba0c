use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{Endpoints, LayoutClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedControl {
    pub apply_id: String,
    pub query: String,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    pub designs: Arc<Mutex<Vec<Value>>>,
    pub applies: Arc<Mutex<Vec<Value>>>,
    pub resources: Arc<Mutex<Vec<Value>>>,
    pub policies: Arc<Mutex<Vec<Value>>>,
    pub fail_resources: Arc<Mutex<bool>>,
    pub control_failure: Arc<Mutex<Option<(StatusCode, Value)>>>,
    pub controls: Arc<Mutex<Vec<RecordedControl>>>,
    pub list_queries: Arc<Mutex<Vec<String>>>,
    pub deleted_policies: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub async fn fail_control_with(&self, status: StatusCode, body: Value) {
        *self.control_failure.lock().await = Some((status, body));
    }

    pub async fn clear_control_failure(&self) {
        *self.control_failure.lock().await = None;
    }

    pub async fn recorded_controls(&self) -> Vec<RecordedControl> {
        self.controls.lock().await.clone()
    }
}

type Reply = (StatusCode, Json<Value>);

fn not_found(what: &str) -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"code": "E40400", "message": format!("{what} not found")})),
    )
}

fn find_by(records: &[Value], key: &str, id: &str) -> Option<Value> {
    records
        .iter()
        .find(|record| record.get(key).and_then(Value::as_str) == Some(id))
        .cloned()
}

async fn list_designs(State(state): State<MockBackend>, RawQuery(query): RawQuery) -> Reply {
    state
        .list_queries
        .lock()
        .await
        .push(query.unwrap_or_default());
    let designs = state.designs.lock().await.clone();
    (
        StatusCode::OK,
        Json(json!({"totalCount": designs.len(), "data": designs})),
    )
}

async fn get_design(State(state): State<MockBackend>, Path(id): Path<String>) -> Reply {
    match find_by(&state.designs.lock().await, "designID", &id) {
        Some(design) => (StatusCode::OK, Json(design)),
        None => not_found("layout design"),
    }
}

async fn list_applies(State(state): State<MockBackend>, RawQuery(query): RawQuery) -> Reply {
    state
        .list_queries
        .lock()
        .await
        .push(query.unwrap_or_default());
    let applies = state.applies.lock().await.clone();
    (
        StatusCode::OK,
        Json(json!({"count": applies.len(), "totalCount": applies.len(), "data": applies})),
    )
}

async fn get_apply(State(state): State<MockBackend>, Path(id): Path<String>) -> Reply {
    match find_by(&state.applies.lock().await, "applyID", &id) {
        Some(apply) => (StatusCode::OK, Json(apply)),
        None => not_found("layout apply"),
    }
}

async fn control_apply(
    State(state): State<MockBackend>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> Reply {
    state.controls.lock().await.push(RecordedControl {
        apply_id: id.clone(),
        query: query.unwrap_or_default(),
    });
    if let Some((status, body)) = state.control_failure.lock().await.clone() {
        return (status, Json(body));
    }
    (
        StatusCode::ACCEPTED,
        Json(json!({"applyID": id, "status": "CANCELING"})),
    )
}

async fn list_resources(State(state): State<MockBackend>, RawQuery(query): RawQuery) -> Reply {
    state
        .list_queries
        .lock()
        .await
        .push(query.unwrap_or_default());
    if *state.fail_resources.lock().await {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"code": "E50000", "message": "configuration manager unavailable"})),
        );
    }
    let resources = state.resources.lock().await.clone();
    (
        StatusCode::OK,
        Json(json!({"count": resources.len(), "resources": resources})),
    )
}

async fn list_policies(State(state): State<MockBackend>, RawQuery(query): RawQuery) -> Reply {
    state
        .list_queries
        .lock()
        .await
        .push(query.unwrap_or_default());
    let policies = state.policies.lock().await.clone();
    (
        StatusCode::OK,
        Json(json!({"totalCount": policies.len(), "policies": policies})),
    )
}

async fn create_policy(State(state): State<MockBackend>, Json(mut body): Json<Value>) -> Reply {
    let mut policies = state.policies.lock().await;
    body["policyID"] = json!(format!("policy-{}", policies.len() + 1));
    policies.push(body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn get_policy(State(state): State<MockBackend>, Path(id): Path<String>) -> Reply {
    match find_by(&state.policies.lock().await, "policyID", &id) {
        Some(policy) => (StatusCode::OK, Json(policy)),
        None => not_found("policy"),
    }
}

async fn update_policy(
    State(state): State<MockBackend>,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Reply {
    let mut policies = state.policies.lock().await;
    let Some(existing) = policies
        .iter_mut()
        .find(|policy| policy.get("policyID").and_then(Value::as_str) == Some(id.as_str()))
    else {
        return not_found("policy");
    };
    body["policyID"] = json!(id);
    *existing = body.clone();
    (StatusCode::OK, Json(body))
}

async fn delete_policy(State(state): State<MockBackend>, Path(id): Path<String>) -> StatusCode {
    let mut policies = state.policies.lock().await;
    let before = policies.len();
    policies.retain(|policy| policy.get("policyID").and_then(Value::as_str) != Some(id.as_str()));
    if policies.len() == before {
        return StatusCode::NOT_FOUND;
    }
    state.deleted_policies.lock().await.push(id);
    StatusCode::NO_CONTENT
}

pub async fn spawn_backend(backend: MockBackend) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");
    let app = Router::new()
        .route("/layout-designs", get(list_designs))
        .route("/layout-designs/:id", get(get_design))
        .route("/layout-apply", get(list_applies))
        .route("/layout-apply/:id", get(get_apply).put(control_apply))
        .route("/resources", get(list_resources))
        .route("/policies", get(list_policies).post(create_policy))
        .route(
            "/policies/:id",
            get(get_policy).put(update_policy).delete(delete_policy),
        )
        .with_state(backend);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

pub fn client_for(base_url: &str) -> LayoutClient {
    LayoutClient::new(
        Endpoints {
            layout_design: base_url.to_string(),
            layout_apply: base_url.to_string(),
            configuration_manager: base_url.to_string(),
            policy_manager: base_url.to_string(),
        },
        1000,
    )
}

pub fn apply_json(id: &str, status: &str, rollback_status: Option<&str>) -> Value {
    let mut record = json!({
        "applyID": id,
        "status": status,
        "startedAt": "2024-01-01T00:00:00Z",
    });
    if let Some(rollback_status) = rollback_status {
        record["rollbackStatus"] = json!(rollback_status);
        record["executeRollback"] = json!(true);
    }
    record
}
