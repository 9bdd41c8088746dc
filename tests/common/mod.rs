//! Local stand-in for the hosted realtime database's REST API.

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use fantasy_admin::storage::InMemoryStore;
use fantasy_admin::{StoreClient, StorePath};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

pub const SECRET: &str = "league-secret";

#[derive(Clone)]
struct Emulator {
    store: Arc<InMemoryStore>,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// With `shallow=true` the hosted API answers `{"key": true, ...}` for an
/// object and the value itself for a leaf.
fn shallow_view(value: Value, shallow: bool) -> Value {
    match value {
        Value::Object(map) if shallow => map.into_iter().map(|(key, _)| (key, Value::Bool(true))).collect(),
        Value::Array(items) if shallow => items
            .into_iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(index, _)| (index.to_string(), Value::Bool(true)))
            .collect(),
        other => other,
    }
}

async fn handle(
    State(emulator): State<Emulator>,
    method: Method,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let authorized = params.get("auth").map(String::as_str) == Some(SECRET)
        || params.get("access_token").map(String::as_str) == Some(SECRET);
    if !authorized {
        return error_response(StatusCode::UNAUTHORIZED, "Permission denied");
    }

    let Some(raw_path) = uri.path().strip_suffix(".json") else {
        return error_response(StatusCode::NOT_FOUND, "Not found");
    };
    let path = match StorePath::parse(raw_path) {
        Ok(path) => path,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };

    let store = &emulator.store;
    let result = match method {
        Method::GET => {
            let shallow = params.get("shallow").map(String::as_str) == Some("true");
            store
                .fetch_subtree(&path)
                .await
                .map(|value| Json(shallow_view(value.unwrap_or(Value::Null), shallow)).into_response())
        }
        Method::DELETE => store
            .delete_subtree(&path)
            .await
            .map(|()| Json(Value::Null).into_response()),
        Method::PATCH => {
            let fields: Map<String, Value> = match serde_json::from_slice(&body) {
                Ok(fields) => fields,
                Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
            };
            let echo = Value::Object(fields.clone());
            store.patch_record(&path, fields).await.map(|()| {
                if params.get("print").map(String::as_str) == Some("silent") {
                    StatusCode::NO_CONTENT.into_response()
                } else {
                    Json(echo).into_response()
                }
            })
        }
        _ => return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    };

    result.unwrap_or_else(|err| error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()))
}

/// Serve `store` on an ephemeral port and return its base URL.
pub async fn spawn_emulator(store: Arc<InMemoryStore>) -> String {
    let app = Router::new()
        .fallback(handle)
        .with_state(Emulator { store });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

