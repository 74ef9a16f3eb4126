//! Root endpoint.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::middleware::AppState;

async fn hello() -> Json<Value> {
    Json(json!({ "hello": "Bonjour le monde !" }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(hello))
}
