use axum::{extract::Extension, response::IntoResponse, Json};

use crate::app::services::AppServices;

/// Liveness plus a hint of cache health. Never touches the store.
pub async fn health(Extension(services): Extension<AppServices>) -> impl IntoResponse {
    let snapshot = services.sync().snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "store": services.backend(),
        "cache": services.sync().state(),
        "generation": snapshot.generation(),
    }))
}
