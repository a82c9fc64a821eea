use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

use pantry_core::{Expiration, SortKey};
use pantry_sync::CacheSnapshot;

use crate::app::{dto, errors, services::{self, AppServices}};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_inventory))
        .route("/refresh", post(refresh))
        .route("/stream", get(stream))
        .route("/items", post(add_item))
        .route("/items/:name/decrement", post(decrement_item))
        .route("/items/:name", delete(delete_all_of))
}

/// GET /inventory?search=&sort=
///
/// Served from the cache; the store is not read.
pub async fn list_inventory(
    Extension(services): Extension<AppServices>,
    Query(query): Query<dto::ListQuery>,
) -> Response {
    let snapshot = services.sync().snapshot();
    let search = query.search.as_deref().unwrap_or("");
    Json(dto::InventoryResponse::from_snapshot(
        &snapshot,
        services.sync().state(),
        search,
        query.sort_key(),
    ))
    .into_response()
}

pub async fn refresh(Extension(services): Extension<AppServices>) -> Response {
    let result = services.sync().refresh().await;
    respond(&services, result)
}

pub async fn add_item(
    Extension(services): Extension<AppServices>,
    Json(body): Json<dto::AddItemRequest>,
) -> Response {
    let result = services
        .sync()
        .add_item(&body.name, Expiration::new(body.expiration))
        .await;
    respond(&services, result)
}

pub async fn decrement_item(
    Extension(services): Extension<AppServices>,
    Path(name): Path<String>,
) -> Response {
    let result = services.sync().decrement_item(&name).await;
    respond(&services, result)
}

pub async fn delete_all_of(
    Extension(services): Extension<AppServices>,
    Path(name): Path<String>,
) -> Response {
    let result = services.sync().delete_all_of(&name).await;
    respond(&services, result)
}

/// GET /inventory/stream
///
/// Server-sent `refresh` events; clients re-read `/inventory` on each one.
pub async fn stream(Extension(services): Extension<AppServices>) -> impl IntoResponse {
    services::refresh_sse_stream(services)
}

fn respond(services: &AppServices, result: Result<CacheSnapshot, pantry_sync::SyncError>) -> Response {
    match result {
        Ok(snapshot) => Json(dto::InventoryResponse::from_snapshot(
            &snapshot,
            services.sync().state(),
            "",
            SortKey::None,
        ))
        .into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}
