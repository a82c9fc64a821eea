use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pantry_sync::SyncError;

pub fn sync_error_to_response(err: SyncError) -> axum::response::Response {
    match err {
        SyncError::InvalidArgument(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_argument", msg),
        SyncError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        SyncError::StoreUnavailable(e) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
