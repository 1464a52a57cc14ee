use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockcert_client::ClientError;

/// Anything that is not a denial is the server's problem.
pub fn client_error_to_response(err: ClientError) -> axum::response::Response {
    tracing::error!(error = %err, "certificate request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
        })),
    )
        .into_response()
}
