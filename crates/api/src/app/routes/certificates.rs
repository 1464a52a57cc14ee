use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use stockcert_client::{GrantClient, GrantOutcome};

use crate::app::{dto, errors};

/// Issue one certificate: 200 with the certificate, 403 when the ledger
/// denies the grant, 500 for anything else.
pub async fn issue_certificate(
    Extension(client): Extension<Arc<GrantClient>>,
    Json(body): Json<dto::CertificateRequest>,
) -> axum::response::Response {
    match client.request_grant(&body.name, body.class, body.amount).await {
        Ok(GrantOutcome::Issued(certificate)) => (StatusCode::OK, Json(certificate)).into_response(),
        Ok(GrantOutcome::Denied(denial)) => errors::json_error(StatusCode::FORBIDDEN, denial.reason),
        Err(e) => errors::client_error_to_response(e),
    }
}
