use axum::{Router, routing::post};

pub mod certificates;
pub mod system;

/// Router for certificate endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/", post(certificates::issue_certificate))
        .route("/certificates", post(certificates::issue_certificate))
}
