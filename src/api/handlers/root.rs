//! Root endpoint: service banner, intentionally undocumented in the OpenAPI
//! spec.

use axum::response::IntoResponse;

pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
