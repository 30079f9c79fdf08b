use axum::response::Response;
use serde::Serialize;

use crate::utils::response::success;

pub mod availability;
pub mod context;
pub mod events;
pub mod extract;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "agenda-api",
    };

    success(payload, "Health check successful")
}
