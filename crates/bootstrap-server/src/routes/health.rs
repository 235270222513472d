use axum::Json;
use serde::Serialize;

pub const SERVICE_NAME: &str = "De Bra Hostel Management System";
pub const SERVICE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize)]
pub struct Features {
    pub room_booking: bool,
    pub bike_rental: bool,
    pub volunteer_management: bool,
    pub guest_services: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub features: Features,
}

/// The payload is fixed: it never reads live configuration.
pub fn health_status() -> HealthStatus {
    HealthStatus {
        status: "healthy",
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        features: Features {
            room_booking: true,
            bike_rental: true,
            volunteer_management: true,
            guest_services: true,
        },
    }
}

/// GET /api/health
pub async fn health_check() -> Json<HealthStatus> {
    Json(health_status())
}
