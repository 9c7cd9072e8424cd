use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::pending_service::{PendingService, ServiceStatus};
use crate::models::rating::RatingLink;

// Request de ingreso de un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePendingServiceRequest {
    pub vehicle_id: i64,
    pub service_type_id: i64,
    pub employee_id: Option<i64>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePendingServiceRequest {
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub estimated_completion_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AssignEmployeeRequest {
    pub employee_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ServiceStatusRequest {
    pub status: ServiceStatus,
}

/// Respuesta de `complete`: la visita cerrada y su enlace de calificación
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteServiceResponse {
    pub service: PendingService,
    pub rating_link: RatingLink,
    pub rating_url: String,
}
