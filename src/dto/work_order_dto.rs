use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::work_order::WorkOrderStatus;
use crate::utils::validation::{validate_non_negative, validate_positive};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkOrderRequest {
    pub vehicle_id: i64,
    pub status: Option<WorkOrderStatus>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWorkOrderRequest {
    pub vehicle_id: Option<i64>,
    pub status: Option<WorkOrderStatus>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WorkOrderStatusRequest {
    pub status: WorkOrderStatus,
}

// Línea de servicio; sin precio se toma el precio base del catálogo
#[derive(Debug, Deserialize, Validate)]
pub struct AddServiceLineRequest {
    pub service_id: i64,
    #[validate(custom = "validate_non_negative")]
    pub price: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

// Línea de repuesto; sin precio se toma el precio de venta del artículo
#[derive(Debug, Deserialize, Validate)]
pub struct AddPartLineRequest {
    pub item_id: i64,
    #[validate(custom = "validate_positive")]
    pub quantity: Decimal,
    #[validate(custom = "validate_non_negative")]
    pub price_per_unit: Option<Decimal>,
}
