//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y sus variantes para CRUD operations.
//! La matrícula se guarda normalizada y es única.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::pending_service::PendingService;
use crate::models::work_order::WorkOrder;

/// Vehicle principal - fila de vehicles con el nombre del cliente
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub vehicle_id: i64,
    pub customer_id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub vin: Option<String>,
    pub color: Option<String>,
    pub last_service_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: String,
}

/// Campos editables de un vehículo
#[derive(Debug, Clone)]
pub struct VehicleDraft {
    pub customer_id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub vin: Option<String>,
    pub color: Option<String>,
    pub last_service_date: Option<NaiveDate>,
}

impl From<&Vehicle> for VehicleDraft {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            customer_id: vehicle.customer_id,
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            license_plate: vehicle.license_plate.clone(),
            vin: vehicle.vin.clone(),
            color: vehicle.color.clone(),
            last_service_date: vehicle.last_service_date,
        }
    }
}

/// Historial de un vehículo: visitas y órdenes de trabajo
#[derive(Debug, Clone, Serialize)]
pub struct VehicleHistory {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub services: Vec<PendingService>,
    pub work_orders: Vec<WorkOrder>,
}
