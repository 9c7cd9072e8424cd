//! Modelos de reportes y dashboard
//!
//! Proyecciones de sólo lectura sobre visitas completadas.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::inventory::LowStockItem;
use crate::models::pending_service::PendingService;

/// Visita completada con lo necesario para agregar
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompletedVisit {
    pub service_id: i64,
    pub service_type_name: String,
    pub base_price: Decimal,
    pub license_plate: String,
    pub entry_time: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Ventana de fechas (inclusive) para los reportes
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct ReportRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let day = instant.date_naive();
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyIncome {
    pub day: NaiveDate,
    pub income: Decimal,
    pub services: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceTypeShare {
    pub name: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceTypeTime {
    #[serde(rename = "type")]
    pub service_type: String,
    pub avg_minutes: f64,
    pub samples: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleVisitDay {
    pub date: NaiveDate,
    pub services: i64,
}

/// Resumen del dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub pending_vehicles: i64,
    pub active_employees: i64,
    pub avg_service_time: f64,
    pub daily_income: Decimal,
    pub pending_services: Vec<PendingService>,
    pub low_stock_items: Vec<LowStockItem>,
}
