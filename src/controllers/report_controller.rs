use chrono::Utc;
use validator::Validate;

use crate::dto::report_dto::ReportQuery;
use crate::models::employee::{EmployeeFilters, EmployeeStatus};
use crate::models::inventory::LowStockItem;
use crate::models::pending_service::PendingServiceFilters;
use crate::models::report::{
    CompletedVisit, DailyIncome, DashboardStats, ReportRange, ServiceTypeShare, ServiceTypeTime, VehicleVisitDay,
};
use crate::repositories::Stores;
use crate::services::reporting;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::normalize_plate;

/// Reportes de sólo lectura y estadísticas del dashboard
pub struct ReportController {
    stores: Stores,
}

impl ReportController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
        }
    }

    async fn visits(&self, query: &ReportQuery) -> AppResult<Vec<CompletedVisit>> {
        query.validate()?;
        self.stores
            .pending_services
            .list_completed_visits(&query.range())
            .await
    }

    pub async fn daily_income(&self, query: &ReportQuery) -> AppResult<Vec<DailyIncome>> {
        Ok(reporting::daily_income(&self.visits(query).await?))
    }

    pub async fn service_types(&self, query: &ReportQuery) -> AppResult<Vec<ServiceTypeShare>> {
        Ok(reporting::service_type_mix(&self.visits(query).await?))
    }

    pub async fn service_times(&self, query: &ReportQuery) -> AppResult<Vec<ServiceTypeTime>> {
        Ok(reporting::service_times(&self.visits(query).await?))
    }

    pub async fn vehicle_history(&self, plate: &str) -> AppResult<Vec<VehicleVisitDay>> {
        let plate = normalize_plate(plate);
        let vehicle = self
            .stores
            .vehicles
            .find_vehicle_by_plate(&plate)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle with plate '{}' not found", plate)))?;
        let services = self
            .stores
            .pending_services
            .list_pending_services_by_vehicle(vehicle.vehicle_id)
            .await?;
        Ok(reporting::vehicle_visits(&services))
    }

    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let today = Utc::now().date_naive();
        let range = ReportRange {
            from: Some(today),
            to: Some(today),
        };
        let completed_today = self
            .stores
            .pending_services
            .list_completed_visits(&range)
            .await?;

        let pending_services: Vec<_> = self
            .stores
            .pending_services
            .list_pending_services(&PendingServiceFilters::default())
            .await?
            .into_iter()
            .filter(|service| service.status.is_open())
            .collect();

        let active_employees = self
            .stores
            .employees
            .list_employees(&EmployeeFilters {
                q: None,
                status: Some(EmployeeStatus::Active),
            })
            .await?
            .len() as i64;

        let low_stock_items = self
            .stores
            .inventory
            .list_low_stock()
            .await?
            .iter()
            .map(LowStockItem::from)
            .collect();

        Ok(DashboardStats {
            pending_vehicles: pending_services.len() as i64,
            active_employees,
            avg_service_time: reporting::average_minutes(&completed_today),
            daily_income: reporting::total_income(&completed_today),
            pending_services,
            low_stock_items,
        })
    }
}
