//! Ciclo de vida de las visitas
//!
//! Todas las transiciones leen el estado actual, lo validan contra
//! `ServiceStatus` y luego piden al store un compare-and-swap sobre ese
//! mismo estado. Si otro request cambió la visita entre medio, el swap no
//! aplica y se responde con conflicto.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use crate::config::environment::EnvironmentConfig;
use crate::dto::pending_service_dto::{
    CompleteServiceResponse, CreatePendingServiceRequest, UpdatePendingServiceRequest,
};
use crate::models::employee::Employee;
use crate::models::pending_service::{
    estimated_completion, PendingService, PendingServiceChanges, PendingServiceDraft,
    PendingServiceFilters, ServiceStatus,
};
use crate::repositories::Stores;
use crate::services::rating_token;
use crate::state::AppState;
use crate::utils::errors::{
    missing_reference, not_found_error, validation_error, AppError, AppResult,
};
use crate::utils::validation::clean_text;

pub struct PendingServiceController {
    stores: Stores,
    config: Arc<EnvironmentConfig>,
}

fn concurrent_change(id: i64) -> AppError {
    warn!("⚠️ La visita {} cambió durante la operación", id);
    AppError::Conflict(format!("Pending service {} was modified concurrently", id))
}

impl PendingServiceController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
            config: state.config.clone(),
        }
    }

    /// El empleado debe existir y estar activo
    async fn assignable_employee(&self, employee_id: i64) -> AppResult<Employee> {
        let employee = self
            .stores
            .employees
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| missing_reference("Employee", employee_id))?;
        if !employee.is_active() {
            return Err(AppError::Conflict(format!(
                "Employee {} is inactive and cannot take services",
                employee_id
            )));
        }
        Ok(employee)
    }

    pub async fn list(&self, filters: &PendingServiceFilters) -> AppResult<Vec<PendingService>> {
        self.stores.pending_services.list_pending_services(filters).await
    }

    pub async fn get(&self, id: i64) -> AppResult<PendingService> {
        self.stores
            .pending_services
            .find_pending_service(id)
            .await?
            .ok_or_else(|| not_found_error("Pending service", id))
    }

    pub async fn create(&self, request: CreatePendingServiceRequest) -> AppResult<PendingService> {
        request.validate()?;

        if self
            .stores
            .vehicles
            .find_vehicle(request.vehicle_id)
            .await?
            .is_none()
        {
            return Err(missing_reference("Vehicle", request.vehicle_id));
        }
        let offer = self
            .stores
            .catalog
            .find_offer(request.service_type_id)
            .await?
            .ok_or_else(|| missing_reference("Service", request.service_type_id))?;
        if let Some(employee_id) = request.employee_id {
            self.assignable_employee(employee_id).await?;
        }

        let entry_time = Utc::now();
        let draft = PendingServiceDraft {
            vehicle_id: request.vehicle_id,
            service_type_id: offer.service_id,
            employee_id: request.employee_id,
            entry_time,
            estimated_completion_time: estimated_completion(entry_time, offer.estimated_hours),
            status: if request.employee_id.is_some() {
                ServiceStatus::InProgress
            } else {
                ServiceStatus::Pending
            },
            notes: clean_text(request.notes),
        };

        let service = self
            .stores
            .pending_services
            .insert_pending_service(&draft)
            .await?;
        info!(
            "🚿 Ingreso de {} para {} ({})",
            service.license_plate, service.service_type_name, service.status
        );
        Ok(service)
    }

    pub async fn update(&self, id: i64, request: UpdatePendingServiceRequest) -> AppResult<PendingService> {
        request.validate()?;
        let current = self.get(id).await?;
        if !current.status.is_open() {
            return Err(AppError::Conflict(format!(
                "Pending service {} is already completed",
                id
            )));
        }

        let estimated_completion_time = request
            .estimated_completion_time
            .unwrap_or(current.estimated_completion_time);
        if estimated_completion_time < current.entry_time {
            return Err(validation_error(
                "estimated_completion_time",
                "must not be earlier than entry_time",
            ));
        }
        let changes = PendingServiceChanges {
            notes: if request.notes.is_some() {
                clean_text(request.notes)
            } else {
                current.notes
            },
            estimated_completion_time,
        };

        self.stores
            .pending_services
            .update_pending_service(id, &changes)
            .await?
            .ok_or_else(|| concurrent_change(id))
    }

    /// Asigna un empleado; una visita `pending` pasa a `in-progress`
    pub async fn assign(&self, id: i64, employee_id: i64) -> AppResult<PendingService> {
        let current = self.get(id).await?;
        let employee = self.assignable_employee(employee_id).await?;
        let next = current.status.after_assignment().ok_or_else(|| {
            AppError::Conflict(format!(
                "Pending service {} is already completed",
                id
            ))
        })?;

        let service = self
            .stores
            .pending_services
            .transition_pending_service(id, current.status, next, Some(employee_id))
            .await?
            .ok_or_else(|| concurrent_change(id))?;
        info!("👷 {} asignado a la visita {} ({})", employee.name, id, service.status);
        Ok(service)
    }

    /// Cierra la visita y emite su enlace de calificación
    pub async fn complete(&self, id: i64) -> AppResult<CompleteServiceResponse> {
        let current = self.get(id).await?;
        if !current.status.can_transition_to(ServiceStatus::Completed) {
            return Err(AppError::Conflict(format!(
                "Pending service {} is already completed",
                id
            )));
        }

        let now = Utc::now();
        let link = rating_token::new_link(now, self.config.rating_link_ttl_hours);
        let (service, rating_link) = self
            .stores
            .pending_services
            .complete_pending_service(id, current.status, now, &link)
            .await?
            .ok_or_else(|| concurrent_change(id))?;

        let rating_url = rating_token::rating_url(&self.config.rating_base_url, &rating_link.token);
        info!("✅ Visita {} completada ({})", id, service.license_plate);
        Ok(CompleteServiceResponse {
            service,
            rating_link,
            rating_url,
        })
    }

    /// Cambio de estado explícito; la finalización sólo ocurre por `complete`
    pub async fn set_status(&self, id: i64, status: ServiceStatus) -> AppResult<PendingService> {
        let current = self.get(id).await?;
        if status == ServiceStatus::Completed {
            return Err(AppError::Conflict(
                "Use the complete endpoint to finish a service".to_string(),
            ));
        }
        if !current.status.can_transition_to(status) {
            return Err(AppError::Conflict(format!(
                "Pending service {} cannot move from {} to {}",
                id, current.status, status
            )));
        }
        if status == ServiceStatus::InProgress && current.employee_id.is_none() {
            return Err(AppError::Conflict(format!(
                "Pending service {} needs an assigned employee to start",
                id
            )));
        }

        let service = self
            .stores
            .pending_services
            .transition_pending_service(id, current.status, status, None)
            .await?
            .ok_or_else(|| concurrent_change(id))?;
        info!("🔄 Visita {}: {} → {}", id, current.status, status);
        Ok(service)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.stores.pending_services.delete_pending_service(id).await? {
            return Err(not_found_error("Pending service", id));
        }
        info!("🗑️ Visita {} eliminada", id);
        Ok(())
    }
}
