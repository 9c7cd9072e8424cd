//! Órdenes de trabajo
//!
//! Los cambios de líneas (y el recálculo del total) los hace el store de
//! forma atómica; aquí se resuelven precios por defecto y referencias.

use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use crate::dto::work_order_dto::{
    AddPartLineRequest, AddServiceLineRequest, CreateWorkOrderRequest, UpdateWorkOrderRequest,
};
use crate::models::work_order::{
    OrderPartDraft, OrderServiceDraft, WorkOrder, WorkOrderDetail, WorkOrderDraft,
    WorkOrderFilters, WorkOrderStatus,
};
use crate::repositories::Stores;
use crate::state::AppState;
use crate::utils::errors::{missing_reference, not_found_error, AppError, AppResult};
use crate::utils::validation::clean_text;

fn concurrent_change(id: i64) -> AppError {
    warn!("⚠️ La orden {} cambió durante la operación", id);
    AppError::Conflict(format!("Work order {} was modified concurrently", id))
}

pub struct WorkOrderController {
    stores: Stores,
}

impl WorkOrderController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
        }
    }

    async fn check_vehicle(&self, vehicle_id: i64) -> AppResult<()> {
        if self.stores.vehicles.find_vehicle(vehicle_id).await?.is_none() {
            return Err(missing_reference("Vehicle", vehicle_id));
        }
        Ok(())
    }

    pub async fn list(&self, filters: &WorkOrderFilters) -> AppResult<Vec<WorkOrder>> {
        self.stores.work_orders.list_work_orders(filters).await
    }

    pub async fn by_vehicle(&self, vehicle_id: i64) -> AppResult<Vec<WorkOrder>> {
        if self.stores.vehicles.find_vehicle(vehicle_id).await?.is_none() {
            return Err(not_found_error("Vehicle", vehicle_id));
        }
        self.stores.work_orders.list_work_orders_by_vehicle(vehicle_id).await
    }

    pub async fn get(&self, id: i64) -> AppResult<WorkOrderDetail> {
        self.stores
            .work_orders
            .find_work_order(id)
            .await?
            .ok_or_else(|| not_found_error("Work order", id))
    }

    pub async fn create(&self, request: CreateWorkOrderRequest) -> AppResult<WorkOrderDetail> {
        request.validate()?;
        self.check_vehicle(request.vehicle_id).await?;

        let draft = WorkOrderDraft {
            vehicle_id: request.vehicle_id,
            status: WorkOrderStatus::Pending,
            start_date: None,
            completion_date: None,
            notes: clean_text(request.notes),
        }
        .with_status(request.status.unwrap_or(WorkOrderStatus::Pending), Utc::now());

        let detail = self.stores.work_orders.insert_work_order(&draft).await?;
        info!(
            "🛠️ Orden {} creada para {}",
            detail.order.order_id, detail.order.license_plate
        );
        Ok(detail)
    }

    pub async fn update(&self, id: i64, request: UpdateWorkOrderRequest) -> AppResult<WorkOrderDetail> {
        request.validate()?;
        let current = self.get(id).await?;
        let status = current.order.status;
        if status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Work order {} is closed and cannot change",
                id
            )));
        }

        let mut draft = WorkOrderDraft::from(&current.order);
        if let Some(vehicle_id) = request.vehicle_id {
            self.check_vehicle(vehicle_id).await?;
            draft.vehicle_id = vehicle_id;
        }
        if request.notes.is_some() {
            draft.notes = clean_text(request.notes);
        }
        if let Some(next) = request.status.filter(|next| *next != status) {
            draft = draft.with_status(next, Utc::now());
        }

        self.stores
            .work_orders
            .update_work_order(id, status, &draft)
            .await?
            .ok_or_else(|| concurrent_change(id))
    }

    pub async fn set_status(&self, id: i64, status: WorkOrderStatus) -> AppResult<WorkOrderDetail> {
        let current = self.get(id).await?;
        if !current.order.status.can_transition_to(status) {
            return Err(AppError::Conflict(format!(
                "Work order {} cannot move from {} to {}",
                id, current.order.status, status
            )));
        }
        let draft = WorkOrderDraft::from(&current.order).with_status(status, Utc::now());
        let detail = self
            .stores
            .work_orders
            .update_work_order(id, current.order.status, &draft)
            .await?
            .ok_or_else(|| concurrent_change(id))?;
        info!("🔄 Orden {} ahora {}", id, status);
        Ok(detail)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.stores.work_orders.delete_work_order(id).await? {
            return Err(not_found_error("Work order", id));
        }
        info!("🗑️ Orden {} eliminada", id);
        Ok(())
    }

    pub async fn add_service(&self, id: i64, request: AddServiceLineRequest) -> AppResult<WorkOrderDetail> {
        request.validate()?;
        let offer = self
            .stores
            .catalog
            .find_offer(request.service_id)
            .await?
            .ok_or_else(|| missing_reference("Service", request.service_id))?;

        let draft = OrderServiceDraft {
            service_id: offer.service_id,
            price: request.price.unwrap_or(offer.base_price),
            notes: clean_text(request.notes),
        };
        let detail = self.stores.work_orders.add_service_line(id, &draft).await?;
        info!(
            "🛠️ {} agregado a la orden {} (total {})",
            offer.name, id, detail.order.total_cost
        );
        Ok(detail)
    }

    pub async fn remove_service(&self, id: i64, line_id: i64) -> AppResult<WorkOrderDetail> {
        self.stores.work_orders.remove_service_line(id, line_id).await
    }

    pub async fn add_part(&self, id: i64, request: AddPartLineRequest) -> AppResult<WorkOrderDetail> {
        request.validate()?;
        let item = self
            .stores
            .inventory
            .find_item(request.item_id)
            .await?
            .ok_or_else(|| missing_reference("Inventory item", request.item_id))?;

        let draft = OrderPartDraft {
            item_id: item.item_id,
            quantity: request.quantity,
            price_per_unit: request.price_per_unit.unwrap_or(item.selling_price),
        };
        let detail = self.stores.work_orders.add_part_line(id, &draft).await?;
        info!(
            "🔩 {} {} agregados a la orden {} (total {})",
            draft.quantity, item.name, id, detail.order.total_cost
        );
        Ok(detail)
    }

    pub async fn remove_part(&self, id: i64, line_id: i64) -> AppResult<WorkOrderDetail> {
        self.stores.work_orders.remove_part_line(id, line_id).await
    }
}
