use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::dto::inventory_dto::{
    AdjustQuantityRequest, CreateInventoryItemRequest, RecordUsageRequest,
    UpdateInventoryItemRequest,
};
use crate::models::inventory::{
    InventoryItem, InventoryItemDraft, InventoryUsage, UsageDraft, UsageQuery,
};
use crate::repositories::Stores;
use crate::state::AppState;
use crate::utils::errors::{missing_reference, not_found_error, AppResult};
use crate::utils::validation::clean_text;

/// Existencias y registro de consumos
pub struct InventoryController {
    stores: Stores,
}

impl InventoryController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
        }
    }

    pub async fn list(&self, term: Option<&str>) -> AppResult<Vec<InventoryItem>> {
        match term {
            Some(term) => self.stores.inventory.search_items(term).await,
            None => self.stores.inventory.list_items().await,
        }
    }

    pub async fn low_stock(&self) -> AppResult<Vec<InventoryItem>> {
        self.stores.inventory.list_low_stock().await
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        self.stores.inventory.list_item_categories().await
    }

    pub async fn by_category(&self, category: &str) -> AppResult<Vec<InventoryItem>> {
        self.stores.inventory.list_items_by_category(category.trim()).await
    }

    pub async fn get(&self, id: i64) -> AppResult<InventoryItem> {
        self.stores
            .inventory
            .find_item(id)
            .await?
            .ok_or_else(|| not_found_error("Inventory item", id))
    }

    pub async fn create(&self, request: CreateInventoryItemRequest) -> AppResult<InventoryItem> {
        request.validate()?;
        let item = self
            .stores
            .inventory
            .insert_item(&InventoryItemDraft::from(request))
            .await?;
        info!(
            "📦 Artículo {} agregado: {} {} de {}",
            item.item_id, item.quantity, item.unit, item.name
        );
        Ok(item)
    }

    pub async fn update(&self, id: i64, request: UpdateInventoryItemRequest) -> AppResult<InventoryItem> {
        request.validate()?;
        let current = self.get(id).await?;
        let draft = request.apply(InventoryItemDraft::from(&current));
        self.stores
            .inventory
            .update_item(id, &draft)
            .await?
            .ok_or_else(|| not_found_error("Inventory item", id))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.stores.inventory.delete_item(id).await? {
            return Err(not_found_error("Inventory item", id));
        }
        info!("🗑️ Artículo {} eliminado", id);
        Ok(())
    }

    pub async fn adjust(&self, id: i64, request: AdjustQuantityRequest) -> AppResult<InventoryItem> {
        request.validate()?;
        let item = self
            .stores
            .inventory
            .adjust_quantity(id, request.adjustment)
            .await?;
        info!(
            "📦 Ajuste de {} en {}: existencia {}",
            request.adjustment, item.name, item.quantity
        );
        Ok(item)
    }

    pub async fn record_usage(&self, request: RecordUsageRequest) -> AppResult<InventoryUsage> {
        request.validate()?;

        if let Some(service_id) = request.service_id {
            if self
                .stores
                .pending_services
                .find_pending_service(service_id)
                .await?
                .is_none()
            {
                return Err(missing_reference("Pending service", service_id));
            }
        }
        if let Some(employee_id) = request.employee_id {
            if self
                .stores
                .employees
                .find_employee(employee_id)
                .await?
                .is_none()
            {
                return Err(missing_reference("Employee", employee_id));
            }
        }

        let draft = UsageDraft {
            item_id: request.item_id,
            service_id: request.service_id,
            employee_id: request.employee_id,
            quantity: request.quantity,
            usage_date: request.usage_date.unwrap_or_else(Utc::now),
            notes: clean_text(request.notes),
        };
        let usage = self.stores.inventory.record_usage(&draft).await?;
        info!("🧴 Consumo de {} de {}", usage.quantity, usage.item_name);
        Ok(usage)
    }

    pub async fn usage_for_item(&self, id: i64) -> AppResult<Vec<InventoryUsage>> {
        self.get(id).await?;
        self.stores.inventory.list_usage_for_item(id).await
    }

    pub async fn usage_log(&self, query: &UsageQuery) -> AppResult<Vec<InventoryUsage>> {
        self.stores.inventory.list_usage(query.effective_limit()).await
    }
}
