use tracing::info;
use validator::Validate;

use crate::dto::service_dto::{CreateCategoryRequest, CreateServiceRequest, UpdateServiceRequest};
use crate::models::service_offer::{ServiceCategory, ServiceOffer, ServiceOfferDraft};
use crate::repositories::Stores;
use crate::state::AppState;
use crate::utils::errors::{missing_reference, not_found_error, AppResult};
use crate::utils::validation::clean_text;

/// Catálogo de servicios
pub struct ServiceOfferController {
    stores: Stores,
}

impl ServiceOfferController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
        }
    }

    async fn check_category(&self, category_id: Option<i64>) -> AppResult<()> {
        if let Some(category_id) = category_id {
            if self.stores.catalog.find_category(category_id).await?.is_none() {
                return Err(missing_reference("Service category", category_id));
            }
        }
        Ok(())
    }

    pub async fn list(&self) -> AppResult<Vec<ServiceOffer>> {
        self.stores.catalog.list_offers().await
    }

    pub async fn list_by_category(&self, category_id: i64) -> AppResult<Vec<ServiceOffer>> {
        if self.stores.catalog.find_category(category_id).await?.is_none() {
            return Err(not_found_error("Service category", category_id));
        }
        self.stores.catalog.list_offers_by_category(category_id).await
    }

    pub async fn get(&self, id: i64) -> AppResult<ServiceOffer> {
        self.stores
            .catalog
            .find_offer(id)
            .await?
            .ok_or_else(|| not_found_error("Service", id))
    }

    pub async fn create(&self, request: CreateServiceRequest) -> AppResult<ServiceOffer> {
        request.validate()?;
        let draft = ServiceOfferDraft::from(request);
        self.check_category(draft.category_id).await?;
        let offer = self.stores.catalog.insert_offer(&draft).await?;
        info!("🧽 Servicio {} agregado al catálogo: {}", offer.service_id, offer.name);
        Ok(offer)
    }

    pub async fn update(&self, id: i64, request: UpdateServiceRequest) -> AppResult<ServiceOffer> {
        request.validate()?;
        let current = self.get(id).await?;
        let draft = request.apply(ServiceOfferDraft::from(&current));
        self.check_category(draft.category_id).await?;
        self.stores
            .catalog
            .update_offer(id, &draft)
            .await?
            .ok_or_else(|| not_found_error("Service", id))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.stores.catalog.delete_offer(id).await? {
            return Err(not_found_error("Service", id));
        }
        Ok(())
    }

    pub async fn list_categories(&self) -> AppResult<Vec<ServiceCategory>> {
        self.stores.catalog.list_categories().await
    }

    pub async fn create_category(&self, request: CreateCategoryRequest) -> AppResult<ServiceCategory> {
        request.validate()?;
        let description = clean_text(request.description);
        self.stores
            .catalog
            .insert_category(request.name.trim(), description.as_deref())
            .await
    }
}
