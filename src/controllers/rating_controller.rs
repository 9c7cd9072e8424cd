//! Enlaces y calificaciones de servicio
//!
//! Los tokens son de un solo uso y vencen; un token desconocido responde 404
//! y uno usado o vencido responde 410.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::config::environment::EnvironmentConfig;
use crate::dto::rating_dto::SubmitRatingRequest;
use crate::models::pending_service::{PendingService, ServiceStatus};
use crate::models::rating::{
    LinkState, RatingLinkGeneration, RatingLinkValidation, RatingReport, ServiceRating,
};
use crate::repositories::Stores;
use crate::services::rating_token;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct RatingController {
    stores: Stores,
    config: Arc<EnvironmentConfig>,
}

impl RatingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
            config: state.config.clone(),
        }
    }

    async fn completed_service(&self, service_id: i64) -> AppResult<PendingService> {
        let service = self
            .stores
            .pending_services
            .find_pending_service(service_id)
            .await?
            .ok_or_else(|| not_found_error("Pending service", service_id))?;
        if service.status != ServiceStatus::Completed {
            return Err(AppError::Conflict(format!(
                "Pending service {} is not completed yet",
                service_id
            )));
        }
        Ok(service)
    }

    /// Devuelve el enlace vigente de la visita o emite uno nuevo
    pub async fn generate_link(&self, service_id: i64) -> AppResult<RatingLinkGeneration> {
        self.completed_service(service_id).await?;
        if !self.stores.ratings.list_ratings(service_id).await?.is_empty() {
            return Err(AppError::Conflict(format!(
                "Service {} has already been rated",
                service_id
            )));
        }
        let now = Utc::now();

        let link = match self.stores.ratings.find_active_link(service_id, now).await? {
            Some(link) => link,
            None => {
                let new_link = rating_token::new_link(now, self.config.rating_link_ttl_hours);
                let link = self.stores.ratings.insert_link(service_id, &new_link).await?;
                info!("🔗 Enlace de calificación emitido para la visita {}", service_id);
                link
            }
        };

        Ok(RatingLinkGeneration {
            rating_url: rating_token::rating_url(&self.config.rating_base_url, &link.token),
            token: link.token,
        })
    }

    pub async fn validate_link(&self, token: &str) -> AppResult<RatingLinkValidation> {
        let link = self
            .stores
            .ratings
            .find_link(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Rating link not found".to_string()))?;

        match link.state_at(Utc::now()) {
            LinkState::Used => Err(AppError::Gone("Rating link has already been used".to_string())),
            LinkState::Expired => Err(AppError::Gone("Rating link has expired".to_string())),
            LinkState::Active => self
                .stores
                .ratings
                .link_validation(token)
                .await?
                .ok_or_else(|| AppError::NotFound("Rating link not found".to_string())),
        }
    }

    pub async fn submit(&self, service_id: i64, request: SubmitRatingRequest) -> AppResult<ServiceRating> {
        request.validate()?;
        self.completed_service(service_id).await?;
        let (draft, token) = request.into_draft(service_id);

        if let Some(token) = token.as_deref() {
            let link = self
                .stores
                .ratings
                .find_link(token)
                .await?
                .ok_or_else(|| AppError::NotFound("Rating link not found".to_string()))?;
            if link.service_id != service_id {
                return Err(AppError::BadRequest(format!(
                    "Rating link does not belong to service {}",
                    service_id
                )));
            }
        }

        let rating = self
            .stores
            .ratings
            .submit_rating(&draft, token.as_deref(), Utc::now())
            .await?;
        info!(
            "⭐ Calificación para la visita {}: {}/{}/{}",
            service_id,
            rating.wait_time_rating,
            rating.staff_friendliness_rating,
            rating.service_quality_rating
        );
        Ok(rating)
    }

    pub async fn ratings(&self, service_id: i64) -> AppResult<Vec<ServiceRating>> {
        if self
            .stores
            .pending_services
            .find_pending_service(service_id)
            .await?
            .is_none()
        {
            return Err(not_found_error("Pending service", service_id));
        }
        self.stores.ratings.list_ratings(service_id).await
    }

    pub async fn report(&self) -> AppResult<RatingReport> {
        self.stores.ratings.rating_report().await
    }
}
