use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::service_offer::ServiceOfferDraft;
use crate::utils::validation::{clean_text, validate_non_negative, validate_not_blank, validate_positive};

// Request para crear una entrada del catálogo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(max = 120), custom = "validate_not_blank")]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub base_price: Decimal,
    #[validate(custom = "validate_positive")]
    pub estimated_hours: Option<Decimal>,
    pub category_id: Option<i64>,
}

impl From<CreateServiceRequest> for ServiceOfferDraft {
    fn from(request: CreateServiceRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            description: clean_text(request.description),
            base_price: request.base_price,
            estimated_hours: request.estimated_hours,
            category_id: request.category_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    #[validate(length(max = 120), custom = "validate_not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub base_price: Option<Decimal>,
    #[validate(custom = "validate_positive")]
    pub estimated_hours: Option<Decimal>,
    pub category_id: Option<i64>,
}

impl UpdateServiceRequest {
    pub fn apply(self, mut draft: ServiceOfferDraft) -> ServiceOfferDraft {
        if let Some(name) = self.name {
            draft.name = name.trim().to_string();
        }
        if self.description.is_some() {
            draft.description = clean_text(self.description);
        }
        if let Some(base_price) = self.base_price {
            draft.base_price = base_price;
        }
        if self.estimated_hours.is_some() {
            draft.estimated_hours = self.estimated_hours;
        }
        if self.category_id.is_some() {
            draft.category_id = self.category_id;
        }
        draft
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(max = 80), custom = "validate_not_blank")]
    pub name: String,
    pub description: Option<String>,
}
