use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::inventory::InventoryItemDraft;
use crate::utils::validation::{clean_text, validate_non_negative, validate_not_blank, validate_positive};

fn validate_non_zero(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::new("non_zero"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInventoryItemRequest {
    #[validate(length(max = 120), custom = "validate_not_blank")]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 60), custom = "validate_not_blank")]
    pub category: String,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub quantity: Decimal,
    #[validate(length(max = 20), custom = "validate_not_blank")]
    pub unit: String,
    #[validate(custom = "validate_non_negative")]
    pub cost_price: Decimal,
    #[validate(custom = "validate_non_negative")]
    pub selling_price: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub reorder_level: Decimal,
}

impl From<CreateInventoryItemRequest> for InventoryItemDraft {
    fn from(request: CreateInventoryItemRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            description: clean_text(request.description),
            category: request.category.trim().to_string(),
            quantity: request.quantity,
            unit: request.unit.trim().to_string(),
            cost_price: request.cost_price,
            selling_price: request.selling_price,
            reorder_level: request.reorder_level,
        }
    }
}

/// La cantidad no se edita aquí: se usa `PATCH /inventory/:id/quantity`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateInventoryItemRequest {
    #[validate(length(max = 120), custom = "validate_not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 60), custom = "validate_not_blank")]
    pub category: Option<String>,
    #[validate(length(max = 20), custom = "validate_not_blank")]
    pub unit: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub cost_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub selling_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub reorder_level: Option<Decimal>,
}

impl UpdateInventoryItemRequest {
    pub fn apply(self, mut draft: InventoryItemDraft) -> InventoryItemDraft {
        if let Some(name) = self.name {
            draft.name = name.trim().to_string();
        }
        if self.description.is_some() {
            draft.description = clean_text(self.description);
        }
        if let Some(category) = self.category {
            draft.category = category.trim().to_string();
        }
        if let Some(unit) = self.unit {
            draft.unit = unit.trim().to_string();
        }
        if let Some(cost_price) = self.cost_price {
            draft.cost_price = cost_price;
        }
        if let Some(selling_price) = self.selling_price {
            draft.selling_price = selling_price;
        }
        if let Some(reorder_level) = self.reorder_level {
            draft.reorder_level = reorder_level;
        }
        draft
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustQuantityRequest {
    #[validate(custom = "validate_non_zero")]
    pub adjustment: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordUsageRequest {
    pub item_id: i64,
    #[validate(custom = "validate_positive")]
    pub quantity: Decimal,
    pub service_id: Option<i64>,
    pub employee_id: Option<i64>,
    pub usage_date: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_adjustment_is_invalid() {
        let zero = AdjustQuantityRequest {
            adjustment: Decimal::ZERO,
        };
        assert!(zero.validate().is_err());
        let negative = AdjustQuantityRequest {
            adjustment: Decimal::from(-5),
        };
        assert!(negative.validate().is_ok());
    }

    #[test]
    fn test_item_defaults_from_json() {
        let request: CreateInventoryItemRequest = serde_json::from_str(
            r#"{"name":"Cera","category":"Acabado","unit":"kg","cost_price":10,"selling_price":"15.50"}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
        let draft = InventoryItemDraft::from(request);
        assert_eq!(draft.quantity, Decimal::ZERO);
        assert_eq!(draft.selling_price, Decimal::new(1550, 2));
    }
}
