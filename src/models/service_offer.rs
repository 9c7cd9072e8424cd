//! Modelo del catálogo de servicios
//!
//! Un `ServiceOffer` es una entrada del catálogo (Lavado Básico, Encerado...)
//! con precio base y duración estimada. Las categorías agrupan entradas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Entrada del catálogo con el nombre de su categoría
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceOffer {
    pub service_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub estimated_hours: Option<Decimal>,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServiceOfferDraft {
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub estimated_hours: Option<Decimal>,
    pub category_id: Option<i64>,
}

impl From<&ServiceOffer> for ServiceOfferDraft {
    fn from(offer: &ServiceOffer) -> Self {
        Self {
            name: offer.name.clone(),
            description: offer.description.clone(),
            base_price: offer.base_price,
            estimated_hours: offer.estimated_hours,
            category_id: offer.category_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceCategory {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
}
