//! Modelos de inventario
//!
//! `InventoryItem` lleva la existencia actual; `InventoryUsage` es el
//! registro append-only de consumos. Cada consumo descuenta la existencia
//! en la misma transacción, y la existencia nunca queda negativa.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Límite por defecto del registro global de consumos
pub const DEFAULT_USAGE_LIMIT: i64 = 100;
pub const MAX_USAGE_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub item_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: Decimal,
    pub unit: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub reorder_level: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Un artículo en el umbral de reorden ya cuenta como bajo
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// Campos editables de un artículo. La cantidad sólo se fija al crear;
/// después cambia por ajustes y consumos.
#[derive(Debug, Clone)]
pub struct InventoryItemDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: Decimal,
    pub unit: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub reorder_level: Decimal,
}

impl From<&InventoryItem> for InventoryItemDraft {
    fn from(item: &InventoryItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            cost_price: item.cost_price,
            selling_price: item.selling_price,
            reorder_level: item.reorder_level,
        }
    }
}

/// Consumo registrado con los nombres de artículo, empleado y servicio
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryUsage {
    pub usage_id: i64,
    pub item_id: i64,
    pub service_id: Option<i64>,
    pub employee_id: Option<i64>,
    pub quantity: Decimal,
    pub usage_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub item_name: String,
    pub employee_name: Option<String>,
    pub service_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UsageDraft {
    pub item_id: i64,
    pub service_id: Option<i64>,
    pub employee_id: Option<i64>,
    pub quantity: Decimal,
    pub usage_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Resumen de artículo bajo en existencia para el dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockItem {
    pub name: String,
    pub quantity: Decimal,
    pub reorder_level: Decimal,
}

impl From<&InventoryItem> for LowStockItem {
    fn from(item: &InventoryItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            reorder_level: item.reorder_level,
        }
    }
}

/// Query del registro global de consumos
#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    pub limit: Option<i64>,
}

impl UsageQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_USAGE_LIMIT)
            .min(MAX_USAGE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_limit_bounds() {
        assert_eq!(UsageQuery { limit: None }.effective_limit(), 100);
        assert_eq!(UsageQuery { limit: Some(0) }.effective_limit(), 100);
        assert_eq!(UsageQuery { limit: Some(20) }.effective_limit(), 20);
        assert_eq!(UsageQuery { limit: Some(50_000) }.effective_limit(), 1000);
    }
}
