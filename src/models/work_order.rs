//! Modelos de órdenes de trabajo
//!
//! Una orden agrupa líneas de servicio y de repuestos para un vehículo.
//! `total_cost` siempre es la suma de sus líneas y se recalcula en la misma
//! transacción que modifica cualquier línea.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;

/// Estado de la orden - mapea al ENUM work_order_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "work_order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl WorkOrderStatus {
    /// `completed` y `cancelled` no admiten más cambios
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: WorkOrderStatus) -> bool {
        !self.is_terminal() && self != next
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkOrder {
    pub order_id: i64,
    pub vehicle_id: i64,
    pub status: WorkOrderStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub total_cost: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub make: String,
    pub model: String,
    pub license_plate: String,
    pub customer_name: String,
}

#[derive(Debug, Clone)]
pub struct WorkOrderDraft {
    pub vehicle_id: i64,
    pub status: WorkOrderStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<&WorkOrder> for WorkOrderDraft {
    fn from(order: &WorkOrder) -> Self {
        Self {
            vehicle_id: order.vehicle_id,
            status: order.status,
            start_date: order.start_date,
            completion_date: order.completion_date,
            notes: order.notes.clone(),
        }
    }
}

impl WorkOrderDraft {
    /// Aplica un cambio de estado sellando las fechas correspondientes
    pub fn with_status(mut self, status: WorkOrderStatus, now: DateTime<Utc>) -> Self {
        self.status = status;
        match status {
            WorkOrderStatus::InProgress if self.start_date.is_none() => {
                self.start_date = Some(now);
            }
            WorkOrderStatus::Completed => {
                self.start_date.get_or_insert(now);
                self.completion_date = Some(now);
            }
            _ => {}
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderServiceLine {
    pub order_service_id: i64,
    pub order_id: i64,
    pub service_id: i64,
    pub price: Decimal,
    pub notes: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderPartLine {
    pub order_part_id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
    pub name: String,
}

impl OrderPartLine {
    pub fn subtotal(&self) -> Decimal {
        self.quantity * self.price_per_unit
    }
}

#[derive(Debug, Clone)]
pub struct OrderServiceDraft {
    pub service_id: i64,
    pub price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderPartDraft {
    pub item_id: i64,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
}

/// Orden con sus líneas
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderDetail {
    #[serde(flatten)]
    pub order: WorkOrder,
    pub services: Vec<OrderServiceLine>,
    pub parts: Vec<OrderPartLine>,
}

/// Filtro del listado de órdenes
#[derive(Debug, Default, Deserialize)]
pub struct WorkOrderFilters {
    pub status: Option<WorkOrderStatus>,
}

/// Total de la orden: servicios más repuestos
pub fn order_total(services: &[OrderServiceLine], parts: &[OrderPartLine]) -> Decimal {
    let services: Decimal = services.iter().map(|line| line.price).sum();
    let parts: Decimal = parts.iter().map(OrderPartLine::subtotal).sum();
    services + parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_order_total_sums_services_and_parts() {
        let services = vec![OrderServiceLine {
            order_service_id: 1,
            order_id: 1,
            service_id: 1,
            price: dec("150.00"),
            notes: None,
            name: "Lavado Completo".into(),
        }];
        let parts = vec![OrderPartLine {
            order_part_id: 1,
            order_id: 1,
            item_id: 3,
            quantity: dec("2"),
            price_per_unit: dec("12.50"),
            name: "Cera".into(),
        }];
        assert_eq!(order_total(&services, &parts), dec("175.00"));
        assert_eq!(order_total(&[], &[]), Decimal::ZERO);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(WorkOrderStatus::Completed.is_terminal());
        assert!(WorkOrderStatus::Cancelled.is_terminal());
        assert!(!WorkOrderStatus::Completed.can_transition_to(WorkOrderStatus::Pending));
        assert!(WorkOrderStatus::Pending.can_transition_to(WorkOrderStatus::InProgress));
    }

    #[test]
    fn test_display_matches_wire_value() {
        assert_eq!(WorkOrderStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            serde_json::to_value(WorkOrderStatus::InProgress).unwrap(),
            serde_json::json!(WorkOrderStatus::InProgress.to_string())
        );
    }

    #[test]
    fn test_with_status_stamps_dates() {
        let now = Utc::now();
        let draft = WorkOrderDraft {
            vehicle_id: 1,
            status: WorkOrderStatus::Pending,
            start_date: None,
            completion_date: None,
            notes: None,
        };
        let started = draft.clone().with_status(WorkOrderStatus::InProgress, now);
        assert_eq!(started.start_date, Some(now));
        assert!(started.completion_date.is_none());

        let done = draft.with_status(WorkOrderStatus::Completed, now);
        assert_eq!(done.completion_date, Some(now));
        assert_eq!(done.start_date, Some(now));
    }
}
