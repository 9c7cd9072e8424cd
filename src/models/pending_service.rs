//! Modelo de PendingService
//!
//! Una visita de un vehículo, desde su ingreso hasta que se completa.
//! El estado avanza sólo por transiciones explícitas:
//!
//! ```text
//! pending ──assign──▶ in-progress ──complete──▶ completed
//!    │                   │   ▲
//!    └──────▶ delayed ◀──┘   └── (con empleado asignado)
//! ```

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;

/// Duración usada cuando el catálogo no define `estimated_hours`
pub const DEFAULT_ESTIMATED_HOURS: i64 = 1;

/// Estado de la visita - mapea al ENUM service_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "service_status")]
#[serde(rename_all = "kebab-case")]
pub enum ServiceStatus {
    #[sqlx(rename = "pending")]
    Pending,
    #[sqlx(rename = "in-progress")]
    InProgress,
    #[sqlx(rename = "completed")]
    Completed,
    #[sqlx(rename = "delayed")]
    Delayed,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::InProgress => "in-progress",
            ServiceStatus::Completed => "completed",
            ServiceStatus::Delayed => "delayed",
        }
    }

    /// Transiciones permitidas entre estados distintos
    pub fn can_transition_to(self, next: ServiceStatus) -> bool {
        use ServiceStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Delayed)
                | (Pending, Completed)
                | (InProgress, Delayed)
                | (InProgress, Completed)
                | (Delayed, InProgress)
                | (Delayed, Completed)
        )
    }

    /// Estado resultante al asignar un empleado; `None` si no se admite
    pub fn after_assignment(self) -> Option<ServiceStatus> {
        match self {
            ServiceStatus::Pending => Some(ServiceStatus::InProgress),
            ServiceStatus::InProgress | ServiceStatus::Delayed => Some(self),
            ServiceStatus::Completed => None,
        }
    }

    pub fn is_open(self) -> bool {
        self != ServiceStatus::Completed
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visita con los datos de vehículo, cliente, catálogo y empleado
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingService {
    pub service_id: i64,
    pub vehicle_id: i64,
    pub service_type_id: i64,
    pub employee_id: Option<i64>,
    pub entry_time: DateTime<Utc>,
    pub estimated_completion_time: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ServiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Campos que vienen de relaciones
    pub license_plate: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub client_name: String,
    pub client_phone: String,
    pub service_type_name: String,
    pub service_price: Decimal,
    pub service_hours: Option<Decimal>,
    pub employee_name: Option<String>,
    pub employee_position: Option<String>,
}

/// Datos para insertar una visita
#[derive(Debug, Clone)]
pub struct PendingServiceDraft {
    pub vehicle_id: i64,
    pub service_type_id: i64,
    pub employee_id: Option<i64>,
    pub entry_time: DateTime<Utc>,
    pub estimated_completion_time: DateTime<Utc>,
    pub status: ServiceStatus,
    pub notes: Option<String>,
}

/// Campos libres editables de una visita abierta
#[derive(Debug, Clone)]
pub struct PendingServiceChanges {
    pub notes: Option<String>,
    pub estimated_completion_time: DateTime<Utc>,
}

/// Filtros del listado: estado y búsqueda por matrícula o cliente
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PendingServiceFilters {
    pub status: Option<ServiceStatus>,
    pub q: Option<String>,
}

impl PendingServiceFilters {
    /// Término de búsqueda no vacío, sin espacios externos
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Hora estimada de finalización: ingreso + horas del catálogo (1 h por defecto)
pub fn estimated_completion(
    entry_time: DateTime<Utc>,
    estimated_hours: Option<Decimal>,
) -> DateTime<Utc> {
    let seconds = estimated_hours
        .filter(|hours| *hours > Decimal::ZERO)
        .and_then(|hours| (hours * Decimal::from(3600)).round().to_i64())
        .unwrap_or(DEFAULT_ESTIMATED_HOURS * 3600);
    entry_time + Duration::seconds(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_estimated_completion_defaults_to_one_hour() {
        let entry = Utc::now();
        assert_eq!(estimated_completion(entry, None), entry + Duration::hours(1));
        assert_eq!(
            estimated_completion(entry, Some(Decimal::ZERO)),
            entry + Duration::hours(1)
        );
    }

    #[test]
    fn test_estimated_completion_uses_fractional_hours() {
        let entry = Utc::now();
        let hours = Decimal::from_str("1.5").unwrap();
        assert_eq!(
            estimated_completion(entry, Some(hours)),
            entry + Duration::minutes(90)
        );
    }

    #[test]
    fn test_completed_is_terminal() {
        for next in [
            ServiceStatus::Pending,
            ServiceStatus::InProgress,
            ServiceStatus::Delayed,
            ServiceStatus::Completed,
        ] {
            assert!(!ServiceStatus::Completed.can_transition_to(next));
        }
    }

    #[test]
    fn test_transitions() {
        assert!(ServiceStatus::Pending.can_transition_to(ServiceStatus::InProgress));
        assert!(ServiceStatus::InProgress.can_transition_to(ServiceStatus::Delayed));
        assert!(ServiceStatus::Delayed.can_transition_to(ServiceStatus::InProgress));
        assert!(!ServiceStatus::InProgress.can_transition_to(ServiceStatus::Pending));
        assert!(!ServiceStatus::Pending.can_transition_to(ServiceStatus::Pending));
    }

    #[test]
    fn test_assignment_moves_pending_to_in_progress() {
        assert_eq!(
            ServiceStatus::Pending.after_assignment(),
            Some(ServiceStatus::InProgress)
        );
        assert_eq!(
            ServiceStatus::Delayed.after_assignment(),
            Some(ServiceStatus::Delayed)
        );
        assert_eq!(ServiceStatus::Completed.after_assignment(), None);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&ServiceStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let parsed: ServiceStatus = serde_json::from_str("\"delayed\"").unwrap();
        assert_eq!(parsed, ServiceStatus::Delayed);
    }
}
