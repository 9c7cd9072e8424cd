//! Modelo de Customer
//!
//! Mapea la tabla customers. Un cliente es dueño de cero o más vehículos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::vehicle::Vehicle;

/// Customer principal - mapea exactamente a la tabla customers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campos editables de un cliente
#[derive(Debug, Clone)]
pub struct CustomerDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
}

impl From<&Customer> for CustomerDraft {
    fn from(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
        }
    }
}

/// Cliente junto con sus vehículos
#[derive(Debug, Clone, Serialize)]
pub struct CustomerWithVehicles {
    #[serde(flatten)]
    pub customer: Customer,
    pub vehicles: Vec<Vehicle>,
}
