//! Controllers
//!
//! Reglas de negocio de cada recurso: validación de requests, verificación
//! de referencias y máquina de estados. Cada controller se construye por
//! request a partir del `AppState`.

pub mod customer_controller;
pub mod employee_controller;
pub mod inventory_controller;
pub mod pending_service_controller;
pub mod rating_controller;
pub mod report_controller;
pub mod service_offer_controller;
pub mod vehicle_controller;
pub mod work_order_controller;
