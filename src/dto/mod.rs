//! Objetos de transferencia (requests y responses HTTP)
//!
//! Los requests derivan `Validate`; los controllers validan antes de tocar
//! cualquier store y convierten el request en el `*Draft` del modelo.

pub mod common_dto;
pub mod customer_dto;
pub mod employee_dto;
pub mod inventory_dto;
pub mod pending_service_dto;
pub mod rating_dto;
pub mod report_dto;
pub mod service_dto;
pub mod vehicle_dto;
pub mod work_order_dto;

pub use common_dto::*;
