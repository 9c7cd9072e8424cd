//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL (ver `migrations/`). Los `*Draft` son los campos
//! editables que los controllers entregan a los stores.

pub mod customer;
pub mod employee;
pub mod inventory;
pub mod pending_service;
pub mod rating;
pub mod report;
pub mod service_offer;
pub mod vehicle;
pub mod work_order;
