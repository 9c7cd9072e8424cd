//! Backend del panel de administración del lavadero
//!
//! API REST sobre axum: clientes, vehículos, empleados, catálogo de
//! servicios, visitas, inventario, órdenes de trabajo, calificaciones y
//! reportes. Los datos viven en PostgreSQL o, sin `DATABASE_URL`, en un
//! store en memoria.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;
use tower_http::compression::CompressionLayer;

use crate::middleware::{cors_for, trace_middleware};
use crate::state::AppState;

/// Router completo con sus capas, listo para servir
pub fn create_app(state: AppState) -> Router {
    let cors = cors_for(&state.config);
    routes::create_api_router()
        .layer(trace_middleware())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
