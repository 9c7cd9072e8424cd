//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::Stores;

#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub config: Arc<EnvironmentConfig>,
}

impl AppState {
    pub fn new(stores: Stores, config: EnvironmentConfig) -> Self {
        Self {
            stores,
            config: Arc::new(config),
        }
    }

    /// Estado sobre el store en memoria con la configuración por defecto
    pub fn in_memory() -> Self {
        Self::new(Stores::in_memory(), EnvironmentConfig::default())
    }
}
