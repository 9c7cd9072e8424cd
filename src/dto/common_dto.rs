use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Respuesta de los endpoints de borrado
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn deleted(resource: &str, id: i64) -> Self {
        Self {
            success: true,
            message: format!("{} {} deleted", resource, id),
        }
    }
}

/// Query `?q=` de los listados con búsqueda
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub store: String,
}
