//! Modelos de calificación de servicios
//!
//! Un enlace de calificación es un token opaco, de un solo uso y con
//! vencimiento, emitido al completar una visita.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RatingLink {
    pub token: String,
    pub service_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Estado de un token respecto a un instante dado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Active,
    Used,
    Expired,
}

impl RatingLink {
    pub fn state_at(&self, now: DateTime<Utc>) -> LinkState {
        if self.used_at.is_some() {
            LinkState::Used
        } else if self.expires_at <= now {
            LinkState::Expired
        } else {
            LinkState::Active
        }
    }
}

/// Token recién generado, aún no persistido
#[derive(Debug, Clone)]
pub struct NewRatingLink {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Identidad del vehículo asociado a un token válido
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RatingLinkValidation {
    pub service_id: i64,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub license_plate: String,
}

/// Respuesta de generación de enlace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingLinkGeneration {
    pub token: String,
    pub rating_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceRating {
    pub rating_id: i64,
    pub service_id: i64,
    pub wait_time_rating: i32,
    pub staff_friendliness_rating: i32,
    pub service_quality_rating: i32,
    pub customer_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RatingDraft {
    pub service_id: i64,
    pub wait_time_rating: i32,
    pub staff_friendliness_rating: i32,
    pub service_quality_rating: i32,
    pub customer_comment: Option<String>,
}

/// Promedios de todas las calificaciones
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RatingReport {
    pub avg_wait_time: f64,
    pub avg_staff_friendliness: f64,
    pub avg_service_quality: f64,
    pub total_ratings: i64,
}

impl RatingReport {
    pub fn from_ratings(ratings: &[ServiceRating]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }
        let count = ratings.len() as f64;
        let avg = |f: fn(&ServiceRating) -> i32| {
            let total: i64 = ratings.iter().map(|r| i64::from(f(r))).sum();
            (total as f64 / count * 100.0).round() / 100.0
        };
        Self {
            avg_wait_time: avg(|r| r.wait_time_rating),
            avg_staff_friendliness: avg(|r| r.staff_friendliness_rating),
            avg_service_quality: avg(|r| r.service_quality_rating),
            total_ratings: ratings.len() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn rating(wait: i32, staff: i32, quality: i32) -> ServiceRating {
        ServiceRating {
            rating_id: 1,
            service_id: 1,
            wait_time_rating: wait,
            staff_friendliness_rating: staff,
            service_quality_rating: quality,
            customer_comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_report_averages() {
        let report = RatingReport::from_ratings(&[rating(4, 5, 4), rating(3, 4, 5), rating(5, 5, 5)]);
        assert_eq!(report.total_ratings, 3);
        assert_eq!(report.avg_wait_time, 4.0);
        assert_eq!(report.avg_staff_friendliness, 4.67);
        assert_eq!(report.avg_service_quality, 4.67);
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(RatingReport::from_ratings(&[]), RatingReport::default());
    }

    #[test]
    fn test_link_state() {
        let now = Utc::now();
        let mut link = RatingLink {
            token: "t".into(),
            service_id: 1,
            created_at: now,
            expires_at: now + Duration::hours(1),
            used_at: None,
        };
        assert_eq!(link.state_at(now), LinkState::Active);
        assert_eq!(link.state_at(now + Duration::hours(2)), LinkState::Expired);
        link.used_at = Some(now);
        assert_eq!(link.state_at(now), LinkState::Used);
    }
}
