use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::rating::{
    NewRatingLink, RatingDraft, RatingLink, RatingLinkValidation, RatingReport, ServiceRating,
};
use crate::repositories::RatingStore;
use crate::utils::errors::{db_error, AppError, AppResult};

pub struct RatingRepository {
    pool: PgPool,
}

impl RatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingStore for RatingRepository {
    async fn find_active_link(&self, service_id: i64, now: DateTime<Utc>) -> AppResult<Option<RatingLink>> {
        sqlx::query_as::<_, RatingLink>(
            r#"
            SELECT * FROM service_rating_links
            WHERE service_id = $1 AND used_at IS NULL AND expires_at > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(service_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding active rating link"))
    }

    async fn insert_link(&self, service_id: i64, link: &NewRatingLink) -> AppResult<RatingLink> {
        sqlx::query_as::<_, RatingLink>(
            r#"
            INSERT INTO service_rating_links (token, service_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&link.token)
        .bind(service_id)
        .bind(link.created_at)
        .bind(link.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating rating link"))
    }

    async fn find_link(&self, token: &str) -> AppResult<Option<RatingLink>> {
        sqlx::query_as::<_, RatingLink>("SELECT * FROM service_rating_links WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding rating link"))
    }

    async fn link_validation(&self, token: &str) -> AppResult<Option<RatingLinkValidation>> {
        sqlx::query_as::<_, RatingLinkValidation>(
            r#"
            SELECT l.service_id, v.make AS vehicle_make, v.model AS vehicle_model, v.license_plate
            FROM service_rating_links l
            JOIN pending_services ps ON ps.service_id = l.service_id
            JOIN vehicles v ON v.vehicle_id = ps.vehicle_id
            WHERE l.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("validating rating link"))
    }

    async fn submit_rating(
        &self,
        draft: &RatingDraft,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<ServiceRating> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting rating"))?;

        if let Some(token) = token {
            let consumed: Option<(String,)> = sqlx::query_as(
                r#"
                UPDATE service_rating_links
                SET used_at = $3
                WHERE token = $1 AND service_id = $2 AND used_at IS NULL AND expires_at > $3
                RETURNING token
                "#,
            )
            .bind(token)
            .bind(draft.service_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("consuming rating link"))?;

            if consumed.is_none() {
                return Err(AppError::Gone(
                    "Rating link is no longer valid for this service".to_string(),
                ));
            }
        }

        let rating = sqlx::query_as::<_, ServiceRating>(
            r#"
            INSERT INTO service_ratings
                (service_id, wait_time_rating, staff_friendliness_rating, service_quality_rating,
                 customer_comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(draft.service_id)
        .bind(draft.wait_time_rating)
        .bind(draft.staff_friendliness_rating)
        .bind(draft.service_quality_rating)
        .bind(&draft.customer_comment)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match db_error("submitting rating")(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "Service {} has already been rated",
                draft.service_id
            )),
            other => other,
        })?;

        // Con o sin token, la visita ya no admite otra calificación
        sqlx::query(
            "UPDATE service_rating_links SET used_at = $2 WHERE service_id = $1 AND used_at IS NULL",
        )
        .bind(draft.service_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("closing rating links"))?;

        tx.commit().await.map_err(db_error("committing rating"))?;
        Ok(rating)
    }

    async fn list_ratings(&self, service_id: i64) -> AppResult<Vec<ServiceRating>> {
        sqlx::query_as::<_, ServiceRating>(
            "SELECT * FROM service_ratings WHERE service_id = $1 ORDER BY created_at DESC",
        )
        .bind(service_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing ratings"))
    }

    async fn rating_report(&self) -> AppResult<RatingReport> {
        let (avg_wait_time, avg_staff_friendliness, avg_service_quality, total_ratings): (f64, f64, f64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COALESCE(ROUND(AVG(wait_time_rating)::numeric, 2), 0)::float8,
                    COALESCE(ROUND(AVG(staff_friendliness_rating)::numeric, 2), 0)::float8,
                    COALESCE(ROUND(AVG(service_quality_rating)::numeric, 2), 0)::float8,
                    COUNT(*)
                FROM service_ratings
                "#,
            )
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("building rating report"))?;

        Ok(RatingReport {
            avg_wait_time,
            avg_staff_friendliness,
            avg_service_quality,
            total_ratings,
        })
    }
}
