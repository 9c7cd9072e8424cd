use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::pending_service::{
    PendingService, PendingServiceChanges, PendingServiceDraft, PendingServiceFilters,
    ServiceStatus,
};
use crate::models::rating::{NewRatingLink, RatingLink};
use crate::models::report::{CompletedVisit, ReportRange};
use crate::repositories::table::{fetch_view, like_pattern, PgTable, Record};
use crate::repositories::PendingServiceStore;
use crate::utils::errors::{db_error, AppError, AppResult};

impl Record for PendingService {
    const TABLE: &'static str = "pending_services";
    const KEY: &'static str = "service_id";
    const VIEW: &'static str = r#"
        SELECT t.*,
               v.license_plate, v.make, v.model, v.year, v.color,
               c.name AS client_name, c.phone AS client_phone,
               s.name AS service_type_name, s.base_price AS service_price,
               s.estimated_hours AS service_hours,
               e.name AS employee_name, e.position AS employee_position
        FROM pending_services t
        JOIN vehicles v ON v.vehicle_id = t.vehicle_id
        JOIN customers c ON c.customer_id = v.customer_id
        JOIN services s ON s.service_id = t.service_type_id
        LEFT JOIN employees e ON e.employee_id = t.employee_id
    "#;
    const ORDER_BY: &'static str = "t.entry_time DESC";
    const SEARCH_COLUMNS: &'static [&'static str] = &["v.license_plate", "c.name"];
}

pub struct PendingServiceRepository {
    table: PgTable<PendingService>,
}

impl PendingServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            table: PgTable::new(pool),
        }
    }

    async fn reload(&self, id: i64) -> AppResult<PendingService> {
        self.table
            .by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("pending service {} vanished", id)))
    }
}

#[async_trait]
impl PendingServiceStore for PendingServiceRepository {
    async fn list_pending_services(&self, filters: &PendingServiceFilters) -> AppResult<Vec<PendingService>> {
        let sql = format!(
            r#"{}
            WHERE ($1::service_status IS NULL OR t.status = $1)
              AND ($2::text IS NULL OR v.license_plate ILIKE $2 OR c.name ILIKE $2)
            ORDER BY {}"#,
            PendingService::VIEW,
            PendingService::ORDER_BY
        );
        sqlx::query_as::<_, PendingService>(&sql)
            .bind(filters.status)
            .bind(filters.term().map(like_pattern))
            .fetch_all(self.table.pool())
            .await
            .map_err(db_error("listing pending services"))
    }

    async fn list_pending_services_by_vehicle(&self, vehicle_id: i64) -> AppResult<Vec<PendingService>> {
        self.table.filter_by("t.vehicle_id", vehicle_id).await
    }

    async fn find_pending_service(&self, id: i64) -> AppResult<Option<PendingService>> {
        self.table.by_id(id).await
    }

    async fn insert_pending_service(&self, draft: &PendingServiceDraft) -> AppResult<PendingService> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO pending_services
                (vehicle_id, service_type_id, employee_id, entry_time, estimated_completion_time, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING service_id
            "#,
        )
        .bind(draft.vehicle_id)
        .bind(draft.service_type_id)
        .bind(draft.employee_id)
        .bind(draft.entry_time)
        .bind(draft.estimated_completion_time)
        .bind(draft.status)
        .bind(&draft.notes)
        .fetch_one(self.table.pool())
        .await
        .map_err(db_error("creating pending service"))?;

        self.reload(id).await
    }

    async fn update_pending_service(
        &self,
        id: i64,
        changes: &PendingServiceChanges,
    ) -> AppResult<Option<PendingService>> {
        let updated = sqlx::query(
            r#"
            UPDATE pending_services
            SET notes = $2, estimated_completion_time = $3, updated_at = $4
            WHERE service_id = $1 AND status <> 'completed'
            "#,
        )
        .bind(id)
        .bind(&changes.notes)
        .bind(changes.estimated_completion_time)
        .bind(Utc::now())
        .execute(self.table.pool())
        .await
        .map_err(db_error("updating pending service"))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.table.by_id(id).await
    }

    async fn transition_pending_service(
        &self,
        id: i64,
        from: ServiceStatus,
        to: ServiceStatus,
        employee_id: Option<i64>,
    ) -> AppResult<Option<PendingService>> {
        let updated = sqlx::query(
            r#"
            UPDATE pending_services
            SET status = $3, employee_id = COALESCE($4, employee_id), updated_at = $5
            WHERE service_id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(employee_id)
        .bind(Utc::now())
        .execute(self.table.pool())
        .await
        .map_err(db_error("changing pending service status"))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.reload(id).await.map(Some)
    }

    async fn complete_pending_service(
        &self,
        id: i64,
        from: ServiceStatus,
        completed_at: DateTime<Utc>,
        link: &NewRatingLink,
    ) -> AppResult<Option<(PendingService, RatingLink)>> {
        let mut tx = self
            .table
            .pool()
            .begin()
            .await
            .map_err(db_error("starting completion"))?;

        let vehicle: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE pending_services
            SET status = 'completed', completed_at = $3, updated_at = $3
            WHERE service_id = $1 AND status = $2
            RETURNING vehicle_id
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(completed_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("completing pending service"))?;

        let Some((vehicle_id,)) = vehicle else {
            return Ok(None);
        };

        sqlx::query("UPDATE vehicles SET last_service_date = $2, updated_at = $3 WHERE vehicle_id = $1")
            .bind(vehicle_id)
            .bind(completed_at.date_naive())
            .bind(completed_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error("stamping last service date"))?;

        let rating_link = sqlx::query_as::<_, RatingLink>(
            r#"
            INSERT INTO service_rating_links (token, service_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&link.token)
        .bind(id)
        .bind(link.created_at)
        .bind(link.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("issuing rating link"))?;

        let service = fetch_view::<PendingService>(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("pending service {} vanished", id)))?;

        tx.commit().await.map_err(db_error("committing completion"))?;
        Ok(Some((service, rating_link)))
    }

    async fn delete_pending_service(&self, id: i64) -> AppResult<bool> {
        self.table.delete(id).await
    }

    async fn list_completed_visits(&self, range: &ReportRange) -> AppResult<Vec<CompletedVisit>> {
        sqlx::query_as::<_, CompletedVisit>(
            r#"
            SELECT t.service_id, s.name AS service_type_name, s.base_price,
                   v.license_plate, t.entry_time, t.completed_at
            FROM pending_services t
            JOIN services s ON s.service_id = t.service_type_id
            JOIN vehicles v ON v.vehicle_id = t.vehicle_id
            WHERE t.status = 'completed'
              AND t.completed_at IS NOT NULL
              AND ($1::date IS NULL OR (t.completed_at AT TIME ZONE 'UTC')::date >= $1)
              AND ($2::date IS NULL OR (t.completed_at AT TIME ZONE 'UTC')::date <= $2)
            ORDER BY t.completed_at
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_all(self.table.pool())
        .await
        .map_err(db_error("listing completed visits"))
    }
}
