use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::service_offer::{ServiceCategory, ServiceOffer, ServiceOfferDraft};
use crate::repositories::table::{PgTable, Record};
use crate::repositories::CatalogStore;
use crate::utils::errors::{db_error, AppError, AppResult};

impl Record for ServiceOffer {
    const TABLE: &'static str = "services";
    const KEY: &'static str = "service_id";
    const VIEW: &'static str = r#"
        SELECT t.*, sc.name AS category_name
        FROM services t
        LEFT JOIN service_categories sc ON sc.category_id = t.category_id
    "#;
    const ORDER_BY: &'static str = "t.name";
}

impl Record for ServiceCategory {
    const TABLE: &'static str = "service_categories";
    const KEY: &'static str = "category_id";
    const VIEW: &'static str = "SELECT t.* FROM service_categories t";
    const ORDER_BY: &'static str = "t.name";
}

/// Catálogo de servicios y sus categorías
pub struct ServiceOfferRepository {
    offers: PgTable<ServiceOffer>,
    categories: PgTable<ServiceCategory>,
}

impl ServiceOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            offers: PgTable::new(pool.clone()),
            categories: PgTable::new(pool),
        }
    }
}

#[async_trait]
impl CatalogStore for ServiceOfferRepository {
    async fn list_offers(&self) -> AppResult<Vec<ServiceOffer>> {
        self.offers.all().await
    }

    async fn list_offers_by_category(&self, category_id: i64) -> AppResult<Vec<ServiceOffer>> {
        self.offers.filter_by("t.category_id", category_id).await
    }

    async fn find_offer(&self, id: i64) -> AppResult<Option<ServiceOffer>> {
        self.offers.by_id(id).await
    }

    async fn insert_offer(&self, draft: &ServiceOfferDraft) -> AppResult<ServiceOffer> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO services (name, description, base_price, estimated_hours, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING service_id
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.base_price)
        .bind(draft.estimated_hours)
        .bind(draft.category_id)
        .fetch_one(self.offers.pool())
        .await
        .map_err(db_error("creating service"))?;

        self.offers
            .by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("service {} vanished after insert", id)))
    }

    async fn update_offer(&self, id: i64, draft: &ServiceOfferDraft) -> AppResult<Option<ServiceOffer>> {
        let updated = sqlx::query(
            r#"
            UPDATE services
            SET name = $2, description = $3, base_price = $4, estimated_hours = $5,
                category_id = $6, updated_at = $7
            WHERE service_id = $1
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.base_price)
        .bind(draft.estimated_hours)
        .bind(draft.category_id)
        .bind(Utc::now())
        .execute(self.offers.pool())
        .await
        .map_err(db_error("updating service"))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.offers.by_id(id).await
    }

    async fn delete_offer(&self, id: i64) -> AppResult<bool> {
        self.offers.delete(id).await.map_err(|e| match e {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Service {} is referenced by visits or orders", id))
            }
            other => other,
        })
    }

    async fn list_categories(&self) -> AppResult<Vec<ServiceCategory>> {
        self.categories.all().await
    }

    async fn find_category(&self, id: i64) -> AppResult<Option<ServiceCategory>> {
        self.categories.by_id(id).await
    }

    async fn insert_category(&self, name: &str, description: Option<&str>) -> AppResult<ServiceCategory> {
        sqlx::query_as::<_, ServiceCategory>(
            r#"
            INSERT INTO service_categories (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(self.categories.pool())
        .await
        .map_err(db_error("creating service category"))
    }
}
