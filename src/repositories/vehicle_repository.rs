use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::vehicle::{Vehicle, VehicleDraft};
use crate::repositories::table::{PgTable, Record};
use crate::repositories::VehicleStore;
use crate::utils::errors::{db_error, AppError, AppResult};

impl Record for Vehicle {
    const TABLE: &'static str = "vehicles";
    const KEY: &'static str = "vehicle_id";
    const VIEW: &'static str = r#"
        SELECT t.*, c.name AS customer_name
        FROM vehicles t
        JOIN customers c ON c.customer_id = t.customer_id
    "#;
    const ORDER_BY: &'static str = "t.make, t.model";
    const SEARCH_COLUMNS: &'static [&'static str] =
        &["t.make", "t.model", "t.license_plate", "t.vin", "c.name"];
}

pub struct VehicleRepository {
    table: PgTable<Vehicle>,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            table: PgTable::new(pool),
        }
    }
}

#[async_trait]
impl VehicleStore for VehicleRepository {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        self.table.all().await
    }

    async fn search_vehicles(&self, term: &str) -> AppResult<Vec<Vehicle>> {
        self.table.search(term).await
    }

    async fn list_vehicles_by_customer(&self, customer_id: i64) -> AppResult<Vec<Vehicle>> {
        self.table.filter_by("t.customer_id", customer_id).await
    }

    async fn find_vehicle(&self, id: i64) -> AppResult<Option<Vehicle>> {
        self.table.by_id(id).await
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>> {
        let sql = format!("{} WHERE t.license_plate = $1", Vehicle::VIEW);
        sqlx::query_as::<_, Vehicle>(&sql)
            .bind(plate)
            .fetch_optional(self.table.pool())
            .await
            .map_err(db_error("finding vehicle by plate"))
    }

    async fn insert_vehicle(&self, draft: &VehicleDraft) -> AppResult<Vehicle> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO vehicles (customer_id, make, model, year, license_plate, vin, color, last_service_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING vehicle_id
            "#,
        )
        .bind(draft.customer_id)
        .bind(&draft.make)
        .bind(&draft.model)
        .bind(draft.year)
        .bind(&draft.license_plate)
        .bind(&draft.vin)
        .bind(&draft.color)
        .bind(draft.last_service_date)
        .fetch_one(self.table.pool())
        .await
        .map_err(db_error("creating vehicle"))?;

        self.table
            .by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("vehicle {} vanished after insert", id)))
    }

    async fn update_vehicle(&self, id: i64, draft: &VehicleDraft) -> AppResult<Option<Vehicle>> {
        let updated = sqlx::query(
            r#"
            UPDATE vehicles
            SET customer_id = $2, make = $3, model = $4, year = $5, license_plate = $6,
                vin = $7, color = $8, last_service_date = $9, updated_at = $10
            WHERE vehicle_id = $1
            "#,
        )
        .bind(id)
        .bind(draft.customer_id)
        .bind(&draft.make)
        .bind(&draft.model)
        .bind(draft.year)
        .bind(&draft.license_plate)
        .bind(&draft.vin)
        .bind(&draft.color)
        .bind(draft.last_service_date)
        .bind(Utc::now())
        .execute(self.table.pool())
        .await
        .map_err(db_error("updating vehicle"))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.table.by_id(id).await
    }

    async fn delete_vehicle(&self, id: i64) -> AppResult<bool> {
        self.table.delete(id).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "Vehicle {} has visits or work orders on record",
                id
            )),
            other => other,
        })
    }
}
