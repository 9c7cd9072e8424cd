use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::work_order::{
    OrderPartDraft, OrderPartLine, OrderServiceDraft, OrderServiceLine, WorkOrder,
    WorkOrderDetail, WorkOrderDraft, WorkOrderFilters, WorkOrderStatus,
};
use crate::repositories::table::{fetch_view, PgTable, Record};
use crate::repositories::WorkOrderStore;
use crate::utils::errors::{db_error, not_found_error, AppError, AppResult};

impl Record for WorkOrder {
    const TABLE: &'static str = "work_orders";
    const KEY: &'static str = "order_id";
    const VIEW: &'static str = r#"
        SELECT t.*, v.make, v.model, v.license_plate, c.name AS customer_name
        FROM work_orders t
        JOIN vehicles v ON v.vehicle_id = t.vehicle_id
        JOIN customers c ON c.customer_id = v.customer_id
    "#;
    const ORDER_BY: &'static str = "t.created_at DESC, t.order_id DESC";
}

impl Record for OrderServiceLine {
    const TABLE: &'static str = "order_services";
    const KEY: &'static str = "order_service_id";
    const VIEW: &'static str = r#"
        SELECT t.*, s.name
        FROM order_services t
        JOIN services s ON s.service_id = t.service_id
    "#;
    const ORDER_BY: &'static str = "t.order_service_id";
}

impl Record for OrderPartLine {
    const TABLE: &'static str = "order_parts";
    const KEY: &'static str = "order_part_id";
    const VIEW: &'static str = r#"
        SELECT t.*, i.name
        FROM order_parts t
        JOIN inventory i ON i.item_id = t.item_id
    "#;
    const ORDER_BY: &'static str = "t.order_part_id";
}

pub struct WorkOrderRepository {
    orders: PgTable<WorkOrder>,
}

impl WorkOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            orders: PgTable::new(pool),
        }
    }

    async fn load_detail(&self, id: i64) -> AppResult<Option<WorkOrderDetail>> {
        let mut conn = self
            .orders
            .pool()
            .acquire()
            .await
            .map_err(db_error("acquiring connection"))?;
        load_detail(&mut conn, id).await
    }
}

async fn load_lines<R: Record>(conn: &mut PgConnection, order_id: i64) -> AppResult<Vec<R>> {
    let sql = format!("{} WHERE t.order_id = $1 ORDER BY {}", R::VIEW, R::ORDER_BY);
    sqlx::query_as::<_, R>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("loading order lines"))
}

async fn load_detail(conn: &mut PgConnection, id: i64) -> AppResult<Option<WorkOrderDetail>> {
    let Some(order) = fetch_view::<WorkOrder>(&mut *conn, id).await? else {
        return Ok(None);
    };
    let services = load_lines::<OrderServiceLine>(&mut *conn, id).await?;
    let parts = load_lines::<OrderPartLine>(&mut *conn, id).await?;
    Ok(Some(WorkOrderDetail {
        order,
        services,
        parts,
    }))
}

/// Bloquea la orden para el resto de la transacción y exige que admita cambios
async fn lock_open_order(conn: &mut PgConnection, order_id: i64) -> AppResult<()> {
    let status: Option<(WorkOrderStatus,)> =
        sqlx::query_as("SELECT status FROM work_orders WHERE order_id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_error("locking work order"))?;

    match status {
        None => Err(not_found_error("Work order", order_id)),
        Some((status,)) if status.is_terminal() => Err(AppError::Conflict(format!(
            "Work order {} is {} and can no longer change",
            order_id, status
        ))),
        Some(_) => Ok(()),
    }
}

async fn recompute_total(conn: &mut PgConnection, order_id: i64) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE work_orders
        SET total_cost =
                COALESCE((SELECT SUM(price) FROM order_services WHERE order_id = $1), 0)
              + COALESCE((SELECT SUM(quantity * price_per_unit) FROM order_parts WHERE order_id = $1), 0),
            updated_at = $2
        WHERE order_id = $1
        "#,
    )
    .bind(order_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(db_error("recomputing work order total"))?;
    Ok(())
}

async fn move_stock(conn: &mut PgConnection, item_id: i64, delta: Decimal) -> AppResult<()> {
    let moved = sqlx::query(
        r#"
        UPDATE inventory
        SET quantity = quantity + $2, updated_at = $3
        WHERE item_id = $1 AND quantity + $2 >= 0
        "#,
    )
    .bind(item_id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(db_error("moving stock"))?;

    if moved.rows_affected() == 0 {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM inventory WHERE item_id = $1)")
                .bind(item_id)
                .fetch_one(&mut *conn)
                .await
                .map_err(db_error("checking inventory item"))?;
        return Err(if exists {
            AppError::Conflict(format!("Inventory item {} does not have enough stock", item_id))
        } else {
            not_found_error("Inventory item", item_id)
        });
    }
    Ok(())
}

#[async_trait]
impl WorkOrderStore for WorkOrderRepository {
    async fn list_work_orders(&self, filters: &WorkOrderFilters) -> AppResult<Vec<WorkOrder>> {
        match filters.status {
            Some(status) => self.orders.filter_by("t.status", status).await,
            None => self.orders.all().await,
        }
    }

    async fn list_work_orders_by_vehicle(&self, vehicle_id: i64) -> AppResult<Vec<WorkOrder>> {
        self.orders.filter_by("t.vehicle_id", vehicle_id).await
    }

    async fn find_work_order(&self, id: i64) -> AppResult<Option<WorkOrderDetail>> {
        self.load_detail(id).await
    }

    async fn insert_work_order(&self, draft: &WorkOrderDraft) -> AppResult<WorkOrderDetail> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO work_orders (vehicle_id, status, start_date, completion_date, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING order_id
            "#,
        )
        .bind(draft.vehicle_id)
        .bind(draft.status)
        .bind(draft.start_date)
        .bind(draft.completion_date)
        .bind(&draft.notes)
        .fetch_one(self.orders.pool())
        .await
        .map_err(db_error("creating work order"))?;

        self.load_detail(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("work order {} vanished after insert", id)))
    }

    async fn update_work_order(
        &self,
        id: i64,
        expected: WorkOrderStatus,
        draft: &WorkOrderDraft,
    ) -> AppResult<Option<WorkOrderDetail>> {
        let updated = sqlx::query(
            r#"
            UPDATE work_orders
            SET vehicle_id = $2, status = $3, start_date = $4, completion_date = $5,
                notes = $6, updated_at = $7
            WHERE order_id = $1 AND status = $8
            "#,
        )
        .bind(id)
        .bind(draft.vehicle_id)
        .bind(draft.status)
        .bind(draft.start_date)
        .bind(draft.completion_date)
        .bind(&draft.notes)
        .bind(Utc::now())
        .bind(expected)
        .execute(self.orders.pool())
        .await
        .map_err(db_error("updating work order"))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.load_detail(id).await
    }

    async fn delete_work_order(&self, id: i64) -> AppResult<bool> {
        let mut tx = self
            .orders
            .pool()
            .begin()
            .await
            .map_err(db_error("starting work order deletion"))?;

        let locked: Option<(i64,)> =
            sqlx::query_as("SELECT order_id FROM work_orders WHERE order_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("locking work order"))?;
        if locked.is_none() {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE inventory i
            SET quantity = i.quantity + p.total, updated_at = $2
            FROM (
                SELECT item_id, SUM(quantity) AS total
                FROM order_parts
                WHERE order_id = $1
                GROUP BY item_id
            ) p
            WHERE i.item_id = p.item_id
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(db_error("returning parts to stock"))?;

        sqlx::query("DELETE FROM work_orders WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("deleting work order"))?;

        tx.commit().await.map_err(db_error("committing work order deletion"))?;
        Ok(true)
    }

    async fn add_service_line(&self, order_id: i64, draft: &OrderServiceDraft) -> AppResult<WorkOrderDetail> {
        let mut tx = self
            .orders
            .pool()
            .begin()
            .await
            .map_err(db_error("starting service line"))?;
        lock_open_order(&mut tx, order_id).await?;

        sqlx::query("INSERT INTO order_services (order_id, service_id, price, notes) VALUES ($1, $2, $3, $4)")
            .bind(order_id)
            .bind(draft.service_id)
            .bind(draft.price)
            .bind(&draft.notes)
            .execute(&mut *tx)
            .await
            .map_err(db_error("adding service line"))?;

        recompute_total(&mut tx, order_id).await?;
        let detail = load_detail(&mut tx, order_id)
            .await?
            .ok_or_else(|| not_found_error("Work order", order_id))?;
        tx.commit().await.map_err(db_error("committing service line"))?;
        Ok(detail)
    }

    async fn remove_service_line(&self, order_id: i64, line_id: i64) -> AppResult<WorkOrderDetail> {
        let mut tx = self
            .orders
            .pool()
            .begin()
            .await
            .map_err(db_error("starting service line removal"))?;
        lock_open_order(&mut tx, order_id).await?;

        let removed = sqlx::query("DELETE FROM order_services WHERE order_service_id = $2 AND order_id = $1")
            .bind(order_id)
            .bind(line_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("removing service line"))?;
        if removed.rows_affected() == 0 {
            return Err(not_found_error("Order service line", line_id));
        }

        recompute_total(&mut tx, order_id).await?;
        let detail = load_detail(&mut tx, order_id)
            .await?
            .ok_or_else(|| not_found_error("Work order", order_id))?;
        tx.commit().await.map_err(db_error("committing service line removal"))?;
        Ok(detail)
    }

    async fn add_part_line(&self, order_id: i64, draft: &OrderPartDraft) -> AppResult<WorkOrderDetail> {
        let mut tx = self
            .orders
            .pool()
            .begin()
            .await
            .map_err(db_error("starting part line"))?;
        lock_open_order(&mut tx, order_id).await?;
        move_stock(&mut tx, draft.item_id, -draft.quantity).await?;

        sqlx::query(
            "INSERT INTO order_parts (order_id, item_id, quantity, price_per_unit) VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id)
        .bind(draft.item_id)
        .bind(draft.quantity)
        .bind(draft.price_per_unit)
        .execute(&mut *tx)
        .await
        .map_err(db_error("adding part line"))?;

        recompute_total(&mut tx, order_id).await?;
        let detail = load_detail(&mut tx, order_id)
            .await?
            .ok_or_else(|| not_found_error("Work order", order_id))?;
        tx.commit().await.map_err(db_error("committing part line"))?;
        Ok(detail)
    }

    async fn remove_part_line(&self, order_id: i64, line_id: i64) -> AppResult<WorkOrderDetail> {
        let mut tx = self
            .orders
            .pool()
            .begin()
            .await
            .map_err(db_error("starting part line removal"))?;
        lock_open_order(&mut tx, order_id).await?;

        let removed: Option<(i64, Decimal)> = sqlx::query_as(
            "DELETE FROM order_parts WHERE order_part_id = $2 AND order_id = $1 RETURNING item_id, quantity",
        )
        .bind(order_id)
        .bind(line_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("removing part line"))?;

        let Some((item_id, quantity)) = removed else {
            return Err(not_found_error("Order part line", line_id));
        };
        move_stock(&mut tx, item_id, quantity).await?;

        recompute_total(&mut tx, order_id).await?;
        let detail = load_detail(&mut tx, order_id)
            .await?
            .ok_or_else(|| not_found_error("Work order", order_id))?;
        tx.commit().await.map_err(db_error("committing part line removal"))?;
        Ok(detail)
    }
}
