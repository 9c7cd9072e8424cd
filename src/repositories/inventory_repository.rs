use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::inventory::{InventoryItem, InventoryItemDraft, InventoryUsage, UsageDraft};
use crate::repositories::table::{fetch_view, PgTable, Record};
use crate::repositories::InventoryStore;
use crate::utils::errors::{db_error, not_found_error, AppError, AppResult};

impl Record for InventoryItem {
    const TABLE: &'static str = "inventory";
    const KEY: &'static str = "item_id";
    const VIEW: &'static str = "SELECT t.* FROM inventory t";
    const ORDER_BY: &'static str = "t.name";
    const SEARCH_COLUMNS: &'static [&'static str] = &["t.name", "t.description", "t.category"];
}

impl Record for InventoryUsage {
    const TABLE: &'static str = "inventory_usage";
    const KEY: &'static str = "usage_id";
    const VIEW: &'static str = r#"
        SELECT t.*, i.name AS item_name, e.name AS employee_name, s.name AS service_name
        FROM inventory_usage t
        JOIN inventory i ON i.item_id = t.item_id
        LEFT JOIN employees e ON e.employee_id = t.employee_id
        LEFT JOIN pending_services ps ON ps.service_id = t.service_id
        LEFT JOIN services s ON s.service_id = ps.service_type_id
    "#;
    const ORDER_BY: &'static str = "t.usage_date DESC, t.usage_id DESC";
}

pub struct InventoryRepository {
    items: PgTable<InventoryItem>,
    usage: PgTable<InventoryUsage>,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            items: PgTable::new(pool.clone()),
            usage: PgTable::new(pool),
        }
    }
}

fn insufficient_stock(item_id: i64) -> AppError {
    AppError::Conflict(format!(
        "Inventory item {} does not have enough stock for this operation",
        item_id
    ))
}

#[async_trait]
impl InventoryStore for InventoryRepository {
    async fn list_items(&self) -> AppResult<Vec<InventoryItem>> {
        self.items.all().await
    }

    async fn search_items(&self, term: &str) -> AppResult<Vec<InventoryItem>> {
        self.items.search(term).await
    }

    async fn list_items_by_category(&self, category: &str) -> AppResult<Vec<InventoryItem>> {
        self.items.filter_by("t.category", category.to_string()).await
    }

    async fn list_item_categories(&self) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT category FROM inventory ORDER BY category")
                .fetch_all(self.items.pool())
                .await
                .map_err(db_error("listing inventory categories"))?;
        Ok(rows.into_iter().map(|(category,)| category).collect())
    }

    async fn list_low_stock(&self) -> AppResult<Vec<InventoryItem>> {
        let sql = format!(
            "{} WHERE t.quantity <= t.reorder_level ORDER BY t.quantity ASC, t.name",
            InventoryItem::VIEW
        );
        sqlx::query_as::<_, InventoryItem>(&sql)
            .fetch_all(self.items.pool())
            .await
            .map_err(db_error("listing low stock items"))
    }

    async fn find_item(&self, id: i64) -> AppResult<Option<InventoryItem>> {
        self.items.by_id(id).await
    }

    async fn insert_item(&self, draft: &InventoryItemDraft) -> AppResult<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory
                (name, description, category, quantity, unit, cost_price, selling_price, reorder_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(draft.quantity)
        .bind(&draft.unit)
        .bind(draft.cost_price)
        .bind(draft.selling_price)
        .bind(draft.reorder_level)
        .fetch_one(self.items.pool())
        .await
        .map_err(db_error("creating inventory item"))
    }

    async fn update_item(&self, id: i64, draft: &InventoryItemDraft) -> AppResult<Option<InventoryItem>> {
        sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory
            SET name = $2, description = $3, category = $4, unit = $5,
                cost_price = $6, selling_price = $7, reorder_level = $8, updated_at = $9
            WHERE item_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(&draft.unit)
        .bind(draft.cost_price)
        .bind(draft.selling_price)
        .bind(draft.reorder_level)
        .bind(Utc::now())
        .fetch_optional(self.items.pool())
        .await
        .map_err(db_error("updating inventory item"))
    }

    async fn delete_item(&self, id: i64) -> AppResult<bool> {
        self.items.delete(id).await.map_err(|e| match e {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Inventory item {} is used by work orders", id))
            }
            other => other,
        })
    }

    async fn adjust_quantity(&self, id: i64, delta: Decimal) -> AppResult<InventoryItem> {
        let adjusted = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory
            SET quantity = quantity + $2, updated_at = $3
            WHERE item_id = $1 AND quantity + $2 >= 0
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(self.items.pool())
        .await
        .map_err(db_error("adjusting inventory quantity"))?;

        match adjusted {
            Some(item) => Ok(item),
            None if self.items.exists(id).await? => Err(insufficient_stock(id)),
            None => Err(not_found_error("Inventory item", id)),
        }
    }

    async fn record_usage(&self, draft: &UsageDraft) -> AppResult<InventoryUsage> {
        let mut tx = self
            .usage
            .pool()
            .begin()
            .await
            .map_err(db_error("starting usage"))?;

        let debited: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE inventory
            SET quantity = quantity - $2, updated_at = $3
            WHERE item_id = $1 AND quantity >= $2
            RETURNING item_id
            "#,
        )
        .bind(draft.item_id)
        .bind(draft.quantity)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("debiting inventory"))?;

        if debited.is_none() {
            let (exists,): (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM inventory WHERE item_id = $1)")
                    .bind(draft.item_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(db_error("checking inventory item"))?;
            return Err(if exists {
                insufficient_stock(draft.item_id)
            } else {
                not_found_error("Inventory item", draft.item_id)
            });
        }

        let (usage_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO inventory_usage (item_id, service_id, employee_id, quantity, usage_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING usage_id
            "#,
        )
        .bind(draft.item_id)
        .bind(draft.service_id)
        .bind(draft.employee_id)
        .bind(draft.quantity)
        .bind(draft.usage_date)
        .bind(&draft.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("recording usage"))?;

        let usage = fetch_view::<InventoryUsage>(&mut *tx, usage_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("usage {} vanished", usage_id)))?;

        tx.commit().await.map_err(db_error("committing usage"))?;
        Ok(usage)
    }

    async fn list_usage_for_item(&self, item_id: i64) -> AppResult<Vec<InventoryUsage>> {
        self.usage.filter_by("t.item_id", item_id).await
    }

    async fn list_usage(&self, limit: i64) -> AppResult<Vec<InventoryUsage>> {
        let sql = format!(
            "{} ORDER BY {} LIMIT $1",
            InventoryUsage::VIEW,
            InventoryUsage::ORDER_BY
        );
        sqlx::query_as::<_, InventoryUsage>(&sql)
            .bind(limit)
            .fetch_all(self.usage.pool())
            .await
            .map_err(db_error("listing inventory usage"))
    }
}
