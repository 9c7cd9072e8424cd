use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::customer::{Customer, CustomerDraft};
use crate::repositories::table::{PgTable, Record};
use crate::repositories::CustomerStore;
use crate::utils::errors::{db_error, AppError, AppResult};

impl Record for Customer {
    const TABLE: &'static str = "customers";
    const KEY: &'static str = "customer_id";
    const VIEW: &'static str = "SELECT t.* FROM customers t";
    const ORDER_BY: &'static str = "t.name";
    const SEARCH_COLUMNS: &'static [&'static str] = &["t.name", "t.email", "t.phone"];
}

pub struct CustomerRepository {
    table: PgTable<Customer>,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            table: PgTable::new(pool),
        }
    }
}

#[async_trait]
impl CustomerStore for CustomerRepository {
    async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        self.table.all().await
    }

    async fn search_customers(&self, term: &str) -> AppResult<Vec<Customer>> {
        self.table.search(term).await
    }

    async fn find_customer(&self, id: i64) -> AppResult<Option<Customer>> {
        self.table.by_id(id).await
    }

    async fn insert_customer(&self, draft: &CustomerDraft) -> AppResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, address)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.address)
        .fetch_one(self.table.pool())
        .await
        .map_err(db_error("creating customer"))?;

        Ok(customer)
    }

    async fn update_customer(&self, id: i64, draft: &CustomerDraft) -> AppResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, email = $3, phone = $4, address = $5, updated_at = $6
            WHERE customer_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(Utc::now())
        .fetch_optional(self.table.pool())
        .await
        .map_err(db_error("updating customer"))
    }

    async fn delete_customer(&self, id: i64) -> AppResult<bool> {
        self.table.delete(id).await.map_err(|e| match e {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Customer {} still owns vehicles", id))
            }
            other => other,
        })
    }
}
