use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::employee::{Employee, EmployeeDraft, EmployeeFilters};
use crate::repositories::table::{like_pattern, PgTable, Record};
use crate::repositories::EmployeeStore;
use crate::utils::errors::{db_error, AppResult};

impl Record for Employee {
    const TABLE: &'static str = "employees";
    const KEY: &'static str = "employee_id";
    const VIEW: &'static str = "SELECT t.* FROM employees t";
    const ORDER_BY: &'static str = "t.name";
    const SEARCH_COLUMNS: &'static [&'static str] = &["t.name", "t.position", "t.email", "t.phone"];
}

pub struct EmployeeRepository {
    table: PgTable<Employee>,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            table: PgTable::new(pool),
        }
    }
}

#[async_trait]
impl EmployeeStore for EmployeeRepository {
    async fn list_employees(&self, filters: &EmployeeFilters) -> AppResult<Vec<Employee>> {
        let term = filters
            .q
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(like_pattern);

        let sql = format!(
            r#"{}
            WHERE ($1::employee_status IS NULL OR t.status = $1)
              AND ($2::text IS NULL OR t.name ILIKE $2 OR t.position ILIKE $2
                   OR t.email ILIKE $2 OR t.phone ILIKE $2)
            ORDER BY {}"#,
            Employee::VIEW,
            Employee::ORDER_BY
        );
        sqlx::query_as::<_, Employee>(&sql)
            .bind(filters.status)
            .bind(term)
            .fetch_all(self.table.pool())
            .await
            .map_err(db_error("listing employees"))
    }

    async fn find_employee(&self, id: i64) -> AppResult<Option<Employee>> {
        self.table.by_id(id).await
    }

    async fn insert_employee(&self, draft: &EmployeeDraft) -> AppResult<Employee> {
        sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (name, position, email, phone, hire_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.position)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(draft.hire_date)
        .bind(draft.status)
        .fetch_one(self.table.pool())
        .await
        .map_err(db_error("creating employee"))
    }

    async fn update_employee(&self, id: i64, draft: &EmployeeDraft) -> AppResult<Option<Employee>> {
        sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees
            SET name = $2, position = $3, email = $4, phone = $5, hire_date = $6,
                status = $7, updated_at = $8
            WHERE employee_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.position)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(draft.hire_date)
        .bind(draft.status)
        .bind(Utc::now())
        .fetch_optional(self.table.pool())
        .await
        .map_err(db_error("updating employee"))
    }

    async fn delete_employee(&self, id: i64) -> AppResult<bool> {
        self.table.delete(id).await
    }
}

