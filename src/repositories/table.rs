//! Repositorio genérico sobre PostgreSQL
//!
//! `PgTable<R>` resuelve las consultas comunes (listar, buscar por id,
//! filtrar por columna, búsqueda ILIKE, borrar) para cualquier registro que
//! declare su tabla, su clave y su vista base. Los repositorios de cada
//! recurso añaden sus sentencias específicas encima.

use std::marker::PhantomData;

use sqlx::postgres::PgRow;
use sqlx::{Encode, FromRow, PgConnection, PgPool, Postgres, Type};

use crate::utils::errors::{db_error, AppResult};

/// Registro mapeado a una tabla.
///
/// La vista base siempre usa el alias `t` para la tabla principal, de modo
/// que `KEY` y `ORDER_BY` se pueden calificar con `t.`.
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    const TABLE: &'static str;
    const KEY: &'static str;
    const VIEW: &'static str;
    const ORDER_BY: &'static str;
    const SEARCH_COLUMNS: &'static [&'static str] = &[];
}

/// Patrón ILIKE que busca `term` como substring literal
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Lee un registro por id desde una conexión ya abierta (p. ej. dentro de una transacción)
pub async fn fetch_view<R: Record>(conn: &mut PgConnection, id: i64) -> AppResult<Option<R>> {
    let sql = format!("{} WHERE t.{} = $1", R::VIEW, R::KEY);
    sqlx::query_as::<_, R>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("fetching record"))
}

pub struct PgTable<R> {
    pool: PgPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PgTable<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> PgTable<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn all(&self) -> AppResult<Vec<R>> {
        let sql = format!("{} ORDER BY {}", R::VIEW, R::ORDER_BY);
        sqlx::query_as::<_, R>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing records"))
    }

    pub async fn by_id(&self, id: i64) -> AppResult<Option<R>> {
        let sql = format!("{} WHERE t.{} = $1", R::VIEW, R::KEY);
        sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding record"))
    }

    /// Registros cuya `column` (calificada) es igual a `value`
    pub async fn filter_by<T>(&self, column: &str, value: T) -> AppResult<Vec<R>>
    where
        T: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + 'static,
    {
        let sql = format!("{} WHERE {} = $1 ORDER BY {}", R::VIEW, column, R::ORDER_BY);
        sqlx::query_as::<_, R>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("filtering records"))
    }

    /// Búsqueda case-insensitive sobre `SEARCH_COLUMNS`
    pub async fn search(&self, term: &str) -> AppResult<Vec<R>> {
        if R::SEARCH_COLUMNS.is_empty() {
            return self.all().await;
        }
        let conditions = R::SEARCH_COLUMNS
            .iter()
            .map(|column| format!("{} ILIKE $1", column))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!("{} WHERE {} ORDER BY {}", R::VIEW, conditions, R::ORDER_BY);
        sqlx::query_as::<_, R>(&sql)
            .bind(like_pattern(term))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("searching records"))
    }

    pub async fn exists(&self, id: i64) -> AppResult<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1)", R::TABLE, R::KEY);
        let (exists,): (bool,) = sqlx::query_as(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("checking record"))?;
        Ok(exists)
    }

    /// Borra por id; `false` si no existía
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE {} = $1", R::TABLE, R::KEY);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting record"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" abc "), "%abc%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
