use serde::Serialize;
use serde_json::Value;
use sqlx::{mysql::MySqlRow, FromRow, MySqlPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::{Condition, QueryBuilder, SortDirection};

/// Typed access to one table through the query builder
pub struct Repository<'a, T> {
    table_name: &'static str,
    pool: &'a MySqlPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<'a, T> Repository<'a, T>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: &'static str, pool: &'a MySqlPool) -> Self {
        Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    fn builder(&self) -> Result<QueryBuilder, DatabaseError> {
        QueryBuilder::new(self.table_name)
    }

    /// Every row ordered by id
    pub async fn select_all(&self) -> Result<Vec<T>, DatabaseError> {
        self.builder()?.order_by("id", SortDirection::Asc).fetch_all(self.pool).await
    }

    pub async fn select_any(&self, conditions: Vec<Condition>) -> Result<Vec<T>, DatabaseError> {
        conditions
            .into_iter()
            .fold(self.builder()?, QueryBuilder::filter)
            .fetch_all(self.pool)
            .await
    }

    /// Rows whose id is in `ids`, ordered by id
    pub async fn select_ids(&self, ids: &[i64]) -> Result<Vec<T>, DatabaseError> {
        self.builder()?
            .filter(Condition::In("id".into(), ids.iter().map(|id| Value::from(*id)).collect()))
            .order_by("id", SortDirection::Asc)
            .fetch_all(self.pool)
            .await
    }

    pub async fn select_one(&self, conditions: Vec<Condition>) -> Result<Option<T>, DatabaseError> {
        conditions
            .into_iter()
            .fold(self.builder()?, QueryBuilder::filter)
            .limit(1)
            .fetch_optional(self.pool)
            .await
    }

    pub async fn count(&self, conditions: Vec<Condition>) -> Result<i64, DatabaseError> {
        conditions
            .into_iter()
            .fold(self.builder()?, QueryBuilder::filter)
            .count(self.pool)
            .await
    }
}
