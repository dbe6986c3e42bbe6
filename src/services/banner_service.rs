use sqlx::MySqlPool;

use crate::database::models::Banner;
use crate::database::query_builder::{QueryBuilder, SortDirection};
use crate::database::{DatabaseError, Repository};

pub const MAX_BANNERS: usize = 5;

/// Object key for an uploaded banner file: `<uuid>_<original name>`
pub fn banner_key(unique: &str, file_name: &str) -> String {
    format!("{}_{}", unique, file_name)
}

pub fn exceeds_limit(existing: usize, incoming: usize) -> bool {
    existing + incoming > MAX_BANNERS
}

pub struct BannerService {
    pool: MySqlPool,
}

impl BannerService {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Banners in upload order
    pub async fn list(&self) -> Result<Vec<Banner>, DatabaseError> {
        QueryBuilder::new("banner")?
            .select(&["id", "name"])
            .order_by("created_at", SortDirection::Asc)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count(&self) -> Result<usize, DatabaseError> {
        let count = Repository::<Banner>::new("banner", &self.pool).count(vec![]).await?;
        Ok(count.max(0) as usize)
    }

    pub async fn insert(&self, key: &str, name: &str) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO banner (id, name) VALUES (?, ?)")
            .bind(key)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM banner WHERE id = ?").bind(key).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
