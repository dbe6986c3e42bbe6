use serde::Serialize;
use sqlx::FromRow;

/// `{id, name}` row of the lookup tables (job_category, platform, technology, class)
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Lookup {
    pub id: i32,
    pub name: String,
}
