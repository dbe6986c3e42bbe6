use serde::Serialize;
use sqlx::FromRow;

/// Banner row; `id` is the object key below `banner/`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Banner {
    pub id: String,
    pub name: String,
}

impl Banner {
    pub fn object_key(&self) -> String {
        Self::key_for(&self.id)
    }

    pub fn key_for(id: &str) -> String {
        format!("banner/{}", id)
    }
}
