use serde_json::Value;
use sqlx::{types::Json, FromRow};

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: String,
    pub nickname: String,
    pub is_open: bool,
    pub image: Option<String>,
    pub positions: Option<Json<Vec<i64>>>,
    pub technologies: Option<Json<Vec<i64>>>,
    pub introduction: Option<String>,
    pub awards: Option<Json<Vec<Value>>>,
    pub links: Option<Json<Vec<Value>>>,
}
