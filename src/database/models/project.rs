use serde_json::Value;
use sqlx::{types::Json, FromRow};

#[derive(Debug, Clone, FromRow)]
pub struct SeniorProjectRow {
    pub id: String,
    pub year: String,
    pub class_id: i32,
    pub group_name: String,
    pub project_design: Option<String>,
    pub link: Json<Vec<Value>>,
    pub platform: Json<Vec<i64>>,
    pub technology: Json<Vec<i64>>,
    pub view_count: i32,
}

/// `id` is the owning project; `uni_id` is the member's key
#[derive(Debug, Clone, FromRow)]
pub struct TeamMemberRow {
    pub id: String,
    pub uni_id: String,
    pub name: String,
    pub introduction: String,
    pub profile_image: Option<String>,
}
