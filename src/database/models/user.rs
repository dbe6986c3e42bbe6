use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub nickname: String,
    pub name: Option<String>,
    pub birthday: Option<String>,
    pub uni_id: Option<String>,
    pub is_student: bool,
    pub is_admin: bool,
}

/// Row of the management student search
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: String,
    pub uni_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminSummary {
    pub id: String,
    pub nickname: String,
}
