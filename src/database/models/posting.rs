use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{types::Json, FromRow};

#[derive(Debug, Clone, FromRow)]
pub struct JobPostingDetailRow {
    pub id: String,
    pub user_id: String,
    pub company_name: String,
    pub title: String,
    pub content: String,
    pub deadline: NaiveDate,
    pub image: String,
    pub position_id: i32,
    pub position_name: String,
    pub applicant: Option<Json<Vec<String>>>,
    pub address_information: Json<Value>,
}

#[derive(Debug, Clone, FromRow)]
pub struct JobPostingListRow {
    pub id: String,
    pub company_name: String,
    pub title: String,
    pub image: String,
    pub address_information: Json<Value>,
    pub position: String,
    pub view_count: i32,
}

/// Author, applicants and image of a posting; what the write paths need
#[derive(Debug, Clone, FromRow)]
pub struct PostingOwner {
    pub user_id: String,
    pub image: String,
    pub applicant: Option<Json<Vec<String>>>,
    pub is_deleted: bool,
}

impl PostingOwner {
    pub fn applicants(&self) -> Vec<String> {
        self.applicant.as_ref().map(|json| json.0.clone()).unwrap_or_default()
    }
}
