use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{types::Json, MySqlPool};

use crate::database::models::{JobPostingDetailRow, JobPostingListRow, PostingOwner};
use crate::database::query_builder::{Condition, QueryBuilder};
use crate::database::DatabaseError;

/// Posting body shared by create and update
#[derive(Debug, Clone)]
pub struct PostingInput {
    pub company_name: String,
    pub title: String,
    pub content: String,
    pub address: Value,
    pub deadline: NaiveDate,
    pub position_id: i64,
}

/// Open postings, optionally narrowed to categories and region names
pub fn list_query(positions: &[i64], regions: &[&str], today: NaiveDate) -> Result<QueryBuilder, DatabaseError> {
    let position_filter = (!positions.is_empty())
        .then(|| Condition::In("jp.field".into(), positions.iter().map(|id| Value::from(*id)).collect()));

    let region_filter = (!regions.is_empty()).then(|| {
        Condition::Any(
            regions
                .iter()
                .map(|name| {
                    Condition::raw(
                        "JSON_UNQUOTE(JSON_EXTRACT(`jp`.`address_information`, '$.address')) LIKE CONCAT(?, '%')",
                        vec![Value::from(*name)],
                    )
                })
                .collect(),
        )
    });

    Ok(QueryBuilder::new("job_posting")?
        .alias("jp")
        .select(&[
            "jp.id AS id",
            "jp.company_name AS company_name",
            "jp.title AS title",
            "jp.image AS image",
            "jp.address_information AS address_information",
            "jc.name AS position",
            "jp.view_count AS view_count",
        ])
        .join("INNER JOIN `job_category` AS `jc` ON `jc`.`id` = `jp`.`field`")
        .filter(Condition::Gte("jp.deadline".into(), Value::from(today.format("%Y-%m-%d").to_string())))
        .filter(Condition::eq("jp.is_deleted", false))
        .filter_opt(position_filter)
        .filter_opt(region_filter)
        .order_random())
}

pub struct EmploymentService {
    pool: MySqlPool,
}

impl EmploymentService {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn detail(&self, id: &str) -> Result<Option<JobPostingDetailRow>, DatabaseError> {
        let row = sqlx::query_as::<_, JobPostingDetailRow>(
            "SELECT jp.id, jp.user_id, jp.company_name, jp.title, jp.content, jp.deadline, jp.image, \
             jp.field AS position_id, jc.name AS position_name, jp.applicant, jp.address_information \
             FROM job_posting jp INNER JOIN job_category jc ON jc.id = jp.field \
             WHERE jp.id = ? AND jp.is_deleted = 0",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(&self, positions: &[i64], regions: &[&str], today: NaiveDate) -> Result<Vec<JobPostingListRow>, DatabaseError> {
        list_query(positions, regions, today)?.fetch_all(&self.pool).await
    }

    pub async fn owner(&self, id: &str) -> Result<Option<PostingOwner>, DatabaseError> {
        let row = sqlx::query_as::<_, PostingOwner>(
            "SELECT user_id, image, applicant, is_deleted FROM job_posting WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, id: &str, author: &str, input: &PostingInput, image: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO job_posting (id, user_id, company_name, title, content, deadline, image, field, address_information) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(author)
        .bind(&input.company_name)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.deadline)
        .bind(image)
        .bind(input.position_id)
        .bind(Json(&input.address))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update(&self, id: &str, input: &PostingInput, image: Option<&str>) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE job_posting SET company_name = ?, title = ?, content = ?, deadline = ?, field = ?, \
             address_information = ?, image = COALESCE(?, image) WHERE id = ?",
        )
        .bind(&input.company_name)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.deadline)
        .bind(input.position_id)
        .bind(Json(&input.address))
        .bind(image)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete(&self, id: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE job_posting SET is_deleted = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append `email` to the applicants unless already present.
    /// Returns whether this call added it.
    pub async fn apply(&self, id: &str, email: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE job_posting SET applicant = JSON_ARRAY_APPEND(COALESCE(applicant, JSON_ARRAY()), '$', ?) \
             WHERE id = ? AND (applicant IS NULL OR NOT JSON_CONTAINS(applicant, JSON_QUOTE(?)))",
        )
        .bind(email)
        .bind(id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove `email` from the applicants; an emptied list is stored as NULL
    pub async fn withdraw(&self, id: &str, email: &str) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let current: Option<Option<Json<Vec<String>>>> =
            sqlx::query_scalar("SELECT applicant FROM job_posting WHERE id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(current) = current else {
            return Err(DatabaseError::NotFound("job posting not found".into()));
        };

        let remaining = remove_applicant(current.map(|json| json.0).unwrap_or_default(), email);
        sqlx::query("UPDATE job_posting SET applicant = ? WHERE id = ?")
            .bind(remaining.as_ref().map(Json))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Applicants without `email`; `None` when nobody is left
pub fn remove_applicant(applicants: Vec<String>, email: &str) -> Option<Vec<String>> {
    let remaining: Vec<String> = applicants.into_iter().filter(|a| a != email).collect();
    (!remaining.is_empty()).then_some(remaining)
}
