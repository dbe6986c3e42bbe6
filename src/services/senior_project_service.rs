use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use sqlx::{types::Json, MySqlPool};

use crate::database::models::{Lookup, SeniorProjectRow, TeamMemberRow};
use crate::database::query_builder::{Condition, QueryBuilder};
use crate::database::{DatabaseError, Repository};

pub const RECOMMEND_LIMIT: i64 = 5;

/// Team member as submitted by the admin form
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uni_id: String,
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl MemberInput {
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.uni_id, &self.introduction].iter().all(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub year: String,
    pub class_id: i64,
    pub group_name: String,
    pub project_design: Option<String>,
    pub link: Vec<Value>,
    pub platform: Vec<i64>,
    pub technology: Vec<i64>,
}

/// Filters of the showcase list; `year` is mandatory
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub year: String,
    pub class_id: Option<i64>,
    pub member_name: Option<String>,
    pub platform: Vec<i64>,
    pub technology: Vec<i64>,
}

fn json_ids(ids: &[i64]) -> Value {
    Value::from(ids.to_vec())
}

pub fn list_query(filter: &ProjectFilter) -> Result<QueryBuilder, DatabaseError> {
    let mut builder = QueryBuilder::new("senior_project")?
        .filter(Condition::eq("year", filter.year.as_str()))
        .filter_opt(filter.class_id.map(|id| Condition::eq("class_id", id)))
        .filter_opt(
            filter
                .member_name
                .as_deref()
                .map(|name| Condition::raw("`id` IN (SELECT `id` FROM `team_member` WHERE `name` = ?)", vec![name.into()])),
        );

    if !filter.platform.is_empty() {
        builder = builder.filter(Condition::JsonContains("platform".into(), json_ids(&filter.platform)));
    }
    if !filter.technology.is_empty() {
        builder = builder.filter(Condition::JsonContains("technology".into(), json_ids(&filter.technology)));
    }

    Ok(builder.order_random())
}

/// Member names per project id, in row order
pub fn group_member_names(members: &[TeamMemberRow]) -> HashMap<String, Vec<String>> {
    members.iter().fold(HashMap::new(), |mut groups, member| {
        groups.entry(member.id.clone()).or_insert_with(Vec::new).push(member.name.clone());
        groups
    })
}

pub struct SeniorProjectService {
    pool: MySqlPool,
}

impl SeniorProjectService {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn group_exists(&self, year: &str, class_id: i64, group_name: &str, except_id: Option<&str>) -> Result<bool, DatabaseError> {
        let found: Option<String> = sqlx::query_scalar(
            "SELECT id FROM senior_project WHERE year = ? AND class_id = ? AND group_name = ? AND id <> ? LIMIT 1",
        )
        .bind(year)
        .bind(class_id)
        .bind(group_name)
        .bind(except_id.unwrap_or_default())
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// Names of members already registered to any project
    pub async fn registered_members(&self, uni_ids: &[String]) -> Result<Vec<String>, DatabaseError> {
        if uni_ids.is_empty() {
            return Ok(vec![]);
        }
        let placeholders = vec!["?"; uni_ids.len()].join(", ");
        let sql = format!("SELECT name FROM team_member WHERE uni_id IN ({})", placeholders);
        let mut query = sqlx::query_scalar::<_, String>(&sql);
        for uni_id in uni_ids {
            query = query.bind(uni_id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn create(&self, id: &str, project: &ProjectInput, members: &[MemberInput]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO senior_project (id, year, class_id, group_name, project_design, link, platform, technology) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&project.year)
        .bind(project.class_id)
        .bind(&project.group_name)
        .bind(&project.project_design)
        .bind(Json(&project.link))
        .bind(Json(&project.platform))
        .bind(Json(&project.technology))
        .execute(&mut *tx)
        .await?;

        for member in members {
            sqlx::query("INSERT INTO team_member (id, uni_id, name, introduction, profile_image) VALUES (?, ?, ?, ?, ?)")
                .bind(id)
                .bind(&member.uni_id)
                .bind(&member.name)
                .bind(&member.introduction)
                .bind(&member.image)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Update the project; members not yet registered are added
    pub async fn update(&self, id: &str, project: &ProjectInput, members: &[MemberInput]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE senior_project SET year = ?, class_id = ?, group_name = ?, project_design = COALESCE(?, project_design), \
             link = ?, platform = ?, technology = ? WHERE id = ?",
        )
        .bind(&project.year)
        .bind(project.class_id)
        .bind(&project.group_name)
        .bind(&project.project_design)
        .bind(Json(&project.link))
        .bind(Json(&project.platform))
        .bind(Json(&project.technology))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        for member in members {
            sqlx::query(
                "INSERT IGNORE INTO team_member (id, uni_id, name, introduction, profile_image) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&member.uni_id)
            .bind(&member.name)
            .bind(&member.introduction)
            .bind(&member.image)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn find(&self, id: &str) -> Result<Option<SeniorProjectRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, SeniorProjectRow>("SELECT * FROM senior_project WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(&self, filter: &ProjectFilter) -> Result<Vec<SeniorProjectRow>, DatabaseError> {
        list_query(filter)?.fetch_all(&self.pool).await
    }

    /// Other projects whose platforms include all of `platform`
    pub async fn recommend(&self, id: &str, platform: &[i64]) -> Result<Vec<SeniorProjectRow>, DatabaseError> {
        QueryBuilder::new("senior_project")?
            .filter(Condition::JsonContains("platform".into(), json_ids(platform)))
            .filter(Condition::Ne("id".into(), id.into()))
            .order_random()
            .limit(RECOMMEND_LIMIT)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn members(&self, project_id: &str) -> Result<Vec<TeamMemberRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, TeamMemberRow>("SELECT * FROM team_member WHERE id = ?")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn members_of(&self, project_ids: &[String]) -> Result<Vec<TeamMemberRow>, DatabaseError> {
        QueryBuilder::new("team_member")?
            .filter(Condition::In("id".into(), project_ids.iter().map(|id| Value::from(id.as_str())).collect()))
            .fetch_all(&self.pool)
            .await
    }

    pub async fn member(&self, uni_id: &str) -> Result<Option<TeamMemberRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, TeamMemberRow>("SELECT * FROM team_member WHERE uni_id = ?")
            .bind(uni_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Account id of a member, matched on student number and name
    pub async fn member_account(&self, uni_id: &str, name: &str) -> Result<Option<String>, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT id FROM user WHERE uni_id = ? AND name = ? LIMIT 1")
            .bind(uni_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn lookups(&self, table: &'static str, ids: &[i64]) -> Result<Vec<Lookup>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Repository::<Lookup>::new(table, &self.pool).select_ids(ids).await
    }

    pub async fn class_info(&self, class_id: i32) -> Result<Option<Lookup>, DatabaseError> {
        Repository::<Lookup>::new("class", &self.pool)
            .select_one(vec![Condition::eq("id", class_id)])
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM team_member WHERE id = ?").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM senior_project WHERE id = ?").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_member(&self, uni_id: &str) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM team_member WHERE uni_id = ?")
            .bind(uni_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_requires_year_and_adds_optional_filters() {
        let filter = ProjectFilter {
            year: "2023".into(),
            class_id: Some(2),
            member_name: Some("홍길동".into()),
            platform: vec![1, 4],
            technology: vec![],
        };
        let sql = list_query(&filter).unwrap().to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM `senior_project` WHERE `year` = ? AND `class_id` = ? AND `id` IN (SELECT `id` FROM `team_member` WHERE `name` = ?) AND JSON_CONTAINS(`platform`, ?) ORDER BY RAND()"
        );
        assert_eq!(sql.params, vec![json!("2023"), json!(2), json!("홍길동"), json!("[1,4]")]);
    }

    #[test]
    fn groups_member_names_by_project() {
        let member = |project: &str, name: &str| TeamMemberRow {
            id: project.into(),
            uni_id: format!("{}-{}", project, name),
            name: name.into(),
            introduction: String::new(),
            profile_image: None,
        };
        let groups = group_member_names(&[member("p1", "a"), member("p2", "b"), member("p1", "c")]);
        assert_eq!(groups["p1"], vec!["a", "c"]);
        assert_eq!(groups["p2"], vec!["b"]);
    }

    #[test]
    fn incomplete_members_are_detected() {
        let member: MemberInput = serde_json::from_value(json!({"name": "a", "uniId": "1"})).unwrap();
        assert!(!member.is_complete());
        let member: MemberInput = serde_json::from_value(json!({"name": "a", "uniId": "1", "introduction": "hi"})).unwrap();
        assert!(member.is_complete());
    }
}
