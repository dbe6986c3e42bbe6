use serde::Serialize;
use serde_json::Value;
use sqlx::{types::Json, MySqlPool};

use crate::database::models::{Lookup, ProfileRow};
use crate::database::{DatabaseError, Repository};

const MAX_INTRODUCTION_SCORE: i64 = 4;
const MAX_RAW_SCORE: f64 = 13.0;

/// Section sizes that feed the completeness score
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSections {
    pub introduction_chars: usize,
    pub technologies: usize,
    pub positions: usize,
    pub awards: usize,
    pub links: usize,
}

/// Profile completeness, 0..=100
pub fn profile_score(sections: &ProfileSections) -> i64 {
    let introduction = if sections.introduction_chars == 0 {
        0
    } else {
        let exponent = (sections.introduction_chars / 100) as i32 - 1;
        let score = 2f64.powi(exponent).min(MAX_INTRODUCTION_SCORE as f64);
        if score < 1.0 {
            0
        } else {
            score as i64
        }
    };

    let technology = match sections.technologies {
        0 => 0,
        1 => 1,
        2..=4 => 2,
        _ => 4,
    };
    let position = i64::from(sections.positions > 0);
    let awards = sections.awards.min(2) as i64;
    let links = sections.links.min(2) as i64;

    let raw = introduction + technology + position + awards + links;
    (raw as f64 / MAX_RAW_SCORE * 100.0).round() as i64
}

/// Profile as shown to a viewer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub is_open: bool,
    pub is_me: bool,
    pub nickname: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awards: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<Lookup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<Lookup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_score: Option<i64>,
}

impl ProfileView {
    /// Fields visible even on a closed profile
    pub fn base(row: &ProfileRow, is_me: bool) -> Self {
        Self {
            is_open: row.is_open,
            is_me,
            nickname: row.nickname.clone(),
            id: row.user_id.clone(),
            awards: None,
            links: None,
            introduction: None,
            positions: None,
            technologies: None,
            image: None,
            profile_score: None,
        }
    }

    pub fn sections(&self) -> ProfileSections {
        ProfileSections {
            introduction_chars: self.introduction.as_deref().map(|s| s.chars().count()).unwrap_or(0),
            technologies: self.technologies.as_ref().map(Vec::len).unwrap_or(0),
            positions: self.positions.as_ref().map(Vec::len).unwrap_or(0),
            awards: self.awards.as_ref().map(Vec::len).unwrap_or(0),
            links: self.links.as_ref().map(Vec::len).unwrap_or(0),
        }
    }
}

/// Column values written by the profile editor; `None` clears the column
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub positions: Option<Vec<i64>>,
    pub technologies: Option<Vec<i64>>,
    pub introduction: Option<String>,
    pub awards: Option<Vec<Value>>,
    pub links: Option<Vec<Value>>,
}

/// Sort awards by their `awardedAt` text
pub fn sort_awards(awards: &mut [Value]) {
    awards.sort_by(|a, b| {
        let key = |v: &Value| v.get("awardedAt").and_then(Value::as_str).unwrap_or_default().to_string();
        key(a).cmp(&key(b))
    });
}

pub struct ProfileService {
    pool: MySqlPool,
}

impl ProfileService {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn exists(&self, user_id: &str) -> Result<bool, DatabaseError> {
        let found: Option<String> = sqlx::query_scalar("SELECT user_id FROM user_profile WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Record the student identity and open an empty profile
    pub async fn create(&self, user_id: &str, uni_id: &str, name: &str) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE user SET uni_id = ?, name = ? WHERE id = ?")
            .bind(uni_id)
            .bind(name)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO user_profile (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn find(&self, user_id: &str) -> Result<Option<ProfileRow>, DatabaseError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT p.user_id, u.nickname, p.is_open_information AS is_open, p.image, p.positions, \
             p.technologies, p.introduction, p.awards, p.links \
             FROM user_profile p INNER JOIN user u ON u.id = p.user_id WHERE p.user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn image_key(&self, user_id: &str) -> Result<Option<String>, DatabaseError> {
        let image: Option<Option<String>> = sqlx::query_scalar("SELECT image FROM user_profile WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(image.flatten().filter(|key| !key.is_empty()))
    }

    /// Image keys of the given users' profiles, keyed by user id
    pub async fn image_keys(&self, user_ids: &[String]) -> Result<Vec<(String, Option<String>)>, DatabaseError> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }
        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!("SELECT user_id, image FROM user_profile WHERE user_id IN ({})", placeholders);
        let mut query = sqlx::query_as::<_, (String, Option<String>)>(&sql);
        for id in user_ids {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn update(&self, user_id: &str, update: &ProfileUpdate, image: Option<&str>) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE user_profile SET positions = ?, technologies = ?, introduction = ?, awards = ?, links = ?, image = ? \
             WHERE user_id = ?",
        )
        .bind(update.positions.as_ref().map(Json))
        .bind(update.technologies.as_ref().map(Json))
        .bind(&update.introduction)
        .bind(update.awards.as_ref().map(Json))
        .bind(update.links.as_ref().map(Json))
        .bind(image)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_open(&self, user_id: &str, open: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE user_profile SET is_open_information = ? WHERE user_id = ?")
            .bind(open)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn lookups(&self, table: &'static str, ids: &[i64]) -> Result<Vec<Lookup>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Repository::<Lookup>::new(table, &self.pool).select_ids(ids).await
    }

    /// Full view of `row` for `is_me`; storage lookups are left to the caller
    pub async fn expand(&self, row: &ProfileRow, is_me: bool) -> Result<ProfileView, DatabaseError> {
        let mut view = ProfileView::base(row, is_me);
        if !is_me && !row.is_open {
            return Ok(view);
        }

        view.awards = row.awards.as_ref().map(|json| json.0.clone());
        view.links = row.links.as_ref().map(|json| json.0.clone());
        view.introduction = row.introduction.clone().filter(|s| !s.is_empty());
        if let Some(Json(ids)) = &row.positions {
            view.positions = Some(self.lookups("job_category", ids).await?);
        }
        if let Some(Json(ids)) = &row.technologies {
            view.technologies = Some(self.lookups("technology", ids).await?);
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(intro: usize, tech: usize, pos: usize, awards: usize, links: usize) -> i64 {
        profile_score(&ProfileSections {
            introduction_chars: intro,
            technologies: tech,
            positions: pos,
            awards,
            links,
        })
    }

    #[test]
    fn empty_profile_scores_zero() {
        assert_eq!(score(0, 0, 0, 0, 0), 0);
    }

    #[test]
    fn introduction_doubles_per_hundred_chars() {
        // 2^(0-1) = 0.5 rounds down to nothing
        assert_eq!(score(99, 0, 0, 0, 0), 0);
        // 2^0 = 1 of 13
        assert_eq!(score(100, 0, 0, 0, 0), 8);
        // 2^1 = 2
        assert_eq!(score(250, 0, 0, 0, 0), 15);
        // capped at 4
        assert_eq!(score(1000, 0, 0, 0, 0), 31);
    }

    #[test]
    fn technology_tiers() {
        assert_eq!(score(0, 1, 0, 0, 0), 8);
        assert_eq!(score(0, 2, 0, 0, 0), 15);
        assert_eq!(score(0, 4, 0, 0, 0), 15);
        assert_eq!(score(0, 5, 0, 0, 0), 31);
    }

    #[test]
    fn complete_profile_scores_hundred() {
        assert_eq!(score(300, 5, 1, 2, 2), 100);
        assert_eq!(score(300, 9, 3, 7, 4), 100);
    }

    #[test]
    fn awards_sort_by_date_text() {
        let mut awards = vec![
            json!({"name": "b", "awardedAt": "2023.05"}),
            json!({"name": "a", "awardedAt": "2021.01"}),
            json!({"name": "c"}),
        ];
        sort_awards(&mut awards);
        assert_eq!(awards[0]["name"], "c");
        assert_eq!(awards[1]["name"], "a");
        assert_eq!(awards[2]["name"], "b");
    }
}
