use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::database::models::{BoardContentRow, CommentRow};
use crate::database::DatabaseError;

pub const PAGE_LIMIT: i64 = 20;
pub const BEST_PICK_COUNT: usize = 3;

const CONTENT_SELECT: &str = "SELECT bc.id, bc.category_id, bc.user_id, u.nickname AS user_nickname, bc.title, \
     bc.content, bc.uploaded_at, up.image AS profile_image \
     FROM board_content bc \
     LEFT JOIN user u ON u.id = bc.user_id \
     LEFT JOIN user_profile up ON up.user_id = bc.user_id";

/// Like and comment totals of one content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Engagement {
    pub likes: i64,
    pub comments: i64,
}

impl Engagement {
    pub fn score(&self) -> i64 {
        self.comments * 2 + self.likes
    }
}

/// Top entries by engagement score; ties keep their input order
pub fn best_pick<T>(mut entries: Vec<(T, Engagement)>) -> Vec<(T, Engagement)> {
    entries.sort_by(|(_, a), (_, b)| b.score().cmp(&a.score()));
    entries.truncate(BEST_PICK_COUNT);
    entries
}

/// Highest page whose end offset still fits in an i64
pub const MAX_PAGE: i64 = i64::MAX / PAGE_LIMIT;

/// Offset of a 1-based page no greater than `MAX_PAGE`
pub fn page_offset(page: i64) -> i64 {
    (page - 1) * PAGE_LIMIT
}

pub struct CommunityService {
    pool: MySqlPool,
}

impl CommunityService {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, id: &str, author: &str, category_id: i64, title: &str, content: &str, now: NaiveDateTime) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO board_content (id, user_id, category_id, title, content, uploaded_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(author)
        .bind(category_id)
        .bind(title)
        .bind(content)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn content(&self, id: &str) -> Result<Option<BoardContentRow>, DatabaseError> {
        let sql = format!("{} WHERE bc.id = ? AND bc.is_deleted = 0", CONTENT_SELECT);
        Ok(sqlx::query_as::<_, BoardContentRow>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    /// Newest first, `PAGE_LIMIT` rows from `offset`
    pub async fn page(&self, category_id: i64, offset: i64) -> Result<Vec<BoardContentRow>, DatabaseError> {
        let sql = format!(
            "{} WHERE bc.category_id = ? AND bc.is_deleted = 0 ORDER BY bc.uploaded_at DESC LIMIT ? OFFSET ?",
            CONTENT_SELECT
        );
        Ok(sqlx::query_as::<_, BoardContentRow>(&sql)
            .bind(category_id)
            .bind(PAGE_LIMIT)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn has_rows_from(&self, category_id: i64, offset: i64) -> Result<bool, DatabaseError> {
        let found: Option<String> = sqlx::query_scalar(
            "SELECT id FROM board_content WHERE category_id = ? AND is_deleted = 0 ORDER BY uploaded_at DESC LIMIT 1 OFFSET ?",
        )
        .bind(category_id)
        .bind(offset)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// Contents uploaded on or after `since`, oldest first
    pub async fn uploaded_since(&self, category_id: i64, since: NaiveDate) -> Result<Vec<BoardContentRow>, DatabaseError> {
        let sql = format!(
            "{} WHERE bc.category_id = ? AND bc.is_deleted = 0 AND bc.uploaded_at >= ? ORDER BY bc.uploaded_at ASC",
            CONTENT_SELECT
        );
        Ok(sqlx::query_as::<_, BoardContentRow>(&sql)
            .bind(category_id)
            .bind(since)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn update(&self, id: &str, title: &str, content: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE board_content SET title = ?, content = ? WHERE id = ?")
            .bind(title)
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn soft_delete(&self, id: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE board_content SET is_deleted = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn engagement(&self, id: &str) -> Result<Engagement, DatabaseError> {
        let (likes, comments): (i64, i64) = sqlx::query_as(
            "SELECT \
             (SELECT COUNT(*) FROM board_like WHERE board_content_id = ? AND is_deleted = 0), \
             (SELECT COUNT(*) FROM board_comment WHERE board_content_id = ? AND is_deleted = 0)",
        )
        .bind(id)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(Engagement { likes, comments })
    }

    pub async fn is_liked(&self, id: &str, email: &str) -> Result<bool, DatabaseError> {
        let deleted: Option<bool> =
            sqlx::query_scalar("SELECT is_deleted FROM board_like WHERE board_content_id = ? AND user_id = ?")
                .bind(id)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(deleted == Some(false))
    }

    /// Flip the caller's like; returns the new state and the like total
    pub async fn toggle_like(&self, id: &str, email: &str, now: NaiveDateTime) -> Result<(bool, i64), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let deleted: Option<bool> = sqlx::query_scalar(
            "SELECT is_deleted FROM board_like WHERE board_content_id = ? AND user_id = ? FOR UPDATE",
        )
        .bind(id)
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;
        let liked_now = deleted != Some(false);

        sqlx::query(
            "INSERT INTO board_like (board_content_id, user_id, updated_at, is_deleted) VALUES (?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE updated_at = VALUES(updated_at), is_deleted = VALUES(is_deleted)",
        )
        .bind(id)
        .bind(email)
        .bind(now)
        .bind(!liked_now)
        .execute(&mut *tx)
        .await?;

        let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM board_like WHERE board_content_id = ? AND is_deleted = 0")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok((liked_now, likes))
    }

    pub async fn add_comment(&self, content_id: &str, author: &str, content: &str, now: NaiveDateTime) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO board_comment (board_content_id, user_id, content, uploaded_at) VALUES (?, ?, ?, ?)")
            .bind(content_id)
            .bind(author)
            .bind(content)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn comment(&self, id: i64) -> Result<Option<CommentRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, CommentRow>(
            "SELECT c.id, c.board_content_id, c.user_id, u.nickname AS user_nickname, c.content, c.uploaded_at, \
             up.image AS profile_image \
             FROM board_comment c LEFT JOIN user u ON u.id = c.user_id \
             LEFT JOIN user_profile up ON up.user_id = c.user_id \
             WHERE c.id = ? AND c.is_deleted = 0",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Live comments of a content, newest first
    pub async fn comments(&self, content_id: &str) -> Result<Vec<CommentRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, CommentRow>(
            "SELECT c.id, c.board_content_id, c.user_id, u.nickname AS user_nickname, c.content, c.uploaded_at, \
             up.image AS profile_image \
             FROM board_comment c LEFT JOIN user u ON u.id = c.user_id \
             LEFT JOIN user_profile up ON up.user_id = c.user_id \
             WHERE c.board_content_id = ? AND c.is_deleted = 0 ORDER BY c.uploaded_at DESC",
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn soft_delete_comment(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE board_comment SET is_deleted = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
