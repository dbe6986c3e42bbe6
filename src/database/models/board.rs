use chrono::NaiveDateTime;
use sqlx::FromRow;

/// Content joined with the author's nickname and profile image
#[derive(Debug, Clone, FromRow)]
pub struct BoardContentRow {
    pub id: String,
    pub category_id: i32,
    pub user_id: String,
    pub user_nickname: Option<String>,
    pub title: String,
    pub content: String,
    pub uploaded_at: NaiveDateTime,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub board_content_id: String,
    pub user_id: String,
    pub user_nickname: Option<String>,
    pub content: String,
    pub uploaded_at: NaiveDateTime,
    pub profile_image: Option<String>,
}
