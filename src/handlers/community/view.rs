// handlers/community/view.rs - shapes shared by the community endpoints

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::api::format::from_now_ko;
use crate::database::models::{BoardContentRow, CommentRow};
use crate::error::ApiError;
use crate::handlers::image_url;
use crate::services::community_service::Engagement;
use crate::services::CommunityService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView {
    pub like_count: i64,
    pub comment_count: i64,
    pub from_now_while_ago_posted: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i32>,
    pub user_id: String,
    pub user_nickname: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_me: Option<bool>,
    #[serde(rename = "profileImageURL", skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub user_id: String,
    pub user_nickname: Option<String>,
    pub content: String,
    pub from_now_while_ago_posted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_me: Option<bool>,
    #[serde(rename = "profileImageURL", skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Row plus counters, without any caller-specific flags
pub fn content_view(row: BoardContentRow, engagement: Engagement, now: NaiveDateTime) -> ContentView {
    ContentView {
        like_count: engagement.likes,
        comment_count: engagement.comments,
        from_now_while_ago_posted: from_now_ko(row.uploaded_at, now),
        id: row.id,
        category_id: Some(row.category_id),
        user_id: row.user_id,
        user_nickname: row.user_nickname,
        title: row.title,
        content: row.content,
        is_liked: None,
        is_me: None,
        profile_image_url: None,
    }
}

/// Full view of a content for `caller`
pub async fn describe_content(
    state: &AppState,
    row: BoardContentRow,
    caller: Option<&str>,
    now: NaiveDateTime,
) -> Result<ContentView, ApiError> {
    let service = CommunityService::new(state.pool.clone());
    let engagement = service.engagement(&row.id).await?;
    let image = image_url(state.storage.as_ref(), row.profile_image.as_deref()).await?;

    let mut view = match caller {
        Some(email) => {
            let liked = service.is_liked(&row.id, email).await?;
            let is_me = row.user_id == email;
            let mut view = content_view(row, engagement, now);
            view.is_liked = liked.then_some(true);
            view.is_me = is_me.then_some(true);
            view
        }
        None => content_view(row, engagement, now),
    };
    view.profile_image_url = image;
    Ok(view)
}

pub fn comment_view(row: CommentRow, caller: Option<&str>, now: NaiveDateTime) -> CommentView {
    let is_me = caller.map(|email| email == row.user_id).unwrap_or(false);
    CommentView {
        id: row.id,
        from_now_while_ago_posted: from_now_ko(row.uploaded_at, now),
        user_id: row.user_id,
        user_nickname: row.user_nickname,
        content: row.content,
        is_me: is_me.then_some(true),
        profile_image_url: None,
    }
}

/// Live comments of `content_id`, newest first
pub async fn describe_comments(
    state: &AppState,
    content_id: &str,
    caller: Option<&str>,
    now: NaiveDateTime,
) -> Result<Vec<CommentView>, ApiError> {
    let rows = CommunityService::new(state.pool.clone()).comments(content_id).await?;
    let mut comments = Vec::with_capacity(rows.len());
    for row in rows {
        let image = image_url(state.storage.as_ref(), row.profile_image.as_deref()).await?;
        let mut view = comment_view(row, caller, now);
        view.profile_image_url = image;
        comments.push(view);
    }
    Ok(comments)
}
