// handlers/mod.rs - Route groups mounted under /api
//
// Each group exposes `routes()` returning a `Router<AppState>`. Access rules are
// attached per sub-router with `route_layer`:
//   public    → no token
//   optional  → caller attached when a valid access token is present
//   protected → access token required
//   admin     → access token required, checked against `user.is_admin` in the handler

pub mod auth;
pub mod banner;
pub mod category;
pub mod community;
pub mod employment;
pub mod help;
pub mod management;
pub mod map;
pub mod profile;
pub mod senior_project;
pub mod token;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::warn;

use crate::error::ApiError;
use crate::services::UserService;
use crate::state::AppState;
use crate::storage::resize::{fill_resize_blocking, ResizeSpec};
use crate::storage::ObjectStorage;

/// `?id=` shared by the detail endpoints
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    pub fn require(&self) -> Result<&str, ApiError> {
        crate::api::validate::required(&self.id, "id")
    }
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// 403 unless `email` belongs to an admin account
pub async fn require_admin(state: &AppState, email: &str) -> Result<(), ApiError> {
    if UserService::new(state.pool.clone()).is_admin(email).await? {
        Ok(())
    } else {
        warn!("Admin route refused for {}", email);
        Err(ApiError::forbidden("Admin account required"))
    }
}

/// The author of a row, or any admin, may change it
pub async fn require_author_or_admin(state: &AppState, email: &str, author: &str) -> Result<(), ApiError> {
    if email == author {
        return Ok(());
    }
    require_admin(state, email)
        .await
        .map_err(|_| ApiError::forbidden("Only the author or an admin may change this"))
}

/// Public URL of a stored image, or `None` when the key is empty or gone
pub async fn image_url(storage: &dyn ObjectStorage, key: Option<&str>) -> Result<Option<String>, ApiError> {
    match key.filter(|k| !k.is_empty()) {
        Some(key) => Ok(storage.public_url(key).await?),
        None => Ok(None),
    }
}

/// Remove a stored image; failures are logged, not returned
pub async fn discard_image(storage: &dyn ObjectStorage, key: &str) {
    if let Err(e) = storage.delete_if_exists(key).await {
        warn!("Failed to delete stored object {}: {}", key, e);
    }
}

/// Pass a write result through; on failure the freshly stored `uploaded` object is removed
pub async fn discard_on_error<T, E: Into<ApiError>>(
    storage: &dyn ObjectStorage,
    uploaded: Option<&str>,
    result: Result<T, E>,
) -> Result<T, ApiError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            if let Some(key) = uploaded {
                discard_image(storage, key).await;
            }
            Err(e.into())
        }
    }
}

/// Resize an upload and store it under `key`; returns the stored key
pub async fn store_resized(
    storage: &dyn ObjectStorage,
    key: &str,
    bytes: Vec<u8>,
    spec: ResizeSpec,
) -> Result<String, ApiError> {
    let resized = fill_resize_blocking(bytes, spec).await?;
    Ok(storage.upload(key, resized, spec.content_type()).await?)
}

/// Content type from a file name's extension
pub fn content_type_of(file_name: &str) -> &'static str {
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_of("Spring.PNG"), "image/png");
        assert_eq!(content_type_of("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_of("design.pdf"), "application/pdf");
        assert_eq!(content_type_of("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn failed_write_removes_the_new_upload() {
        use crate::storage::MemoryStorage;

        let storage = MemoryStorage::new();
        storage.upload("employment/new.jpg", vec![1], "image/jpeg").await.unwrap();
        let failed: Result<(), ApiError> = Err(ApiError::internal_server_error("update failed"));
        let err = discard_on_error(&storage, Some("employment/new.jpg"), failed).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(!storage.exists("employment/new.jpg").await.unwrap());

        storage.upload("employment/kept.jpg", vec![1], "image/jpeg").await.unwrap();
        discard_on_error(&storage, Some("employment/kept.jpg"), Ok::<_, ApiError>(())).await.unwrap();
        assert!(storage.exists("employment/kept.jpg").await.unwrap());
    }

    #[test]
    fn id_query_requires_a_value() {
        assert_eq!(IdQuery { id: Some("a".into()) }.require().unwrap(), "a");
        assert_eq!(IdQuery { id: None }.require().unwrap_err().status_code(), 400);
    }
}
