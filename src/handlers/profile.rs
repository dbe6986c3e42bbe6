// handlers/profile.rs - /api/profile student profiles
//
// POST  /api/profile        open a profile (once)
// GET   /api/profile?id=    view, optional caller
// PUT   /api/profile        edit (multipart)
// PATCH /api/profile/open   toggle public visibility

use axum::{
    extract::{Multipart, Query, State},
    middleware::from_fn,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::api::multipart::MultipartForm;
use crate::api::validate::require_fields;
use crate::error::ApiError;
use crate::handlers::{discard_image, store_resized, IdQuery};
use crate::middleware::{optional_user, require_access, ApiResponse, ApiResult, AuthUser};
use crate::services::profile_service::{profile_score, sort_awards, ProfileUpdate, ProfileView};
use crate::services::{ProfileService, UserService};
use crate::state::AppState;
use crate::storage::resize::PROFILE_IMAGE;

pub fn routes() -> Router<AppState> {
    let optional = Router::new().route("/", get(view)).route_layer(from_fn(optional_user));

    let protected = Router::new()
        .route("/", post(create).put(update))
        .route("/open", patch(open))
        .route_layer(from_fn(require_access));

    optional.merge(protected)
}

/// What a viewer gets back for a user id
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProfileInfo {
    Profile(ProfileView),
    #[serde(rename_all = "camelCase")]
    AdminAccount {
        has_not_profile: bool,
        id: String,
        nickname: String,
        is_admin: bool,
    },
    #[serde(rename_all = "camelCase")]
    NoProfile {
        has_not_profile: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_me: Option<bool>,
    },
}

/// Profile of `id` as `requester` sees it; `None` for an unknown user
pub async fn profile_info(state: &AppState, id: &str, requester: &str) -> Result<Option<ProfileInfo>, ApiError> {
    let is_me = id == requester;
    let service = ProfileService::new(state.pool.clone());

    let Some(row) = service.find(id).await? else {
        let Some(user) = UserService::new(state.pool.clone()).find(id).await? else {
            return Ok(None);
        };
        let info = if user.is_admin {
            ProfileInfo::AdminAccount { has_not_profile: true, id: user.id, nickname: user.nickname, is_admin: true }
        } else {
            ProfileInfo::NoProfile { has_not_profile: true, is_me: is_me.then_some(true) }
        };
        return Ok(Some(info));
    };

    let mut view = service.expand(&row, is_me).await?;
    if is_me || row.is_open {
        if let Some(key) = row.image.as_deref().filter(|key| !key.is_empty()) {
            view.image = state.storage.object_url(key).await?;
        }
        view.profile_score = Some(profile_score(&view.sections()));
    }
    Ok(Some(ProfileInfo::Profile(view)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub uni_id: Option<String>,
    pub name: Option<String>,
}

/// POST /api/profile
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateRequest>,
) -> ApiResult<Value> {
    require_fields(&[("uniId", body.uni_id.as_deref()), ("name", body.name.as_deref())])?;

    let service = ProfileService::new(state.pool.clone());
    if service.exists(&user.email).await? {
        return Err(ApiError::bad_request("Profile already exists"));
    }

    service
        .create(
            &user.email,
            body.uni_id.as_deref().unwrap_or_default().trim(),
            body.name.as_deref().unwrap_or_default().trim(),
        )
        .await?;

    info!("Profile opened for {}", user.email);
    Ok(ApiResponse::success(json!({ "isPost": true })))
}

/// GET /api/profile?id=
pub async fn view(
    State(state): State<AppState>,
    caller: Option<Extension<AuthUser>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Value> {
    let id = query.require()?;
    let requester = caller.map(|Extension(user)| user.email).unwrap_or_default();

    let profile_info = profile_info(&state, id, &requester)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(json!({ "profileInfo": profile_info })))
}

/// Column values from the editor form; blank parts clear their column
pub fn profile_update(form: &MultipartForm) -> Result<ProfileUpdate, ApiError> {
    let mut update = ProfileUpdate {
        positions: form.json("positions")?,
        technologies: form.json("technologies")?,
        introduction: form.text("introduction").filter(|s| !s.is_empty()).map(str::to_string),
        awards: form.json("awards")?,
        links: form.json("links")?,
    };

    if let Some(awards) = update.awards.as_mut() {
        sort_awards(awards);
    }
    Ok(update)
}

/// Image column after an edit
#[derive(Debug, PartialEq)]
pub enum ImageChange {
    Keep,
    Replace { file_name: String },
    Remove,
}

pub fn image_change(form: &MultipartForm) -> ImageChange {
    match form.file("image") {
        Some(file) => ImageChange::Replace { file_name: file.file_name.clone() },
        None if form.text("image").is_some() => ImageChange::Keep,
        None => ImageChange::Remove,
    }
}

/// PUT /api/profile - returns the refreshed profile
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = MultipartForm::read(multipart).await?;
    let changes = profile_update(&form)?;

    let service = ProfileService::new(state.pool.clone());
    if !service.exists(&user.email).await? {
        return Err(ApiError::not_found("Profile not found"));
    }
    let current = service.image_key(&user.email).await?;

    let image = match image_change(&form) {
        ImageChange::Keep => current.clone(),
        ImageChange::Remove => None,
        ImageChange::Replace { file_name } => {
            let bytes = form.file("image").map(|file| file.bytes.clone()).unwrap_or_default();
            let key = format!("profile/{}/{}", user.email, file_name);
            Some(store_resized(state.storage.as_ref(), &key, bytes, PROFILE_IMAGE).await?)
        }
    };

    service.update(&user.email, &changes, image.as_deref()).await?;
    if let Some(old) = current.filter(|old| Some(old) != image.as_ref()) {
        discard_image(state.storage.as_ref(), &old).await;
    }

    let profile_info = profile_info(&state, &user.email, &user.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(json!({ "profileInfo": profile_info })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequest {
    pub will_open_information: Option<bool>,
}

/// PATCH /api/profile/open
pub async fn open(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<OpenRequest>,
) -> ApiResult<Value> {
    let open = body
        .will_open_information
        .ok_or_else(|| ApiError::missing_fields(&["willOpenInformation"]))?;

    if !ProfileService::new(state.pool.clone()).set_open(&user.email, open).await? {
        return Err(ApiError::not_found("Profile not found"));
    }
    Ok(ApiResponse::success(json!({ "isOpen": open })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::multipart::UploadedFile;

    fn form(pairs: &[(&str, &str)]) -> MultipartForm {
        let mut form = MultipartForm::default();
        for (name, value) in pairs {
            form.fields.insert(name.to_string(), value.to_string());
        }
        form
    }

    #[test]
    fn blank_parts_clear_columns() {
        let update = profile_update(&form(&[("positions", ""), ("introduction", ""), ("links", "[\"https://a.dev\"]")])).unwrap();
        assert!(update.positions.is_none());
        assert!(update.introduction.is_none());
        assert!(update.technologies.is_none());
        assert_eq!(update.links, Some(vec![json!("https://a.dev")]));
    }

    #[test]
    fn awards_are_sorted_on_save() {
        let update = profile_update(&form(&[(
            "awards",
            r#"[{"name":"late","awardedAt":"2023.10"},{"name":"early","awardedAt":"2022.01"}]"#,
        )]))
        .unwrap();
        let awards = update.awards.unwrap();
        assert_eq!(awards[0]["name"], "early");
        assert_eq!(awards[1]["name"], "late");
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = profile_update(&form(&[("technologies", "[1,")])).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn sections_must_match_their_column_shape() {
        let err = profile_update(&form(&[("positions", r#"["a"]"#)])).unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = profile_update(&form(&[("awards", r#"{"x":1}"#)])).unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = profile_update(&form(&[("links", "{}")])).unwrap_err();
        assert_eq!(err.status_code(), 400);

        let update = profile_update(&form(&[("positions", "[1, 3]"), ("technologies", "[]")])).unwrap();
        assert_eq!(update.positions, Some(vec![1, 3]));
        assert_eq!(update.technologies, Some(vec![]));
    }

    #[test]
    fn image_part_decides_the_column() {
        assert_eq!(image_change(&form(&[("image", "profile/a/me.png")])), ImageChange::Keep);
        assert_eq!(image_change(&form(&[])), ImageChange::Remove);

        let mut upload = form(&[]);
        upload.files.push(UploadedFile { field: "image".into(), file_name: "me.png".into(), bytes: vec![1] });
        assert_eq!(image_change(&upload), ImageChange::Replace { file_name: "me.png".into() });
    }

    #[test]
    fn accounts_without_profile_serialize_flags_only() {
        let info = ProfileInfo::NoProfile { has_not_profile: true, is_me: None };
        assert_eq!(serde_json::to_value(info).unwrap(), json!({ "hasNotProfile": true }));

        let admin = ProfileInfo::AdminAccount {
            has_not_profile: true,
            id: "admin@x.com".into(),
            nickname: "admin0".into(),
            is_admin: true,
        };
        let json = serde_json::to_value(admin).unwrap();
        assert_eq!(json["isAdmin"], true);
        assert_eq!(json["nickname"], "admin0");
    }
}
