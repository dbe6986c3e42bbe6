// handlers/auth/join.rs - POST /api/auth/join and POST /api/auth/admin

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::validate::{parse_compact_date, require_fields, required};
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::handlers::require_admin;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::{NewUser, UserService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub id: Option<String>,
    pub nickname: Option<String>,
    pub password: Option<String>,
    pub verify_password: Option<String>,
    pub is_student: Option<bool>,
    #[serde(alias = "uniID")]
    pub uni_id: Option<String>,
    pub name: Option<String>,
    pub birthday: Option<String>,
}

/// Student identity checked against the registry
struct StudentIdentity<'a> {
    uni_id: &'a str,
    name: &'a str,
    birthday: &'a str,
}

impl JoinRequest {
    fn student_identity(&self) -> Result<Option<StudentIdentity<'_>>, ApiError> {
        if self.is_student != Some(true) {
            return Ok(None);
        }
        require_fields(&[
            ("uniId", self.uni_id.as_deref()),
            ("name", self.name.as_deref()),
            ("birthday", self.birthday.as_deref()),
        ])?;
        let birthday = required(&self.birthday, "birthday")?;
        if parse_compact_date(birthday).is_none() {
            return Err(ApiError::bad_request("Birthday must be a valid YYYYMMDD date"));
        }
        Ok(Some(StudentIdentity {
            uni_id: required(&self.uni_id, "uniId")?,
            name: required(&self.name, "name")?,
            birthday,
        }))
    }
}

/// POST /api/auth/join - create a member account
///
/// Students must match a row of the student registry and may hold one account.
pub async fn join(State(state): State<AppState>, Json(body): Json<JoinRequest>) -> ApiResult<Value> {
    require_fields(&[
        ("id", body.id.as_deref()),
        ("nickname", body.nickname.as_deref()),
        ("password", body.password.as_deref()),
        ("verifyPassword", body.verify_password.as_deref()),
    ])?;
    if body.is_student.is_none() {
        return Err(ApiError::missing_fields(&["isStudent"]));
    }
    let id = required(&body.id, "id")?;
    let nickname = required(&body.nickname, "nickname")?;
    let password = required(&body.password, "password")?;

    if Some(password) != body.verify_password.as_deref().map(str::trim) {
        return Err(ApiError::bad_request("Passwords do not match"));
    }

    let student = body.student_identity()?;
    let users = UserService::new(state.pool.clone());

    if let Some(student) = &student {
        if users.student_account_exists(student.uni_id, student.name, student.birthday).await? {
            return Err(ApiError::conflict("An account already exists for this student"));
        }
    }
    if users.id_taken(id).await? {
        return Err(ApiError::conflict("Id is already in use"));
    }
    if users.nickname_taken(nickname).await? {
        return Err(ApiError::conflict("Nickname is already in use"));
    }
    if let Some(student) = &student {
        if !users.is_registered_student(student.uni_id, student.name, student.birthday).await? {
            return Err(ApiError::forbidden("Student is not registered"));
        }
    }

    users
        .create(&NewUser {
            id: id.to_string(),
            nickname: nickname.to_string(),
            password_hash: hash_password(password),
            name: student.as_ref().map(|s| s.name.to_string()),
            birthday: student.as_ref().map(|s| s.birthday.to_string()),
            uni_id: student.as_ref().map(|s| s.uni_id.to_string()),
            is_student: student.is_some(),
            is_admin: false,
        })
        .await?;

    info!("Account {} created (student: {})", id, student.is_some());
    Ok(ApiResponse::created(json!({ "isJoin": true })))
}

#[derive(Debug, Deserialize)]
pub struct AdminJoinRequest {
    pub id: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/admin - an admin creates another admin account
pub async fn admin_join(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AdminJoinRequest>,
) -> ApiResult<Value> {
    require_fields(&[("id", body.id.as_deref()), ("password", body.password.as_deref())])?;
    let id = required(&body.id, "id")?;
    let password = required(&body.password, "password")?;

    require_admin(&state, &user.email).await?;

    let users = UserService::new(state.pool.clone());
    if users.id_taken(id).await? {
        return Err(ApiError::conflict("Id is already in use"));
    }
    let nickname = format!("admin{}", users.admin_count().await?);

    users
        .create(&NewUser {
            id: id.to_string(),
            nickname,
            password_hash: hash_password(password),
            name: None,
            birthday: None,
            uni_id: None,
            is_student: false,
            is_admin: true,
        })
        .await?;

    info!("Admin {} created by {}", id, user.email);
    Ok(ApiResponse::created(json!({ "isJoin": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(value: Value) -> JoinRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_both_spellings_of_student_number() {
        assert_eq!(request(json!({"uniId": "2020"})).uni_id.as_deref(), Some("2020"));
        assert_eq!(request(json!({"uniID": "2021"})).uni_id.as_deref(), Some("2021"));
    }

    #[test]
    fn non_students_skip_identity_checks() {
        let body = request(json!({"isStudent": false}));
        assert!(body.student_identity().unwrap().is_none());
    }

    #[test]
    fn students_need_a_real_birthday() {
        let body = request(json!({"isStudent": true, "uniId": "1", "name": "kim", "birthday": "20230230"}));
        assert_eq!(body.student_identity().err().unwrap().status_code(), 400);

        let body = request(json!({"isStudent": true, "uniId": "1", "name": "kim"}));
        assert_eq!(body.student_identity().err().unwrap().status_code(), 400);

        let body = request(json!({"isStudent": true, "uniId": "1", "name": "kim", "birthday": "20000101"}));
        let identity = body.student_identity().unwrap().unwrap();
        assert_eq!(identity.birthday, "20000101");
    }
}
