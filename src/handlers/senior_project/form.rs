// handlers/senior_project/form.rs - admin multipart form for projects

use serde_json::Value;

use crate::api::multipart::{MultipartForm, UploadedFile};
use crate::api::validate::require_fields;
use crate::error::ApiError;
use crate::services::senior_project_service::{MemberInput, ProjectInput};

pub const MAX_MEMBERS: usize = 8;
pub const DESIGN_FIELD: &str = "projectDesign";

/// Team member index for a `profileImageN` part (1-based in the form)
pub fn member_slot(field: &str) -> Option<usize> {
    let n: usize = field.strip_prefix("profileImage")?.parse().ok()?;
    (1..=MAX_MEMBERS).contains(&n).then(|| n - 1)
}

/// Storage prefix shared by a project's files
pub fn project_prefix(year: &str, group_name: &str) -> String {
    format!("{}/{}", year, group_name)
}

pub fn member_image_key(year: &str, group_name: &str, member_name: &str) -> String {
    format!("{}/{}.png", project_prefix(year, group_name), member_name)
}

pub fn design_key(year: &str, group_name: &str, file_name: &str) -> String {
    format!("{}/{}", project_prefix(year, group_name), file_name)
}

fn non_empty_array(form: &MultipartForm, name: &str) -> Result<Vec<Value>, ApiError> {
    match form.json::<Value>(name)? {
        Some(Value::Array(items)) if !items.is_empty() => Ok(items),
        Some(Value::Array(_)) => Err(ApiError::bad_request(format!("{} needs at least one entry", name))),
        _ => Err(ApiError::bad_request(format!("{} must be a JSON array", name))),
    }
}

fn sorted_ids(form: &MultipartForm, name: &str) -> Result<Vec<i64>, ApiError> {
    let mut ids = non_empty_array(form, name)?
        .iter()
        .map(|v| v.as_i64().ok_or_else(|| ApiError::bad_request(format!("{} must hold numeric ids", name))))
        .collect::<Result<Vec<i64>, ApiError>>()?;
    ids.sort_unstable();
    Ok(ids)
}

/// Validated project fields and team members; file parts are handled by the caller
pub fn project_form(form: &MultipartForm) -> Result<(ProjectInput, Vec<MemberInput>), ApiError> {
    require_fields(&[
        ("groupName", form.text("groupName")),
        ("classId", form.text("classId")),
        ("year", form.text("year")),
        ("teamMember", form.text("teamMember")),
        ("link", form.text("link")),
        ("platform", form.text("platform")),
        ("technology", form.text("technology")),
    ])?;

    let members: Vec<MemberInput> = form.json("teamMember")?.unwrap_or_default();
    if members.is_empty() {
        return Err(ApiError::bad_request("At least one team member is required"));
    }
    if members.len() > MAX_MEMBERS {
        return Err(ApiError::bad_request(format!("At most {} team members are allowed", MAX_MEMBERS)));
    }
    if !members.iter().all(MemberInput::is_complete) {
        return Err(ApiError::bad_request("Each team member needs name, uniId and introduction"));
    }

    let class_id = form
        .text("classId")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::bad_request("classId must be a number"))?;

    let project = ProjectInput {
        year: form.text("year").unwrap_or_default().trim().to_string(),
        class_id,
        group_name: form.text("groupName").unwrap_or_default().trim().to_string(),
        project_design: None,
        platform: sorted_ids(form, "platform")?,
        technology: sorted_ids(form, "technology")?,
        link: non_empty_array(form, "link")?,
    };
    Ok((project, members))
}

/// Member image uploads paired with their team member index
pub fn member_images<'a>(form: &'a MultipartForm, member_count: usize) -> Result<Vec<(usize, &'a UploadedFile)>, ApiError> {
    let mut images = Vec::new();
    for file in &form.files {
        if file.field == DESIGN_FIELD {
            continue;
        }
        match member_slot(&file.field) {
            Some(slot) if slot < member_count => images.push((slot, file)),
            _ => return Err(ApiError::bad_request(format!("{} has no matching team member", file.field))),
        }
    }
    Ok(images)
}
