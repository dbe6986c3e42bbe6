use std::collections::HashMap;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A drained multipart body: text parts by name, file parts in arrival order
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid file part {}: {}", name, e)))?;
                    form.files.push(UploadedFile { field: name, file_name, bytes: bytes.to_vec() });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid field {}: {}", name, e)))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    /// Parse a text part holding JSON
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ApiError> {
        match self.text(name).map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| ApiError::bad_request(format!("{} is not valid JSON: {}", name, e))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> MultipartForm {
        let mut form = MultipartForm::default();
        form.fields.insert("teamMember".into(), r#"[{"name":"a"}]"#.into());
        form.fields.insert("link".into(), "not json".into());
        form.fields.insert("empty".into(), "  ".into());
        form.files.push(UploadedFile { field: "profileImage1".into(), file_name: "a.png".into(), bytes: vec![1] });
        form
    }

    #[test]
    fn parses_json_fields() {
        let members: Option<Vec<serde_json::Value>> = form().json("teamMember").unwrap();
        assert_eq!(members.unwrap()[0]["name"], "a");
    }

    #[test]
    fn invalid_json_is_bad_request() {
        let err = form().json::<Vec<String>>("link").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn blank_json_field_is_absent() {
        assert!(form().json::<Vec<String>>("empty").unwrap().is_none());
        assert!(form().json::<Vec<String>>("missing").unwrap().is_none());
    }

    #[test]
    fn finds_files_by_field() {
        let form = form();
        assert_eq!(form.file("profileImage1").unwrap().file_name, "a.png");
        assert!(form.file("projectDesign").is_none());
    }
}
