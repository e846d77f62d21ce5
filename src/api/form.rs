//! Multipart form reading shared by the product and farmer endpoints

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::{DomainError, ImageUpload};

pub const FILE_FIELD: &str = "file";

/// Text fields plus at most one uploaded file
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    file: Option<ImageUpload>,
}

fn multipart_error(e: MultipartError) -> DomainError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DomainError::PayloadTooLarge("Request body too large".to_string())
    } else {
        DomainError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
    }
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, DomainError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == FILE_FIELD {
                let filename = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was picked
                if bytes.is_empty() && filename.as_deref().map_or(true, str::is_empty) {
                    continue;
                }
                form.file = Some(ImageUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Trimmed value, `None` when absent or blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &str) -> Result<String, DomainError> {
        self.text(name)
            .map(str::to_owned)
            .ok_or_else(|| DomainError::Validation(format!("{} is required", name)))
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, DomainError> {
        self.text(name)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|_| DomainError::Validation(format!("{} has an invalid value", name)))
            })
            .transpose()
    }

    pub fn parse_required<T: FromStr>(&self, name: &str) -> Result<T, DomainError> {
        self.parse(name)?
            .ok_or_else(|| DomainError::Validation(format!("{} is required", name)))
    }

    /// Accepts the usual HTML checkbox spellings
    pub fn flag(&self, name: &str) -> Result<Option<bool>, DomainError> {
        match self.text(name).map(str::to_ascii_lowercase).as_deref() {
            None => Ok(None),
            Some("true" | "1" | "on" | "yes") => Ok(Some(true)),
            Some("false" | "0" | "off" | "no") => Ok(Some(false)),
            Some(_) => Err(DomainError::Validation(format!(
                "{} must be true or false",
                name
            ))),
        }
    }

    pub fn take_file(&mut self) -> Option<ImageUpload> {
        self.file.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let form = form(&[("name", "  "), ("unit", " kg ")]);
        assert_eq!(form.text("name"), None);
        assert_eq!(form.text("unit"), Some("kg"));
        assert!(matches!(form.required("name"), Err(DomainError::Validation(_))));
    }

    #[test]
    fn numbers_and_flags_parse() {
        let form = form(&[("price", "2.5"), ("id", "abc"), ("is_organic", "On")]);
        assert_eq!(form.parse::<f64>("price").unwrap(), Some(2.5));
        assert!(form.parse::<i32>("id").is_err());
        assert_eq!(form.parse::<i32>("farmer_id").unwrap(), None);
        assert_eq!(form.flag("is_organic").unwrap(), Some(true));
    }
}
