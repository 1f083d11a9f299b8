//! Submitted forms and their field-level errors
//!
//! Forms never fail a request. Invalid input comes back as `FormErrors`
//! (`{field: [messages]}`) and the view re-renders the form context.

use crate::error::{AppError, Result};
use crate::models::Group;
use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentDisposition};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Upper bound for a single multipart field
const MAX_FIELD_BYTES: usize = 10 * 1024 * 1024;

/// Field name -> messages
pub type FormErrors = BTreeMap<String, Vec<String>>;

/// Outcome of a form submission
#[derive(Debug)]
pub enum Submission<T> {
    Accepted(T),
    Rejected(FormErrors),
}

/// Flatten validator errors into `FormErrors`.
pub fn collect_errors(errors: &ValidationErrors) -> FormErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|err| {
                    err.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

pub fn add_error(errors: &mut FormErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// An uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content: Bytes,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// Raw group choice; empty means no group
    pub group: Option<String>,
    pub image: Option<Upload>,
}

impl PostForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group = Some(group_id.to_string());
        self
    }

    pub fn with_image(mut self, file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.image = Some(Upload {
            file_name: file_name.into(),
            content: content.into(),
        });
        self
    }

    /// Read `text`, `group` and `image` parts from a multipart body. Unknown
    /// parts are drained and ignored.
    pub async fn from_multipart(mut payload: Multipart) -> Result<Self> {
        let mut form = PostForm::default();

        while let Some(item) = payload.next().await {
            let mut field =
                item.map_err(|e| AppError::Validation(format!("malformed multipart body: {}", e)))?;

            let disposition = field
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|value| ContentDisposition::from_raw(value).ok());
            let name = disposition
                .as_ref()
                .and_then(|cd| cd.get_name())
                .unwrap_or_default()
                .to_string();
            let file_name = disposition
                .as_ref()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);

            let mut buf = BytesMut::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::Validation(format!("error reading field: {}", e)))?;
                if buf.len() + chunk.len() > MAX_FIELD_BYTES {
                    return Err(AppError::Validation(format!(
                        "field {} exceeds {} bytes",
                        name, MAX_FIELD_BYTES
                    )));
                }
                buf.extend_from_slice(&chunk);
            }

            match name.as_str() {
                "text" => form.text = String::from_utf8_lossy(&buf).into_owned(),
                "group" => form.group = Some(String::from_utf8_lossy(&buf).into_owned()),
                "image" => {
                    // Browsers send an empty part when no file was chosen
                    if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                        if !buf.is_empty() {
                            form.image = Some(Upload {
                                file_name,
                                content: buf.freeze(),
                            });
                        }
                    }
                }
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Trim the text and check required fields. The group choice is only
    /// parsed here; whether it exists is up to the caller.
    pub fn clean(&mut self) -> std::result::Result<Option<i64>, FormErrors> {
        self.text = self.text.trim().to_string();

        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => collect_errors(&e),
        };

        let group = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    add_error(&mut errors, "group", INVALID_CHOICE);
                    None
                }
            },
        };

        if errors.is_empty() {
            Ok(group)
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn clean(&mut self) -> std::result::Result<(), FormErrors> {
        self.text = self.text.trim().to_string();
        self.validate().map_err(|e| collect_errors(&e))
    }
}

/// Description of one form field, as a template would see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: i64,
    pub label: String,
}

pub fn post_form_fields(groups: &[Group]) -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            name: "text",
            kind: "char",
            label: "Enter the post text",
            help_text: "Post text",
            required: true,
            choices: None,
        },
        FieldSpec {
            name: "group",
            kind: "choice",
            label: "Choose a group",
            help_text: "Post group",
            required: false,
            choices: Some(
                groups
                    .iter()
                    .map(|g| Choice {
                        value: g.id,
                        label: g.to_string(),
                    })
                    .collect(),
            ),
        },
        FieldSpec {
            name: "image",
            kind: "image",
            label: "Image",
            help_text: "",
            required: false,
            choices: None,
        },
    ]
}

pub fn comment_form_fields() -> Vec<FieldSpec> {
    vec![FieldSpec {
        name: "text",
        kind: "char",
        label: "Comment",
        help_text: "Comment text",
        required: true,
        choices: None,
    }]
}
