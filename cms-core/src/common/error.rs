use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records "required" when the value is blank and "too long" past `max_len` chars.
    pub fn require(&mut self, field: &str, value: &str, max_len: Option<usize>) {
        if value.trim().is_empty() {
            self.add(field, "Este campo es requerido.");
        } else if let Some(max) = max_len {
            if value.chars().count() > max {
                self.add(
                    field,
                    format!("Asegúrese de que este campo no tenga más de {max} caracteres."),
                );
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{kind} with id {id} not found")]
    NotFound { kind: String, id: i64 },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[cfg(feature = "db")]
    #[error("Database error: {message}")]
    Database { message: String },
}

impl From<ValidationErrors> for CmsError {
    fn from(errors: ValidationErrors) -> Self {
        CmsError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, CmsError>;
