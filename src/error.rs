use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::Field;

/// Missing and malformed fields, each in canonical field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_fields(.missing, .invalid))]
pub struct ValidationError {
    pub missing: Vec<Field>,
    pub invalid: Vec<Field>,
}

fn describe_fields(missing: &[Field], invalid: &[Field]) -> String {
    let join = |fields: &[Field]| {
        fields
            .iter()
            .map(Field::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut parts = Vec::with_capacity(2);
    if !missing.is_empty() {
        parts.push(format!("Please fill: {}", join(missing)));
    }
    if !invalid.is_empty() {
        parts.push(format!("Invalid value for: {}", join(invalid)));
    }
    parts.join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {field} value '{value}'")]
pub struct EncodingError {
    pub field: Field,
    pub value: String,
}

impl EncodingError {
    pub fn new(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Cloneable so every caller racing a failed load observes the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} ({})", .path.display())]
pub struct ModelLoadError {
    pub path: PathBuf,
    pub reason: String,
}

impl ModelLoadError {
    pub fn new(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{cause}{}", vector_suffix(.vector))]
pub struct PredictionError {
    pub cause: String,
    /// Encoded input, attached only in debug mode.
    pub vector: Option<String>,
}

fn vector_suffix(vector: &Option<String>) -> String {
    match vector {
        Some(v) => format!(" [vector: {v}]"),
        None => String::new(),
    }
}

impl PredictionError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            vector: None,
        }
    }

    pub fn with_vector(mut self, vector: impl ToString) -> Self {
        self.vector = Some(vector.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Encoding,
    ModelLoad,
    Prediction,
}

/// Everything `submit` can fail with. The `Display` output is the
/// user-facing message.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Could not load model: {0}")]
    ModelLoad(#[from] ModelLoadError),

    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Validation(_) => ErrorKind::Validation,
            GatewayError::Encoding(_) => ErrorKind::Encoding,
            GatewayError::ModelLoad(_) => ErrorKind::ModelLoad,
            GatewayError::Prediction(_) => ErrorKind::Prediction,
        }
    }
}
