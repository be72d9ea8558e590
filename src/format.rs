use serde::Serialize;
use std::fmt;

use crate::error::{ErrorKind, GatewayError};

/// Fixed decimals with comma thousands separators: `450000.0, 2` -> `450,000.00`.
pub fn format_price(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    // No "-0" after rounding.
    if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// What the presentation layer shows for one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResult {
    Price { value: f64, text: String },
    Error { kind: ErrorKind, message: String },
}

impl PredictionResult {
    pub fn price(value: f64, decimals: usize) -> Self {
        PredictionResult::Price {
            value,
            text: format!("Predicted price: {}", format_price(value, decimals)),
        }
    }

    pub fn is_price(&self) -> bool {
        matches!(self, PredictionResult::Price { .. })
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            PredictionResult::Price { .. } => None,
            PredictionResult::Error { kind, .. } => Some(*kind),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PredictionResult::Price { text, .. } => text,
            PredictionResult::Error { message, .. } => message,
        }
    }
}

impl From<&GatewayError> for PredictionResult {
    fn from(err: &GatewayError) -> Self {
        PredictionResult::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
