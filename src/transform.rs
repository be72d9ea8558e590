use serde::{Deserialize, Serialize};

/// Undoes the transform applied to the target at training time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InverseTransform {
    #[default]
    Identity,
    /// Model was fit on ln(price).
    Exp,
}

impl InverseTransform {
    pub fn apply(&self, y: f64) -> f64 {
        match self {
            InverseTransform::Identity => y,
            InverseTransform::Exp => y.exp(),
        }
    }

    /// The training-side transform this one inverts.
    pub fn forward(&self, y: f64) -> f64 {
        match self {
            InverseTransform::Identity => y,
            InverseTransform::Exp => y.ln(),
        }
    }
}
