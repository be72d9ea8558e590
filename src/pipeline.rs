//! Regression pipelines serialized as JSON.
//!
//! An artifact bundles a per-column preprocessing stage (numeric scaling or
//! one-hot over a fixed category list), a regressor (linear, or a forest of
//! binary regression trees averaged together) and an optional log target,
//! in which case the pipeline exponentiates its own output.
//!
//! ```json
//! {
//!   "name": "rf-v3",
//!   "columns": ["year", "engine", "max_power", "fuel", "seller_type", "transmission"],
//!   "preprocess": [
//!     {"kind": "numeric"}, {"kind": "numeric"}, {"kind": "numeric"},
//!     {"kind": "one_hot", "categories": ["Diesel", "Petrol"]},
//!     {"kind": "one_hot", "categories": ["Dealer", "Individual", "Trustmark Dealer"]},
//!     {"kind": "one_hot", "categories": ["Automatic", "Manual"]}
//!   ],
//!   "regressor": {"kind": "forest", "trees": [{"nodes": [
//!     {"feature": 0, "threshold": 2015.5, "left": 1, "right": 2},
//!     {"value": 12.6}, {"value": 13.4}
//!   ]}]},
//!   "target": "log"
//! }
//! ```

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::encode::{CategoryCodes, FeatureVector};
use crate::model::Model;
use crate::transform::InverseTransform;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStep {
    /// (x - mean) / scale; defaults make it a pass-through.
    Numeric {
        #[serde(default)]
        mean: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    /// Errors on a token outside `categories`.
    OneHot { categories: Vec<String> },
}

fn unit_scale() -> f64 {
    1.0
}

impl ColumnStep {
    fn width(&self) -> usize {
        match self {
            ColumnStep::Numeric { .. } => 1,
            ColumnStep::OneHot { categories } => categories.len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    Forest {
        trees: Vec<Tree>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    fn check(&self, width: usize) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                ensure!(*feature < width, "node {i}: feature {feature} out of range (width {width})");
                ensure!(
                    *left < self.nodes.len() && *right < self.nodes.len(),
                    "node {i}: child index out of range"
                );
            }
        }
        Ok(())
    }

    /// Left branch when x[feature] <= threshold.
    fn evaluate(&self, row: &[f64]) -> Result<f64> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match &self.nodes[idx] {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
        bail!("tree walk did not reach a leaf (cycle in nodes)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTransform {
    #[default]
    Identity,
    Log,
}

impl TargetTransform {
    pub fn inverse(&self) -> InverseTransform {
        match self {
            TargetTransform::Identity => InverseTransform::Identity,
            TargetTransform::Log => InverseTransform::Exp,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PipelineJson {
    name: Option<String>,
    columns: Vec<String>,
    preprocess: Vec<ColumnStep>,
    regressor: Regressor,
    #[serde(default)]
    target: TargetTransform,
    category_codes: Option<CategoryCodes>,
}

pub struct PipelineModel {
    name: String,
    columns: Vec<String>,
    steps: Vec<ColumnStep>,
    width: usize,
    regressor: Regressor,
    target: TargetTransform,
    codes: Option<CategoryCodes>,
}

impl PipelineModel {
    pub fn from_file(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline at {}", path.display()))?;
        let mut model = Self::from_json(&txt)
            .with_context(|| format!("failed to parse pipeline {}", path.display()))?;
        if model.name.is_empty() {
            model.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(model)
    }

    pub fn from_json(txt: &str) -> Result<Self> {
        let raw: PipelineJson = serde_json::from_str(txt)?;
        ensure!(
            raw.preprocess.len() == raw.columns.len(),
            "preprocess has {} steps for {} columns",
            raw.preprocess.len(),
            raw.columns.len()
        );
        for (column, step) in raw.columns.iter().zip(&raw.preprocess) {
            match step {
                ColumnStep::Numeric { scale, .. } => ensure!(
                    scale.is_finite() && *scale != 0.0,
                    "column '{column}': scale must be finite and non-zero"
                ),
                ColumnStep::OneHot { categories } => {
                    ensure!(!categories.is_empty(), "column '{column}': no categories")
                }
            }
        }
        let width = raw.preprocess.iter().map(ColumnStep::width).sum();
        match &raw.regressor {
            Regressor::Linear { coefficients, .. } => ensure!(
                coefficients.len() == width,
                "linear regressor has {} coefficients for {} encoded features",
                coefficients.len(),
                width
            ),
            Regressor::Forest { trees } => {
                ensure!(!trees.is_empty(), "forest has no trees");
                for (i, tree) in trees.iter().enumerate() {
                    tree.check(width).with_context(|| format!("tree {i}"))?;
                }
            }
        }
        if let Some(codes) = &raw.category_codes {
            codes.check()?;
        }

        Ok(Self {
            name: raw.name.unwrap_or_default(),
            columns: raw.columns,
            steps: raw.preprocess,
            width,
            regressor: raw.regressor,
            target: raw.target,
            codes: raw.category_codes,
        })
    }

    fn transform(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        ensure!(
            x.len() == self.columns.len(),
            "X has {} features, but the pipeline is expecting {} features as input",
            x.len(),
            self.columns.len()
        );
        let mut row = Vec::with_capacity(self.width);
        for ((column, step), feature) in self.columns.iter().zip(&self.steps).zip(x.values()) {
            match step {
                ColumnStep::Numeric { mean, scale } => {
                    let v = feature
                        .as_f64()
                        .with_context(|| format!("column '{column}' expects a number, got {feature}"))?;
                    row.push((v - mean) / scale);
                }
                ColumnStep::OneHot { categories } => {
                    let token = feature
                        .token()
                        .with_context(|| format!("column '{column}' expects a category, got {feature}"))?;
                    let hit = categories.iter().position(|c| *c == token).with_context(|| {
                        format!("Found unknown categories ['{token}'] in column '{column}' during transform")
                    })?;
                    row.extend((0..categories.len()).map(|i| if i == hit { 1.0 } else { 0.0 }));
                }
            }
        }
        Ok(row)
    }

    fn regress(&self, row: &[f64]) -> Result<f64> {
        match &self.regressor {
            Regressor::Linear {
                coefficients,
                intercept,
            } => Ok(intercept + coefficients.iter().zip(row).map(|(c, v)| c * v).sum::<f64>()),
            Regressor::Forest { trees } => {
                let mut total = 0.0;
                for tree in trees {
                    total += tree.evaluate(row)?;
                }
                Ok(total / trees.len() as f64)
            }
        }
    }
}

impl Model for PipelineModel {
    fn predict(&self, x: &FeatureVector) -> Result<f64> {
        let row = self.transform(x)?;
        let y = self.regress(&row)?;
        Ok(self.target.inverse().apply(y))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> Option<&[String]> {
        Some(&self.columns)
    }

    fn category_codes(&self) -> Option<&CategoryCodes> {
        self.codes.as_ref()
    }

    fn target(&self) -> Option<InverseTransform> {
        Some(self.target.inverse())
    }
}
