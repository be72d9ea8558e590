#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::{bail, Result};
use car_price_gateway::{
    ArtifactReader, CategoryCodes, FeatureVector, GatewayConfig, InverseTransform, Model,
    RawFields,
};
use parking_lot::Mutex;

/// The reference submission used throughout the tests.
pub fn sample_fields() -> RawFields {
    RawFields::new()
        .with("year", 2017)
        .with("engine", 1248.0)
        .with("max_power", 75.0)
        .with("fuel", "Diesel")
        .with("seller_type", "Individual")
        .with("transmission", "Manual")
}

/// Returns a constant and remembers every vector it was given.
pub struct StubModel {
    value: f64,
    pub seen: Mutex<Vec<FeatureVector>>,
    columns: Option<Vec<String>>,
    codes: Option<CategoryCodes>,
    target: Option<InverseTransform>,
}

impl StubModel {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            seen: Mutex::new(Vec::new()),
            columns: None,
            codes: None,
            target: None,
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_codes(mut self, codes: CategoryCodes) -> Self {
        self.codes = Some(codes);
        self
    }

    pub fn with_target(mut self, target: InverseTransform) -> Self {
        self.target = Some(target);
        self
    }
}

impl Model for StubModel {
    fn predict(&self, x: &FeatureVector) -> Result<f64> {
        self.seen.lock().push(x.clone());
        Ok(self.value)
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn category_codes(&self) -> Option<&CategoryCodes> {
        self.codes.as_ref()
    }

    fn target(&self) -> Option<InverseTransform> {
        self.target
    }
}

pub struct FailingModel(pub &'static str);

impl Model for FailingModel {
    fn predict(&self, _x: &FeatureVector) -> Result<f64> {
        bail!("{}", self.0)
    }
}

pub struct PanickingModel;

impl Model for PanickingModel {
    fn predict(&self, _x: &FeatureVector) -> Result<f64> {
        panic!("index out of bounds in tree 3")
    }
}

/// Hands out one prepared model and counts how often it was asked to.
pub struct CountingReader {
    model: Option<Arc<dyn Model>>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl CountingReader {
    pub fn serving(model: Arc<dyn Model>) -> Self {
        Self {
            model: Some(model),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every read fails, as with a missing artifact.
    pub fn missing() -> Self {
        Self {
            model: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArtifactReader for CountingReader {
    fn read(&self, path: &Path) -> Result<Arc<dyn Model>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        match &self.model {
            Some(m) => Ok(m.clone()),
            None => bail!("model artifact not found at {}", path.display()),
        }
    }
}

pub fn config(model_path: impl Into<PathBuf>) -> GatewayConfig {
    GatewayConfig {
        model_path: model_path.into(),
        ..GatewayConfig::default()
    }
}

pub fn demo_model_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models/model_pipeline.json")
}
