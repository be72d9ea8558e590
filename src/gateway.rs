//! Validation, encoding and inference behind a single `submit` call.

use anyhow::Context;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use crate::config::GatewayConfig;
use crate::encode::{encode_with, CategoryCodes, EncodingStrategy, FeatureVector};
use crate::error::{GatewayError, ModelLoadError, PredictionError};
use crate::format::PredictionResult;
use crate::model::{shared_cache, Model, ModelCache};
use crate::transform::InverseTransform;
use crate::types::RawFields;
use crate::validate::validate;

/// When the model artifact is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// At startup; a bad artifact stops initialization.
    #[default]
    Eager,
    /// On the first submission; a bad artifact fails every submission.
    Lazy,
}

/// `Ready` and `Failed` are terminal for the life of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// Runs the model once and applies the inverse target transform. Errors
/// and panics out of the model come back as `PredictionError`.
pub fn predict(
    model: &dyn Model,
    x: &FeatureVector,
    inverse: InverseTransform,
) -> Result<f64, PredictionError> {
    let raw = panic::catch_unwind(AssertUnwindSafe(|| model.predict(x)))
        .map_err(|payload| {
            PredictionError::new(format!("model panicked: {}", panic_text(payload.as_ref())))
        })?
        .map_err(|e| PredictionError::new(format!("{e:#}")))?;
    let y = inverse.apply(raw);
    if !y.is_finite() {
        return Err(PredictionError::new(format!(
            "model returned a non-finite price ({y} from raw output {raw})"
        )));
    }
    Ok(y)
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

pub struct Gateway {
    model_path: PathBuf,
    strategy: EncodingStrategy,
    inverse: InverseTransform,
    policy: LoadPolicy,
    decimals: usize,
    debug: bool,
    log_vectors: bool,
    codes: CategoryCodes,
    cache: Arc<ModelCache>,
    model: OnceLock<Result<Arc<dyn Model>, ModelLoadError>>,
    state: Mutex<LoadState>,
}

impl Gateway {
    /// Builds an unloaded gateway; nothing is read until `ensure_model`.
    pub fn new(cfg: &GatewayConfig, codes: CategoryCodes, cache: Arc<ModelCache>) -> Self {
        Self {
            model_path: cfg.model_path.clone(),
            strategy: cfg.encoding,
            inverse: cfg.inverse_transform,
            policy: cfg.load_policy,
            decimals: cfg.decimals(),
            debug: cfg.debug,
            log_vectors: cfg.log_vectors,
            codes,
            cache,
            model: OnceLock::new(),
            state: Mutex::new(LoadState::Unloaded),
        }
    }

    /// Like `new`, but loads right away under `LoadPolicy::Eager`.
    pub fn start(
        cfg: &GatewayConfig,
        codes: CategoryCodes,
        cache: Arc<ModelCache>,
    ) -> Result<Self, ModelLoadError> {
        let gateway = Self::new(cfg, codes, cache);
        if gateway.policy == LoadPolicy::Eager {
            gateway.ensure_model()?;
        }
        Ok(gateway)
    }

    /// Production wiring: codes file (if any), the process-wide model cache.
    pub fn from_config(cfg: &GatewayConfig) -> anyhow::Result<Self> {
        let codes = match &cfg.category_codes {
            Some(path) => CategoryCodes::load(path)?,
            None => CategoryCodes::default(),
        };
        let cache = shared_cache();
        tracing::info!(
            "gateway: encoding={} inverse={:?} policy={:?} model={}",
            cfg.encoding.as_str(),
            cfg.inverse_transform,
            cfg.load_policy,
            cfg.model_path.display()
        );
        Self::start(cfg, codes, cache).context("model failed to load at startup")
    }

    pub fn state(&self) -> LoadState {
        *self.state.lock()
    }

    pub fn strategy(&self) -> EncodingStrategy {
        self.strategy
    }

    /// The model, loading it on first use. Every caller after the first
    /// sees the same model or the same error.
    pub fn ensure_model(&self) -> Result<Arc<dyn Model>, ModelLoadError> {
        self.model
            .get_or_init(|| {
                *self.state.lock() = LoadState::Loading;
                let outcome = self
                    .cache
                    .load(&self.model_path)
                    .and_then(|model| self.check_compatible(model));
                *self.state.lock() = match &outcome {
                    Ok(_) => LoadState::Ready,
                    Err(_) => LoadState::Failed,
                };
                outcome
            })
            .clone()
    }

    // Column order, integer codes and target transform, when the artifact
    // records them.
    fn check_compatible(&self, model: Arc<dyn Model>) -> Result<Arc<dyn Model>, ModelLoadError> {
        if let Some(columns) = model.columns() {
            let expected = self.strategy.column_names();
            if !columns.iter().map(String::as_str).eq(expected.iter().copied()) {
                let err = ModelLoadError::new(
                    &self.model_path,
                    format!(
                        "model expects columns {:?} but {} encoding produces {:?}",
                        columns,
                        self.strategy.as_str(),
                        expected
                    ),
                );
                tracing::error!("{}", err);
                return Err(err);
            }
        }
        if self.strategy == EncodingStrategy::IntegerMap {
            if let Some(declared) = model.category_codes() {
                if *declared != self.codes {
                    let err = ModelLoadError::new(
                        &self.model_path,
                        format!(
                            "model was trained with category codes {:?}, gateway is configured with {:?}",
                            declared, self.codes
                        ),
                    );
                    tracing::error!("{}", err);
                    return Err(err);
                }
            }
        }
        if let Some(applied) = model.target() {
            if applied != InverseTransform::Identity && self.inverse != InverseTransform::Identity {
                let err = ModelLoadError::new(
                    &self.model_path,
                    format!(
                        "model already applies {:?} to its output, gateway would apply {:?} again",
                        applied, self.inverse
                    ),
                );
                tracing::error!("{}", err);
                return Err(err);
            }
        }
        Ok(model)
    }

    /// One form submission in, one displayable result out.
    pub fn submit(&self, fields: &RawFields) -> PredictionResult {
        match self.run(fields) {
            Ok(price) => PredictionResult::price(price, self.decimals),
            Err(err) => {
                match &err {
                    GatewayError::Validation(_) | GatewayError::Encoding(_) => {
                        tracing::warn!("rejected submission: {}", err)
                    }
                    GatewayError::ModelLoad(_) | GatewayError::Prediction(_) => {
                        tracing::error!("{}", err)
                    }
                }
                PredictionResult::from(&err)
            }
        }
    }

    pub fn run(&self, fields: &RawFields) -> Result<f64, GatewayError> {
        let input = validate(fields)?;
        let x = encode_with(&input, self.strategy, &self.codes)?;
        if self.log_vectors {
            tracing::info!("encoded {:?} = {}", self.strategy.column_names(), x);
        }
        let model = self.ensure_model()?;
        let price = predict(model.as_ref(), &x, self.inverse).map_err(|e| {
            if self.debug {
                e.with_vector(&x)
            } else {
                e
            }
        })?;
        Ok(price)
    }
}
