use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

use crate::encode::EncodingStrategy;
use crate::gateway::LoadPolicy;
use crate::transform::InverseTransform;

/// Gateway settings: an optional JSON file (`CARPRICE_CONFIG`) overridden
/// by individual environment variables.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub model_path: PathBuf,
    pub encoding: EncodingStrategy,
    pub inverse_transform: InverseTransform,
    pub load_policy: LoadPolicy,
    /// Decimal places in the price; defaults per encoding.
    pub decimals: Option<usize>,
    /// JSON file with the integer codes used by `integer_map`.
    pub category_codes: Option<PathBuf>,
    /// Attach the encoded vector to prediction error messages.
    pub debug: bool,
    /// Log every encoded vector at info level.
    pub log_vectors: bool,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/model_pipeline.json"),
            encoding: EncodingStrategy::PassThrough,
            inverse_transform: InverseTransform::Identity,
            load_policy: LoadPolicy::Eager,
            decimals: None,
            category_codes: None,
            debug: false,
            log_vectors: false,
            port: 8000,
        }
    }
}

impl GatewayConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = match env::var("CARPRICE_CONFIG") {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("MODEL_PATH") {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("ENCODING") {
            self.encoding = parse_variant("ENCODING", &v)?;
        }
        if let Some(v) = lookup("INVERSE_TRANSFORM") {
            self.inverse_transform = parse_variant("INVERSE_TRANSFORM", &v)?;
        }
        if let Some(v) = lookup("LOAD_POLICY") {
            self.load_policy = parse_variant("LOAD_POLICY", &v)?;
        }
        if let Some(v) = lookup("CATEGORY_CODES") {
            self.category_codes = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PORT") {
            self.port = v.trim().parse().with_context(|| format!("invalid PORT '{v}'"))?;
        }
        if let Some(v) = lookup("DEBUG") {
            self.debug = parse_flag("DEBUG", &v)?;
        }
        if let Some(v) = lookup("LOG_VECTORS") {
            self.log_vectors = parse_flag("LOG_VECTORS", &v)?;
        }
        Ok(())
    }

    pub fn decimals(&self) -> usize {
        self.decimals.unwrap_or_else(|| self.encoding.default_decimals())
    }
}

// Reuses the serde names so env values match the JSON file spelling.
fn parse_variant<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    let value = serde_json::Value::String(raw.trim().to_ascii_lowercase());
    serde_json::from_value(value).with_context(|| format!("invalid {key} value '{raw}'"))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => bail!("invalid {key} value '{raw}', expected true/false or 1/0"),
    }
}
