//! Raw input -> the ordered feature vector a model was fit on.
//!
//! Two layouts exist. `PassThrough` keeps categoricals as string tokens for
//! pipelines that one-hot internally; `IntegerMap` swaps them for integer
//! codes and moves the categoricals ahead of the engine/power columns.

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, fs, path::Path};

use crate::error::EncodingError;
use crate::types::{Categorical, Field, RawInput};

pub const FEATURE_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingStrategy {
    #[default]
    PassThrough,
    IntegerMap,
}

impl EncodingStrategy {
    /// Column order the model must have been fit on.
    pub fn columns(&self) -> [Field; FEATURE_COUNT] {
        match self {
            EncodingStrategy::PassThrough => [
                Field::Year,
                Field::Engine,
                Field::MaxPower,
                Field::Fuel,
                Field::SellerType,
                Field::Transmission,
            ],
            EncodingStrategy::IntegerMap => [
                Field::Year,
                Field::Fuel,
                Field::SellerType,
                Field::Transmission,
                Field::Engine,
                Field::MaxPower,
            ],
        }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(Field::as_str).collect()
    }

    /// Decimal places used when no explicit setting is configured.
    pub fn default_decimals(&self) -> usize {
        match self {
            EncodingStrategy::PassThrough => 2,
            EncodingStrategy::IntegerMap => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingStrategy::PassThrough => "pass_through",
            EncodingStrategy::IntegerMap => "integer_map",
        }
    }
}

/// Integer codes for `IntegerMap`. This is the one table shared with
/// training; a model artifact may declare the codes it was fit with and the
/// gateway refuses to serve it when they differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCodes {
    pub fuel: BTreeMap<String, i64>,
    pub seller_type: BTreeMap<String, i64>,
    pub transmission: BTreeMap<String, i64>,
}

impl Default for CategoryCodes {
    fn default() -> Self {
        fn table(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
            entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        }
        Self {
            fuel: table(&[("Petrol", 1), ("Diesel", 2)]),
            seller_type: table(&[("Individual", 1), ("Dealer", 2), ("Trustmark Dealer", 3)]),
            transmission: table(&[("Manual", 1), ("Automatic", 2)]),
        }
    }
}

impl CategoryCodes {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read category codes at {}", path.display()))?;
        let codes: CategoryCodes = serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse category codes {}", path.display()))?;
        codes.check()?;
        Ok(codes)
    }

    /// Every table is non-empty and no two categories share a code.
    pub fn check(&self) -> Result<()> {
        for (field, table) in [
            (Field::Fuel, &self.fuel),
            (Field::SellerType, &self.seller_type),
            (Field::Transmission, &self.transmission),
        ] {
            ensure!(!table.is_empty(), "{field}: empty code table");
            let mut seen: BTreeMap<i64, &str> = BTreeMap::new();
            for (name, code) in table {
                if let Some(prev) = seen.insert(*code, name.as_str()) {
                    bail!("{field}: '{prev}' and '{name}' share code {code}");
                }
            }
        }
        Ok(())
    }

    pub fn table(&self, field: Field) -> Option<&BTreeMap<String, i64>> {
        match field {
            Field::Fuel => Some(&self.fuel),
            Field::SellerType => Some(&self.seller_type),
            Field::Transmission => Some(&self.transmission),
            Field::Year | Field::Engine | Field::MaxPower => None,
        }
    }

    pub fn code<T: Categorical>(&self, value: T) -> Result<i64, EncodingError> {
        self.table(T::FIELD)
            .and_then(|t| t.get(value.as_str()))
            .copied()
            .ok_or_else(|| EncodingError::new(T::FIELD, value.as_str()))
    }
}

/// One model input scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Int(i64),
    Float(f64),
    Category(String),
}

impl Feature {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Feature::Int(i) => Some(*i as f64),
            Feature::Float(x) => Some(*x),
            Feature::Category(_) => None,
        }
    }

    /// Token form used by one-hot steps; floats have none.
    pub fn token(&self) -> Option<String> {
        match self {
            Feature::Category(s) => Some(s.clone()),
            Feature::Int(i) => Some(i.to_string()),
            Feature::Float(_) => None,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Int(i) => write!(f, "{i}"),
            Feature::Float(x) => write!(f, "{x:?}"),
            Feature::Category(s) => write!(f, "{s:?}"),
        }
    }
}

/// Immutable, always `FEATURE_COUNT` long, ordered per its strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    strategy: EncodingStrategy,
    values: Vec<Feature>,
}

impl FeatureVector {
    pub fn strategy(&self) -> EncodingStrategy {
        self.strategy
    }

    pub fn columns(&self) -> [Field; FEATURE_COUNT] {
        self.strategy.columns()
    }

    pub fn values(&self) -> &[Feature] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<&Feature> {
        let idx = self.columns().iter().position(|c| *c == field)?;
        self.values.get(idx)
    }

    /// Dense numeric form for tensor models; fails on string tokens.
    pub fn to_f32(&self) -> Result<Vec<f32>> {
        self.columns()
            .iter()
            .zip(&self.values)
            .map(|(col, v)| {
                v.as_f64().map(|x| x as f32).with_context(|| {
                    format!("feature '{col}' is the token {v}; numeric models need integer_map encoding")
                })
            })
            .collect()
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")
    }
}

/// Encodes with the built-in code table.
pub fn encode(input: &RawInput, strategy: EncodingStrategy) -> Result<FeatureVector, EncodingError> {
    encode_with(input, strategy, &CategoryCodes::default())
}

pub fn encode_with(
    input: &RawInput,
    strategy: EncodingStrategy,
    codes: &CategoryCodes,
) -> Result<FeatureVector, EncodingError> {
    let values = match strategy {
        EncodingStrategy::PassThrough => vec![
            Feature::Float(input.year as f64),
            Feature::Float(input.engine),
            Feature::Float(input.max_power),
            Feature::Category(input.fuel.as_str().to_string()),
            Feature::Category(input.seller_type.as_str().to_string()),
            Feature::Category(input.transmission.as_str().to_string()),
        ],
        EncodingStrategy::IntegerMap => vec![
            Feature::Int(input.year as i64),
            Feature::Int(codes.code(input.fuel)?),
            Feature::Int(codes.code(input.seller_type)?),
            Feature::Int(codes.code(input.transmission)?),
            Feature::Float(input.engine),
            Feature::Float(input.max_power),
        ],
    };
    Ok(FeatureVector { strategy, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Fuel, SellerType, Transmission};

    fn sample() -> RawInput {
        RawInput {
            year: 2017,
            engine: 1248.0,
            max_power: 75.0,
            fuel: Fuel::Diesel,
            seller_type: SellerType::Individual,
            transmission: Transmission::Manual,
        }
    }

    #[test]
    fn get_follows_strategy_order() {
        let x = encode(&sample(), EncodingStrategy::IntegerMap).unwrap();
        assert_eq!(x.get(Field::Engine), Some(&Feature::Float(1248.0)));
        assert_eq!(x.get(Field::Fuel), Some(&Feature::Int(2)));
        assert_eq!(x.values()[4], Feature::Float(1248.0));
    }

    #[test]
    fn display_lists_values_in_column_order() {
        let x = encode(&sample(), EncodingStrategy::PassThrough).unwrap();
        assert_eq!(
            x.to_string(),
            r#"[2017.0, 1248.0, 75.0, "Diesel", "Individual", "Manual"]"#
        );
    }

    #[test]
    fn to_f32_rejects_tokens() {
        let tokens = encode(&sample(), EncodingStrategy::PassThrough).unwrap();
        assert!(tokens.to_f32().is_err());

        let codes = encode(&sample(), EncodingStrategy::IntegerMap).unwrap();
        assert_eq!(codes.to_f32().unwrap(), vec![2017.0, 2.0, 1.0, 1.0, 1248.0, 75.0]);
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let mut codes = CategoryCodes::default();
        codes.fuel.insert("Diesel".into(), 1);
        let err = codes.check().unwrap_err();
        assert!(err.to_string().contains("share code 1"), "{err}");
    }
}
