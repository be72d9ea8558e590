use serde::Deserialize;
use std::{collections::HashMap, fmt};

/// The six user-facing inputs, in canonical (form) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Year,
    Engine,
    MaxPower,
    Fuel,
    SellerType,
    Transmission,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Year,
        Field::Engine,
        Field::MaxPower,
        Field::Fuel,
        Field::SellerType,
        Field::Transmission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Year => "year",
            Field::Engine => "engine",
            Field::MaxPower => "max_power",
            Field::Fuel => "fuel",
            Field::SellerType => "seller_type",
            Field::Transmission => "transmission",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed option set for one categorical field.
pub trait Categorical: Sized + Copy + 'static {
    const FIELD: Field;
    const OPTIONS: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Exact token match; no case folding.
    fn parse(raw: &str) -> Option<Self> {
        Self::OPTIONS.iter().copied().find(|o| o.as_str() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fuel {
    Petrol,
    Diesel,
}

impl Categorical for Fuel {
    const FIELD: Field = Field::Fuel;
    const OPTIONS: &'static [Self] = &[Fuel::Petrol, Fuel::Diesel];

    fn as_str(&self) -> &'static str {
        match self {
            Fuel::Petrol => "Petrol",
            Fuel::Diesel => "Diesel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SellerType {
    Individual,
    Dealer,
    TrustmarkDealer,
}

impl Categorical for SellerType {
    const FIELD: Field = Field::SellerType;
    const OPTIONS: &'static [Self] = &[
        SellerType::Individual,
        SellerType::Dealer,
        SellerType::TrustmarkDealer,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            SellerType::Individual => "Individual",
            SellerType::Dealer => "Dealer",
            SellerType::TrustmarkDealer => "Trustmark Dealer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transmission {
    Manual,
    Automatic,
}

impl Categorical for Transmission {
    const FIELD: Field = Field::Transmission;
    const OPTIONS: &'static [Self] = &[Transmission::Manual, Transmission::Automatic];

    fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manual => "Manual",
            Transmission::Automatic => "Automatic",
        }
    }
}

/// A single submitted value. Numeric inputs usually arrive as JSON numbers,
/// dropdowns as strings, but either may be sent as text. Anything else
/// (booleans, arrays, objects) is kept so validation can name the field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, RawValue::Text(s) if s.trim().is_empty())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse().ok(),
            RawValue::Other(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            RawValue::Number(_) | RawValue::Other(_) => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

/// Unvalidated form submission: field name -> value (null means absent).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RawFields(HashMap<String, Option<RawValue>>);

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<RawValue>) {
        self.0.insert(name.to_string(), Some(value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.0.remove(name);
    }

    pub fn get(&self, field: Field) -> Option<&RawValue> {
        self.0.get(field.as_str()).and_then(Option::as_ref)
    }
}

impl From<HashMap<String, Option<RawValue>>> for RawFields {
    fn from(map: HashMap<String, Option<RawValue>>) -> Self {
        RawFields(map)
    }
}

/// A fully validated submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInput {
    pub year: i32,
    pub engine: f64,    // cc
    pub max_power: f64, // bhp
    pub fuel: Fuel,
    pub seller_type: SellerType,
    pub transmission: Transmission,
}
