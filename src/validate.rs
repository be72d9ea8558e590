//! Presence, type and option-set checks for a raw submission.

use std::ops::RangeInclusive;

use crate::error::ValidationError;
use crate::types::{
    Categorical, Field, Fuel, RawFields, RawInput, RawValue, SellerType, Transmission,
};

pub const YEAR_RANGE: RangeInclusive<i32> = 1985..=2030;

/// Checks all six fields and reports every missing or invalid one at once.
pub fn validate(fields: &RawFields) -> Result<RawInput, ValidationError> {
    let mut missing = Vec::new();
    let mut invalid = Vec::new();

    // Checked in canonical order, so both lists come out ordered.
    let year = take(fields, Field::Year, parse_year, &mut missing, &mut invalid);
    let engine = take(fields, Field::Engine, parse_positive, &mut missing, &mut invalid);
    let max_power = take(fields, Field::MaxPower, parse_positive, &mut missing, &mut invalid);
    let fuel = take(fields, Field::Fuel, parse_option::<Fuel>, &mut missing, &mut invalid);
    let seller_type = take(
        fields,
        Field::SellerType,
        parse_option::<SellerType>,
        &mut missing,
        &mut invalid,
    );
    let transmission = take(
        fields,
        Field::Transmission,
        parse_option::<Transmission>,
        &mut missing,
        &mut invalid,
    );

    match (year, engine, max_power, fuel, seller_type, transmission) {
        (
            Some(year),
            Some(engine),
            Some(max_power),
            Some(fuel),
            Some(seller_type),
            Some(transmission),
        ) => Ok(RawInput {
            year,
            engine,
            max_power,
            fuel,
            seller_type,
            transmission,
        }),
        _ => Err(ValidationError { missing, invalid }),
    }
}

/// Empty text and absence both count as missing.
fn take<T>(
    fields: &RawFields,
    field: Field,
    parse: impl Fn(&RawValue) -> Option<T>,
    missing: &mut Vec<Field>,
    invalid: &mut Vec<Field>,
) -> Option<T> {
    match fields.get(field) {
        None => {
            missing.push(field);
            None
        }
        Some(v) if v.is_blank() => {
            missing.push(field);
            None
        }
        Some(v) => {
            let parsed = parse(v);
            if parsed.is_none() {
                invalid.push(field);
            }
            parsed
        }
    }
}

fn parse_year(v: &RawValue) -> Option<i32> {
    let n = v.as_number()?;
    if !n.is_finite() || n.fract() != 0.0 {
        return None;
    }
    let year = n as i32;
    YEAR_RANGE.contains(&year).then_some(year)
}

fn parse_positive(v: &RawValue) -> Option<f64> {
    v.as_number().filter(|n| n.is_finite() && *n > 0.0)
}

fn parse_option<T: Categorical>(v: &RawValue) -> Option<T> {
    v.as_text().and_then(T::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> RawFields {
        RawFields::new()
            .with("year", 2017)
            .with("engine", 1248.0)
            .with("max_power", 75.0)
            .with("fuel", "Diesel")
            .with("seller_type", "Individual")
            .with("transmission", "Manual")
    }

    #[test]
    fn accepts_complete_submission() {
        let input = validate(&complete()).unwrap();
        assert_eq!(input.year, 2017);
        assert_eq!(input.engine, 1248.0);
        assert_eq!(input.max_power, 75.0);
        assert_eq!(input.fuel, Fuel::Diesel);
        assert_eq!(input.seller_type, SellerType::Individual);
        assert_eq!(input.transmission, Transmission::Manual);
    }

    #[test]
    fn numeric_text_is_parsed() {
        let fields = complete().with("year", "2015").with("engine", " 998 ");
        let input = validate(&fields).unwrap();
        assert_eq!(input.year, 2015);
        assert_eq!(input.engine, 998.0);
    }

    #[test]
    fn fractional_or_out_of_range_year_is_invalid() {
        for year in [2017.5, 1984.0, 2031.0] {
            let err = validate(&complete().with("year", year)).unwrap_err();
            assert_eq!(err.invalid, vec![Field::Year], "year={year}");
            assert!(err.missing.is_empty());
        }
    }

    #[test]
    fn number_for_categorical_is_invalid() {
        let err = validate(&complete().with("fuel", 1.0)).unwrap_err();
        assert_eq!(err.invalid, vec![Field::Fuel]);
    }
}
