/// Integration tests for field validation
///
/// Run with: cargo test --test validation_tests -- --nocapture

mod common;

use car_price_gateway::{validate, Field, RawFields};
use common::sample_fields;

#[test]
fn test_every_missing_subset_is_reported_exactly() {
    println!("\n=== Test: Missing Field Subsets ===");

    // 2^6 subsets; odd masks blank the field, even masks drop it entirely.
    for mask in 0u32..64 {
        let mut fields = sample_fields();
        let mut expected = Vec::new();
        for (bit, field) in Field::ALL.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                if bit % 2 == 0 {
                    fields.remove(field.as_str());
                } else {
                    fields.insert(field.as_str(), "   ");
                }
                expected.push(*field);
            }
        }

        match validate(&fields) {
            Ok(_) => assert!(expected.is_empty(), "mask {mask:06b} validated"),
            Err(err) => {
                assert_eq!(err.missing, expected, "mask {mask:06b}");
                assert!(err.invalid.is_empty(), "mask {mask:06b}");
            }
        }
    }

    println!("✓ All 64 subsets reported exactly");
}

#[test]
fn test_null_counts_as_missing() {
    println!("\n=== Test: Null Values ===");
    let fields: RawFields = serde_json::from_str(
        r#"{"year": null, "engine": 1248, "max_power": 75,
            "fuel": "Diesel", "seller_type": null, "transmission": "Manual"}"#,
    )
    .expect("Should deserialize");

    let err = validate(&fields).unwrap_err();
    assert_eq!(err.missing, vec![Field::Year, Field::SellerType]);
    assert_eq!(err.to_string(), "Please fill: year, seller_type");
    println!("✓ {}", err);
}

#[test]
fn test_out_of_enum_values_are_rejected() {
    println!("\n=== Test: Out-of-enum Categoricals ===");
    let fields = sample_fields()
        .with("fuel", "Hybrid")
        .with("seller_type", "dealer")
        .with("transmission", "CVT");

    let err = validate(&fields).unwrap_err();
    assert!(err.missing.is_empty());
    assert_eq!(
        err.invalid,
        vec![Field::Fuel, Field::SellerType, Field::Transmission]
    );
    println!("✓ {}", err);
}

#[test]
fn test_mixed_missing_and_invalid_in_one_pass() {
    println!("\n=== Test: Mixed Problems ===");
    let mut fields = sample_fields()
        .with("engine", "twelve hundred")
        .with("max_power", -5.0)
        .with("fuel", "");
    fields.remove("transmission");

    let err = validate(&fields).unwrap_err();
    assert_eq!(err.missing, vec![Field::Fuel, Field::Transmission]);
    assert_eq!(err.invalid, vec![Field::Engine, Field::MaxPower]);
    assert_eq!(
        err.to_string(),
        "Please fill: fuel, transmission; Invalid value for: engine, max_power"
    );
    println!("✓ {}", err);
}

#[test]
fn test_trustmark_dealer_and_year_bounds() {
    println!("\n=== Test: Boundary Values ===");
    for year in [1985, 2030] {
        let fields = sample_fields()
            .with("year", year)
            .with("seller_type", "Trustmark Dealer");
        let input = validate(&fields).expect("Boundary year should validate");
        assert_eq!(input.year, year);
    }
    println!("✓ 1985 and 2030 accepted");
}

#[test]
fn test_non_scalar_json_values_are_invalid() {
    println!("\n=== Test: Non-scalar JSON Values ===");
    let fields: RawFields = serde_json::from_str(
        r#"{"year": true, "engine": [1248], "max_power": 75,
            "fuel": {"name": "Diesel"}, "seller_type": "Individual", "transmission": false}"#,
    )
    .expect("Any JSON value should deserialize");

    let err = validate(&fields).unwrap_err();
    assert!(err.missing.is_empty());
    assert_eq!(
        err.invalid,
        vec![Field::Year, Field::Engine, Field::Fuel, Field::Transmission]
    );
    assert_eq!(
        err.to_string(),
        "Invalid value for: year, engine, fuel, transmission"
    );
    println!("✓ {}", err);
}
