//! Quantity conversion tool

use serde::Serialize;

use crate::quantity::{is_valid, to_decimal, to_fraction};

#[derive(Debug, Serialize)]
pub struct ConvertQuantityResponse {
    pub input: String,
    pub is_valid: bool,
    pub decimal: Option<f64>,
    pub fraction: Option<String>,
}

/// Decimal value and display fraction of a quantity string such as "1 1/2"
pub fn convert_quantity(input: &str) -> ConvertQuantityResponse {
    let valid = is_valid(input);
    let decimal = valid.then(|| to_decimal(input));
    ConvertQuantityResponse {
        input: input.to_string(),
        is_valid: valid,
        decimal,
        fraction: decimal.map(to_fraction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_numbers_convert_both_ways() {
        let response = convert_quantity("1 1/2");
        assert!(response.is_valid);
        assert_eq!(response.decimal, Some(1.5));
        assert_eq!(response.fraction.as_deref(), Some("1 1/2"));
    }

    #[test]
    fn invalid_input_has_no_values() {
        let response = convert_quantity("a pinch");
        assert!(!response.is_valid);
        assert!(response.decimal.is_none());
        assert!(response.fraction.is_none());
    }
}
