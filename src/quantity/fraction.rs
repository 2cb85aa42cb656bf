//! Fraction / decimal conversion

/// Culinary fractions recognised for display, with their decimal values
pub const COMMON_FRACTIONS: [(&str, f64); 9] = [
    ("1/8", 0.125),
    ("1/4", 0.25),
    ("1/3", 1.0 / 3.0),
    ("3/8", 0.375),
    ("1/2", 0.5),
    ("5/8", 0.625),
    ("2/3", 2.0 / 3.0),
    ("3/4", 0.75),
    ("7/8", 0.875),
];

const FRACTION_TOLERANCE: f64 = 0.001;

const INVALID_QUANTITY: &str = "must be a number or fraction (e.g., 1/2, 1 1/4)";

/// A fraction or mixed number split into its integer parts
#[derive(Debug, Clone, Copy, PartialEq)]
struct FractionParts {
    whole: Option<u64>,
    numerator: u64,
    denominator: u64,
}

/// Convert a quantity string to a decimal.
///
/// Plain numbers parse directly, `"1 1/2"` is a mixed number and `"3/4"` a
/// simple fraction. Anything else is `0.0`; a zero denominator yields the
/// whole part (mixed) or `0.0` (simple).
pub fn to_decimal(input: &str) -> f64 {
    let value = input.trim();

    if let Some(number) = parse_numeric(value) {
        return number;
    }

    match parse_fraction(value) {
        Some(FractionParts { whole, numerator, denominator }) => {
            let whole = whole.unwrap_or(0) as f64;
            if denominator == 0 {
                whole
            } else {
                whole + numerator as f64 / denominator as f64
            }
        }
        None => 0.0,
    }
}

/// Render a decimal for display: `"3"`, `"1/2"`, `"2 1/3"`, or the value
/// rounded to two places when no common fraction is close enough.
pub fn to_fraction(value: f64) -> String {
    if value == value.trunc() {
        return format!("{}", value as i64);
    }

    let whole = value.floor();
    let remainder = value - whole;

    let fraction = COMMON_FRACTIONS
        .iter()
        .find(|(_, decimal)| (remainder - decimal).abs() < FRACTION_TOLERANCE)
        .map(|(label, _)| *label);

    match fraction {
        Some(label) if whole == 0.0 => label.to_string(),
        Some(label) => format!("{} {}", whole as i64, label),
        None => format!("{}", round_quantity(value)),
    }
}

/// True when the input is a number, fraction or mixed number greater than zero
pub fn is_valid(input: &str) -> bool {
    let value = input.trim();

    if let Some(number) = parse_numeric(value) {
        return number > 0.0;
    }

    parse_fraction(value).is_some() && to_decimal(value) > 0.0
}

/// Validate and convert a user-entered quantity
pub fn parse_quantity(input: &str) -> Result<f64, String> {
    if is_valid(input) {
        Ok(to_decimal(input))
    } else {
        Err(format!("Quantity '{}' {}", input.trim(), INVALID_QUANTITY))
    }
}

/// Round half away from zero to two decimal places.
///
/// The scaled value is first snapped to 15 significant digits so a decimal
/// tie such as `1.015`, stored as `101.4999...` after scaling, still rounds up.
pub fn round_quantity(value: f64) -> f64 {
    let scaled = value * 100.0;
    let snapped = format!("{:.14e}", scaled).parse::<f64>().unwrap_or(scaled);
    snapped.round() / 100.0
}

/// Parse a plain decimal literal. `str::parse` alone would also accept
/// spellings like `inf` and `NaN`, which are not quantities.
fn parse_numeric(value: &str) -> Option<f64> {
    let digits = value.trim_start_matches(['+', '-']);
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'))
    {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Match `<int>/<int>` or `<int> <int>/<int>` (any whitespace between the
/// whole part and the fraction, none around the slash)
fn parse_fraction(value: &str) -> Option<FractionParts> {
    let (head, denominator) = value.split_once('/')?;
    let denominator = parse_digits(denominator)?;

    let mut parts = head.split_whitespace();
    let first = parts.next()?;
    let second = parts.next();
    if parts.next().is_some() || head.ends_with(char::is_whitespace) {
        return None;
    }

    match second {
        None => Some(FractionParts {
            whole: None,
            numerator: parse_digits(first)?,
            denominator,
        }),
        Some(numerator) => Some(FractionParts {
            whole: Some(parse_digits(first)?),
            numerator: parse_digits(numerator)?,
            denominator,
        }),
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn simple_fractions_to_decimal() {
        assert_eq!(to_decimal("1/2"), 0.5);
        assert_eq!(to_decimal("1/4"), 0.25);
        assert!(approx(to_decimal("1/3"), 1.0 / 3.0));
        assert_eq!(to_decimal("3/4"), 0.75);
    }

    #[test]
    fn mixed_numbers_to_decimal() {
        assert_eq!(to_decimal("1 1/2"), 1.5);
        assert_eq!(to_decimal("2 1/4"), 2.25);
        assert_eq!(to_decimal("1 3/4"), 1.75);
        assert_eq!(to_decimal("  3 3/4 "), 3.75);
    }

    #[test]
    fn plain_numbers_to_decimal() {
        assert_eq!(to_decimal("3"), 3.0);
        assert_eq!(to_decimal("2.5"), 2.5);
        assert_eq!(to_decimal("0.5"), 0.5);
        assert_eq!(to_decimal("-1"), -1.0);
    }

    #[test]
    fn zero_denominators_degrade() {
        assert_eq!(to_decimal("2 1/0"), 2.0);
        assert_eq!(to_decimal("1/0"), 0.0);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(to_decimal("abc"), 0.0);
        assert_eq!(to_decimal(""), 0.0);
        assert_eq!(to_decimal("inf"), 0.0);
        assert_eq!(to_decimal("1 / 2"), 0.0);
        assert_eq!(to_decimal("1 2 3/4"), 0.0);
        assert_eq!(to_decimal("-1/2"), 0.0);
    }

    #[test]
    fn decimals_to_fraction_strings() {
        assert_eq!(to_fraction(0.5), "1/2");
        assert_eq!(to_fraction(0.25), "1/4");
        assert_eq!(to_fraction(0.75), "3/4");
        assert_eq!(to_fraction(3.0), "3");
        assert_eq!(to_fraction(1.5), "1 1/2");
        assert_eq!(to_fraction(2.0 + 1.0 / 3.0), "2 1/3");
        assert_eq!(to_fraction(0.667), "2/3");
    }

    #[test]
    fn unmatched_decimals_fall_back_to_rounded_value() {
        assert_eq!(to_fraction(1.37), "1.37");
        assert_eq!(to_fraction(0.1234), "0.12");
    }

    #[test]
    fn common_fractions_round_trip() {
        for (label, _) in COMMON_FRACTIONS {
            assert_eq!(to_fraction(to_decimal(label)), label);
        }
    }

    #[test]
    fn validity_gate() {
        for input in ["1/2", "1 1/2", "3", "2.5", " 1/4 "] {
            assert!(is_valid(input), "{input} should be valid");
        }
        for input in ["0", "-1", "abc", "", "0/4", "0 0/3", "1/0", "nan"] {
            assert!(!is_valid(input), "{input} should be invalid");
        }
    }

    #[test]
    fn parse_quantity_reports_bad_input() {
        assert_eq!(parse_quantity("1 1/2"), Ok(1.5));
        let err = parse_quantity("a pinch").unwrap_err();
        assert!(err.contains("a pinch"));
        assert!(err.contains("number or fraction"));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_quantity(1.375), 1.38);
        assert_eq!(round_quantity(0.666_666), 0.67);
        assert_eq!(round_quantity(11.0), 11.0);
    }

    #[test]
    fn decimal_ties_round_up_despite_binary_representation() {
        assert_eq!(round_quantity(1.015), 1.02);
        assert_eq!(round_quantity(1.005), 1.01);
        assert_eq!(round_quantity(2.675), 2.68);
        assert_eq!(round_quantity(-1.015), -1.02);
        assert_eq!(to_fraction(1.015), "1.02");
    }
}
