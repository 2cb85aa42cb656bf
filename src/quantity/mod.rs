//! Quantity parsing and display
//!
//! Recipe quantities are typed the way cooks write them ("1 1/2", "3/4",
//! "2.5"); everything downstream works on `f64`.

pub mod fraction;

pub use fraction::{
    is_valid, parse_quantity, round_quantity, to_decimal, to_fraction, COMMON_FRACTIONS,
};
