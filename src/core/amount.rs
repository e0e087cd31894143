//! Presentation of integer minor units.
//!
//! The engine computes exclusively in minor units (`i64`). These helpers only
//! turn them into decimal major units for display, e.g. `1234` cents as
//! `12.34`.

use rust_decimal::Decimal;

/// Number of decimal places used when none is configured.
pub const DEFAULT_DECIMALS: u32 = 2;

/// Convert minor units into a decimal amount in major units.
///
/// # Examples
///
/// ```
/// use split_engine::core::amount::to_major;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(to_major(1234, 2), dec!(12.34));
/// assert_eq!(to_major(-5, 2), dec!(-0.05));
/// ```
pub fn to_major(minor: i64, decimals: u32) -> Decimal {
    Decimal::new(minor, decimals.min(28))
}

/// Render minor units as a fixed-scale string (`1234` -> `"12.34"`).
pub fn format_minor(minor: i64, decimals: u32) -> String {
    to_major(minor, decimals).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_major() {
        assert_eq!(to_major(100, 2), dec!(1.00));
        assert_eq!(to_major(7, 0), dec!(7));
        assert_eq!(to_major(-250, 1), dec!(-25.0));
    }

    #[test]
    fn test_format_minor_keeps_scale() {
        assert_eq!(format_minor(1000, 2), "10.00");
        assert_eq!(format_minor(3, 2), "0.03");
        assert_eq!(format_minor(-3333, 2), "-33.33");
    }
}
