//! Fixed-point ledger integers to floating-point token amounts.

use alloy_primitives::U256;

/// Decimal precision of constant-product LP shares.
pub const LP_SHARE_DECIMALS: u8 = 18;

/// Convert a raw integer amount into whole-token units.
///
/// Goes through the decimal string so values above 2^64 keep their
/// leading digits; precision beyond f64's mantissa is dropped.
pub fn format_units(raw: U256, decimals: u8) -> f64 {
    let value = raw.to_string().parse::<f64>().unwrap_or(0.0);
    value / 10f64.powi(i32::from(decimals))
}
