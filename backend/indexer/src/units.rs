//! Fixed-point ton formatting.
//!
//! The contract stores tons as `i128` with 18 fractional digits. The REST
//! API hands clients a decimal string instead, so nothing downstream has to
//! know the scale.

/// Fractional digits of a ton-unit amount.
pub const TON_DECIMALS: u32 = 18;

/// Render a raw ton-unit integer (as emitted, in decimal) as a decimal
/// string with trailing zeros trimmed: `"1500000000000000000"` → `"1.5"`.
///
/// Returns `None` when `raw` is not an integer.
pub fn format_tons(raw: &str) -> Option<String> {
    let value: i128 = raw.trim().parse().ok()?;
    let scale = 10u128.pow(TON_DECIMALS);
    let magnitude = value.unsigned_abs();
    let whole = magnitude / scale;
    let frac = magnitude % scale;

    let sign = if value < 0 { "-" } else { "" };
    if frac == 0 {
        return Some(format!("{sign}{whole}"));
    }
    let digits = format!("{frac:0width$}", width = TON_DECIMALS as usize);
    Some(format!("{sign}{whole}.{}", digits.trim_end_matches('0')))
}
