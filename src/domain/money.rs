//! Currency helpers. Amounts are whole pesos stored as `i64`; the currency
//! has no fractional subunit in day-to-day use.

/// Largest amount a single price or payment entry may carry. Keeps sums of
/// many entries far away from `i64` overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Rounds half-up to the nearest whole peso, the way the register rounds
/// typed or computed amounts. Non-finite input rounds to zero.
pub fn round_half_up(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    (value + 0.5).floor() as i64
}

/// Formats an amount the way receipts show it: `$` followed by the amount
/// with `.` as the thousands separator, e.g. `$20.000`.
pub fn format_cop(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
