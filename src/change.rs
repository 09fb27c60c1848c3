// 📈 Period-over-period percentage change

/// Decimal places kept in a reported change, for display stability.
pub const CHANGE_DECIMAL_PLACES: i32 = 2;

/// Percentage change from `previous` to `current`.
///
/// A zero baseline saturates instead of dividing: `100` if anything changed,
/// `0` if both are zero. Otherwise `(current - previous) / |previous| * 100`,
/// so a drop is always negative regardless of the baseline's sign.
pub fn percent_change(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return if current == 0 { 0.0 } else { 100.0 };
    }

    let delta = current as f64 - previous as f64;
    round_to(delta / (previous as f64).abs() * 100.0, CHANGE_DECIMAL_PLACES)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
