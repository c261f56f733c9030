/// Format a dollar amount the way the lot's paperwork prints it.
///
/// Thousands are comma-grouped, cents are shown only when non-zero, and
/// trailing zero cents are dropped: `25000.0` -> `$25,000`, `19999.5` ->
/// `$19,999.5`, `1234.56` -> `$1,234.56`.
#[must_use]
pub fn format_usd(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0".to_string();
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    match fraction {
        0 => format!("{sign}${grouped}"),
        f if f % 10 == 0 => format!("{sign}${grouped}.{}", f / 10),
        f => format!("{sign}${grouped}.{f:02}"),
    }
}
