//! Human-readable number rendering for the digest body.
//!
//! Every function here is total: absent values render as [`MISSING`], never panic.

/// Placeholder for an absent or unparsable numeric field.
pub const MISSING: &str = "—";

/// `$X.XXB` / `$X.XXM` / `$X.XXK` / `$X.XX`, scaled by magnitude.
///
/// The signed value is divided, so `-1.5e9` renders as `$-1.50B`.
pub fn format_money(value: Option<f64>) -> String {
    let Some(x) = value.filter(|v| v.is_finite()) else {
        return MISSING.to_string();
    };
    let abs = x.abs();
    if abs >= 1e9 {
        format!("${:.2}B", x / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", x / 1e6)
    } else if abs >= 1e3 {
        format!("${:.2}K", x / 1e3)
    } else {
        format!("${x:.2}")
    }
}

/// Signed percentage with two decimals, `+` for non-negative values.
pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(x) => format!("{x:+.2}%"),
        None => MISSING.to_string(),
    }
}

/// Token price: `$` + six significant digits in general notation.
pub fn format_price(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(x) => format!("${}", general_notation(x, 6)),
        None => MISSING.to_string(),
    }
}

/// `%g`-style rendering: fixed notation while the decimal exponent lies in
/// `[-4, precision)`, scientific otherwise; trailing zeros are stripped.
fn general_notation(x: f64, precision: usize) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    let p = precision.max(1);

    // Round once in scientific form so the exponent reflects the rounded value.
    let sci = format!("{:.*e}", p - 1, x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (sci.clone(), 0),
    };

    if exp < -4 || exp >= p as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_trailing_zeros(&mantissa), sign, exp.abs())
    } else {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        strip_trailing_zeros(&format!("{x:.decimals$}"))
    }
}

fn strip_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
