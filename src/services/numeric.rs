//! Best-effort numeric conversion for platform report text.

use crate::models::report::ParamValue;

/// Convert report text like `"$1,234.50"`, `"-12.5%"` or `"1 250.00"` to a
/// float. Every character except digits, `-` and `.` is stripped before
/// parsing; anything that still fails to parse becomes 0.0. Never errors.
/// Callers must cut trailing qualifiers like `"(55.83%)"` off beforehand;
/// a second decimal point sinks the whole token to zero.
pub fn normalize_number(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Infer the scalar type of an untyped report cell: a decimal point means a
/// float attempt, otherwise an integer attempt, with raw text as fallback.
/// Boolean-like strings are deliberately not inferred.
pub fn infer_scalar(text: &str) -> ParamValue {
    let trimmed = text.trim();
    if trimmed.contains('.') {
        if let Ok(value) = trimmed.parse::<f64>() {
            return ParamValue::Float(value);
        }
    } else if let Ok(value) = trimmed.parse::<i64>() {
        return ParamValue::Int(value);
    }
    ParamValue::Text(trimmed.to_string())
}
