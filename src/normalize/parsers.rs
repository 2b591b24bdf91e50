//! Cell parsers for list-valued and JSON-valued fields.
//!
//! Every parser returns a `Result` so the validation engine can name the
//! exact defect. The normalizer discards the error and keeps the default.

use serde_json::{Map, Value};

use crate::error::ParseError;

/// Splits a comma-separated cell into trimmed, non-empty tokens.
///
/// Order and duplicates are preserved.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses an `AvailableSlots` cell: a JSON array of positive integers.
///
/// ```
/// use u_allocate::normalize::parse_slots;
///
/// assert_eq!(parse_slots("[1, 3, 5]").unwrap(), vec![1, 3, 5]);
/// assert!(parse_slots("1,3").is_err());
/// ```
pub fn parse_slots(raw: &str) -> Result<Vec<u32>, ParseError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| ParseError::Json(e.to_string()))?;
    let items = value.as_array().ok_or(ParseError::NotAnArray)?;
    items.iter().map(phase_from_json).collect()
}

/// Parses a `PreferredPhases` cell.
///
/// A cell containing `-` is an inclusive range `a-b`; anything else must be
/// a JSON array of positive integers.
///
/// ```
/// use u_allocate::normalize::parse_phases;
///
/// assert_eq!(parse_phases("2-4").unwrap(), vec![2, 3, 4]);
/// assert_eq!(parse_phases("[4, 1]").unwrap(), vec![4, 1]);
/// ```
pub fn parse_phases(raw: &str) -> Result<Vec<u32>, ParseError> {
    if raw.contains('-') {
        parse_range(raw)
    } else {
        parse_slots(raw)
    }
}

/// Parses an `AttributesJSON` cell into a JSON object.
pub fn parse_attributes(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| ParseError::Json(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ParseError::NotAnObject),
    }
}

/// Lenient integer parse for numeric cells.
///
/// Accepts integral floats such as `"3.0"`, which spreadsheet exports
/// commonly produce.
pub(crate) fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

fn parse_range(raw: &str) -> Result<Vec<u32>, ParseError> {
    let bad = || ParseError::BadRange(raw.to_string());
    let (start, end) = raw.split_once('-').ok_or_else(bad)?;
    let start: u32 = start.trim().parse().map_err(|_| bad())?;
    let end: u32 = end.trim().parse().map_err(|_| bad())?;
    if start == 0 {
        return Err(ParseError::NonPositive(0));
    }
    if start > end {
        return Err(ParseError::InvertedRange { start, end });
    }
    Ok((start..=end).collect())
}

fn phase_from_json(item: &Value) -> Result<u32, ParseError> {
    let n = item
        .as_i64()
        .ok_or_else(|| ParseError::NotAnInteger(item.to_string()))?;
    if n < 1 {
        return Err(ParseError::NonPositive(n));
    }
    u32::try_from(n).map_err(|_| ParseError::NotAnInteger(item.to_string()))
}
