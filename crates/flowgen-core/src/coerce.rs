//! Fallible conversions from loosely-typed host values to representation types.
//!
//! Absence (`null`, and the empty string for scalar targets) is handled
//! conservatively: it yields the representation's zero value instead of an
//! error, except for datetimes which have no meaningful zero.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::CoercionError;
use crate::typemap::RepresentationType;
use crate::value::TypedValue;

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub fn to_string(raw: &Value) -> Result<TypedValue, CoercionError> {
    let s = match raw {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => raw.to_string(),
    };
    Ok(TypedValue::String(s))
}

pub fn to_float64(raw: &Value) -> Result<TypedValue, CoercionError> {
    let fail = || CoercionError::new(raw, RepresentationType::Float64);
    let f = match raw {
        Value::Null => 0.0,
        Value::Number(n) => n.as_f64().ok_or_else(fail)?,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| fail().with_reason(e.to_string()))?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Array(_) | Value::Object(_) => return Err(fail()),
    };
    // JSON has no representation for NaN or the infinities.
    if !f.is_finite() {
        return Err(fail().with_reason("number is not finite"));
    }
    Ok(TypedValue::Float64(f))
}

pub fn to_int64(raw: &Value) -> Result<TypedValue, CoercionError> {
    let fail = || CoercionError::new(raw, RepresentationType::Int64);
    let i = match raw {
        Value::Null => 0,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(u) = n.as_u64() {
                i64::try_from(u).map_err(|e| fail().with_reason(e.to_string()))?
            } else {
                truncate(n.as_f64().ok_or_else(fail)?).ok_or_else(fail)?
            }
        }
        Value::String(s) if s.trim().is_empty() => 0,
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(e) => s
                    .parse::<f64>()
                    .ok()
                    .and_then(truncate)
                    .ok_or_else(|| fail().with_reason(e.to_string()))?,
            }
        }
        Value::Bool(b) => i64::from(*b),
        Value::Array(_) | Value::Object(_) => return Err(fail()),
    };
    Ok(TypedValue::Int64(i))
}

fn truncate(f: f64) -> Option<i64> {
    if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

pub fn to_bool(raw: &Value) -> Result<TypedValue, CoercionError> {
    let fail = || CoercionError::new(raw, RepresentationType::Bool);
    let b = match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().ok_or_else(fail)? != 0.0,
        Value::String(s) => match s.trim() {
            "" => false,
            "1" | "t" | "T" | "TRUE" | "true" | "True" => true,
            "0" | "f" | "F" | "FALSE" | "false" | "False" => false,
            _ => return Err(fail().with_reason("not a boolean literal")),
        },
        Value::Array(_) | Value::Object(_) => return Err(fail()),
    };
    Ok(TypedValue::Bool(b))
}

pub fn to_object(raw: &Value) -> Result<TypedValue, CoercionError> {
    let fail = || CoercionError::new(raw, RepresentationType::Object);
    let map = match raw {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        Value::String(s) if s.trim().is_empty() => Map::new(),
        Value::String(s) => serde_json::from_str::<Map<String, Value>>(s)
            .map_err(|e| fail().with_reason(e.to_string()))?,
        Value::Bool(_) | Value::Number(_) | Value::Array(_) => return Err(fail()),
    };
    Ok(TypedValue::Object(map))
}

pub fn to_datetime(raw: &Value) -> Result<TypedValue, CoercionError> {
    let fail = || CoercionError::new(raw, RepresentationType::DateTime);
    let dt = match raw {
        Value::String(s) => parse_datetime(s.trim())
            .ok_or_else(|| fail().with_reason("unrecognized datetime format"))?,
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|dt| dt.fixed_offset())
            .ok_or_else(fail)?,
        _ => return Err(fail()),
    };
    Ok(TypedValue::DateTime(dt))
}

fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

pub fn passthrough(raw: &Value) -> Result<TypedValue, CoercionError> {
    Ok(TypedValue::Any(raw.clone()))
}

/// 1970-01-01T00:00:00Z.
pub fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}
