//! Per-kind coercion rules

use crate::CoercionError;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use seedkit_core::{ColumnKind, InputValue, NativeValue};

type Result<T> = std::result::Result<T, CoercionError>;

/// 2^63. `i64::MAX as f64` rounds up to this, so the upper bound is exclusive.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Parse `column_type` and coerce `input` for it
pub fn coerce_str(column_type: &str, input: &InputValue) -> Result<NativeValue> {
    coerce(&ColumnKind::parse(column_type), input)
}

/// Convert `input` into the native value a column of `kind` stores.
///
/// `Null`, a null reference and a native null of the same kind all become
/// the kind's null. A non-null reference is dereferenced and coerced again.
pub fn coerce(kind: &ColumnKind, input: &InputValue) -> Result<NativeValue> {
    match input {
        InputValue::Null | InputValue::Ref(None) => return null_of(kind),
        InputValue::Ref(Some(inner)) => return coerce(kind, inner),
        InputValue::Native(native) => return passthrough(kind, native),
        _ => {}
    }

    match kind {
        ColumnKind::Int64 => to_int64(input).map(|v| NativeValue::Int64(Some(v))),
        ColumnKind::Float64 => to_float64(input, kind).map(|v| NativeValue::Float64(Some(v))),
        // Narrowing to f32 is explicit and never fails
        ColumnKind::Float32 => {
            to_float64(input, kind).map(|v| NativeValue::Float32(Some(v as f32)))
        }
        ColumnKind::Bool => match input {
            InputValue::Bool(b) => Ok(NativeValue::Bool(Some(*b))),
            _ => Err(mismatch(input, kind)),
        },
        ColumnKind::String => match input {
            InputValue::String(s) => Ok(NativeValue::String(Some(s.clone()))),
            _ => Err(mismatch(input, kind)),
        },
        ColumnKind::Bytes => to_bytes(input).map(|v| NativeValue::Bytes(Some(v))),
        ColumnKind::Timestamp => to_timestamp(input).map(|v| NativeValue::Timestamp(Some(v))),
        ColumnKind::Date => to_date(input).map(|v| NativeValue::Date(Some(v))),
        ColumnKind::Numeric => to_numeric(input).map(|v| NativeValue::Numeric(Some(v))),
        ColumnKind::Json => input
            .to_json()
            .map(|v| NativeValue::Json(Some(v)))
            .ok_or_else(|| mismatch(input, kind)),
        ColumnKind::Array(element) => to_array(element, input, kind),
        // Composite values are only accepted already in native form
        ColumnKind::Struct(_) => Err(mismatch(input, kind)),
        ColumnKind::Unsupported(raw) => Err(CoercionError::UnsupportedType(raw.clone())),
    }
}

fn null_of(kind: &ColumnKind) -> Result<NativeValue> {
    NativeValue::null_of(kind).ok_or_else(|| CoercionError::UnsupportedType(kind.to_string()))
}

fn passthrough(kind: &ColumnKind, native: &NativeValue) -> Result<NativeValue> {
    if !kind.is_supported() {
        return Err(CoercionError::UnsupportedType(kind.to_string()));
    }
    if native.matches_kind(kind) {
        Ok(native.clone())
    } else {
        Err(CoercionError::Mismatch {
            value: native.to_string(),
            value_type: "native",
            target: kind.to_string(),
        })
    }
}

fn to_int64(input: &InputValue) -> Result<i64> {
    let target = ColumnKind::Int64;
    match input {
        InputValue::Int(i) => Ok(*i),
        InputValue::Number(n) => parse_int(&n.to_string()),
        InputValue::String(s) => parse_int(s),
        InputValue::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(f) {
                Ok(*f as i64)
            } else {
                Err(precision_loss(input, &target))
            }
        }
        InputValue::Decimal(d) => {
            if !d.fract().is_zero() {
                return Err(precision_loss(input, &target));
            }
            i64::try_from(*d).map_err(|_| precision_loss(input, &target))
        }
        _ => Err(mismatch(input, &target)),
    }
}

fn parse_int(text: &str) -> Result<i64> {
    text.parse::<i64>().map_err(|e| CoercionError::Parse {
        value: text.to_string(),
        target: ColumnKind::Int64.to_string(),
        reason: e.to_string(),
    })
}

fn to_float64(input: &InputValue, target: &ColumnKind) -> Result<f64> {
    match input {
        InputValue::Float(f) => Ok(*f),
        InputValue::Int(i) => Ok(*i as f64),
        InputValue::Number(n) => parse_float(&n.to_string(), target),
        InputValue::String(s) => parse_float(s, target),
        InputValue::Decimal(d) => f64::try_from(*d).map_err(|_| precision_loss(input, target)),
        _ => Err(mismatch(input, target)),
    }
}

fn parse_float(text: &str, target: &ColumnKind) -> Result<f64> {
    text.parse::<f64>().map_err(|e| CoercionError::Parse {
        value: text.to_string(),
        target: target.to_string(),
        reason: e.to_string(),
    })
}

fn to_numeric(input: &InputValue) -> Result<Decimal> {
    let target = ColumnKind::Numeric;
    match input {
        InputValue::Decimal(d) => Ok(*d),
        InputValue::Int(i) => Ok(Decimal::from(*i)),
        InputValue::Number(n) => parse_decimal(&n.to_string()),
        InputValue::String(s) => parse_decimal(s),
        // Binary floats are not exact
        _ => Err(mismatch(input, &target)),
    }
}

fn parse_decimal(text: &str) -> Result<Decimal> {
    let parsed = match text.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => parse_scientific(mantissa, exponent),
        None => Decimal::from_str_exact(text),
    };

    parsed.map_err(|e| match e {
        rust_decimal::Error::Underflow
        | rust_decimal::Error::ExceedsMaximumPossibleValue
        | rust_decimal::Error::LessThanMinimumPossibleValue
        | rust_decimal::Error::ScaleExceedsMaximumPrecision(_) => CoercionError::PrecisionLoss {
            value: text.to_string(),
            target: ColumnKind::Numeric.to_string(),
        },
        other => CoercionError::Parse {
            value: text.to_string(),
            target: ColumnKind::Numeric.to_string(),
            reason: other.to_string(),
        },
    })
}

/// Largest scale a `Decimal` can carry
const MAX_SCALE: i64 = 28;

/// Exact `<mantissa>e<exponent>`: every mantissa digit must survive the shift
fn parse_scientific(
    mantissa: &str,
    exponent: &str,
) -> std::result::Result<Decimal, rust_decimal::Error> {
    let value = Decimal::from_str_exact(mantissa)?;
    let exponent: i64 = exponent.parse().map_err(|_| {
        rust_decimal::Error::ErrorString(format!("invalid exponent `{}`", exponent))
    })?;
    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let mut digits = value.mantissa();
    let mut scale = i64::from(value.scale()).saturating_sub(exponent);
    // Trailing zeros carry no precision
    while scale > MAX_SCALE && digits % 10 == 0 {
        digits /= 10;
        scale -= 1;
    }
    if scale > MAX_SCALE {
        return Err(rust_decimal::Error::Underflow);
    }
    while scale < 0 {
        digits = digits
            .checked_mul(10)
            .ok_or(rust_decimal::Error::ExceedsMaximumPossibleValue)?;
        scale += 1;
    }

    // 0 <= scale <= MAX_SCALE here
    Decimal::try_from_i128_with_scale(digits, scale as u32)
}

fn to_bytes(input: &InputValue) -> Result<Vec<u8>> {
    match input {
        InputValue::Bytes(b) => Ok(b.clone()),
        InputValue::String(s) => BASE64.decode(s).map_err(|e| CoercionError::Parse {
            value: s.clone(),
            target: ColumnKind::Bytes.to_string(),
            reason: e.to_string(),
        }),
        _ => Err(mismatch(input, &ColumnKind::Bytes)),
    }
}

fn to_timestamp(input: &InputValue) -> Result<DateTime<Utc>> {
    match input {
        InputValue::Timestamp(ts) => Ok(*ts),
        InputValue::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| CoercionError::Parse {
                value: s.clone(),
                target: ColumnKind::Timestamp.to_string(),
                reason: e.to_string(),
            }),
        _ => Err(mismatch(input, &ColumnKind::Timestamp)),
    }
}

fn to_date(input: &InputValue) -> Result<NaiveDate> {
    match input {
        InputValue::Date(d) => Ok(*d),
        InputValue::String(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| CoercionError::Parse {
                value: s.clone(),
                target: ColumnKind::Date.to_string(),
                reason: e.to_string(),
            })
        }
        _ => Err(mismatch(input, &ColumnKind::Date)),
    }
}

fn to_array(element: &ColumnKind, input: &InputValue, kind: &ColumnKind) -> Result<NativeValue> {
    if !element.is_supported() {
        return Err(CoercionError::UnsupportedType(kind.to_string()));
    }

    let values = match input {
        InputValue::Array(items) => items
            .iter()
            .map(|item| coerce(element, item))
            .collect::<Result<Vec<_>>>()?,
        InputValue::Json(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| coerce(element, &InputValue::from(item.clone())))
            .collect::<Result<Vec<_>>>()?,
        _ => return Err(mismatch(input, kind)),
    };

    Ok(NativeValue::Array {
        element: element.clone(),
        values: Some(values),
    })
}

fn mismatch(input: &InputValue, target: &ColumnKind) -> CoercionError {
    CoercionError::Mismatch {
        value: input.to_string(),
        value_type: input.type_name(),
        target: target.to_string(),
    }
}

fn precision_loss(input: &InputValue, target: &ColumnKind) -> CoercionError {
    CoercionError::PrecisionLoss {
        value: input.to_string(),
        target: target.to_string(),
    }
}
