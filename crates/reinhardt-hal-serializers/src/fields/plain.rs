//! Plain attribute fields
//!
//! Scalar values render as their JSON form. A plain field pointing at a
//! relation renders the related primary key(s). Inbound values are validated
//! against the model field's metadata.

use crate::entity::{AttrValue, PK_ALIAS, ScalarValue, get_attribute};
use crate::meta::{ScalarFieldInfo, ScalarKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

pub const REQUIRED: &str = "This field is required.";
pub const NULL: &str = "This field may not be null.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_STRING: &str = "Not a valid string.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";
pub const INVALID_NUMBER: &str = "A valid number is required.";
pub const INVALID_BOOLEAN: &str = "Must be a valid boolean.";
pub const INVALID_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
pub const INVALID_DATETIME: &str = "Datetime has wrong format. Use one of these formats instead: \
	YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";

/// Render an attribute value for output
pub fn to_representation(value: Option<AttrValue>) -> Value {
	match value {
		None => Value::Null,
		Some(AttrValue::Scalar(scalar)) => scalar.to_json(),
		Some(AttrValue::One(None)) => Value::Null,
		Some(AttrValue::One(Some(related))) => related_pk(related.as_ref()),
		Some(AttrValue::Many(items)) => {
			Value::Array(items.iter().map(|item| related_pk(item.as_ref())).collect())
		}
	}
}

fn related_pk(entity: &dyn crate::entity::Entity) -> Value {
	match get_attribute(entity, PK_ALIAS) {
		Some(AttrValue::Scalar(pk)) => pk.to_json(),
		_ => Value::Null,
	}
}

/// Parse one inbound, non-null value
///
/// Without metadata the value is kept as opaque JSON.
pub fn to_internal_value(info: Option<&ScalarFieldInfo>, raw: &Value) -> Result<ScalarValue, Vec<String>> {
	let Some(info) = info else {
		return Ok(ScalarValue::Json(raw.clone()));
	};

	let parsed = match info.kind {
		ScalarKind::Text => parse_text(info, raw),
		ScalarKind::Integer => parse_integer(raw),
		ScalarKind::Float => parse_float(raw),
		ScalarKind::Boolean => parse_boolean(raw),
		ScalarKind::Date => parse_date(raw),
		ScalarKind::DateTime => parse_datetime(raw),
		ScalarKind::Json => Ok(ScalarValue::Json(raw.clone())),
	};
	parsed.map_err(|message| vec![message])
}

fn parse_text(info: &ScalarFieldInfo, raw: &Value) -> Result<ScalarValue, String> {
	let text = match raw {
		Value::String(s) => s.trim().to_string(),
		Value::Number(n) => n.to_string(),
		_ => return Err(INVALID_STRING.to_string()),
	};
	if text.is_empty() && !info.blank {
		return Err(BLANK.to_string());
	}
	if let Some(max_length) = info.max_length {
		if text.chars().count() > max_length {
			return Err(format!(
				"Ensure this field has no more than {} characters.",
				max_length
			));
		}
	}
	Ok(ScalarValue::Text(text))
}

fn parse_integer(raw: &Value) -> Result<ScalarValue, String> {
	let invalid = || INVALID_INTEGER.to_string();
	match raw {
		Value::Number(n) => match (n.as_i64(), n.as_f64()) {
			(Some(i), _) => Ok(ScalarValue::Int(i)),
			(None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
				Ok(ScalarValue::Int(f as i64))
			}
			_ => Err(invalid()),
		},
		Value::String(s) => {
			let s = s.trim();
			let s = s.strip_suffix(".0").unwrap_or(s);
			s.parse::<i64>().map(ScalarValue::Int).map_err(|_| invalid())
		}
		_ => Err(invalid()),
	}
}

fn parse_float(raw: &Value) -> Result<ScalarValue, String> {
	let invalid = || INVALID_NUMBER.to_string();
	match raw {
		Value::Number(n) => n.as_f64().map(ScalarValue::Float).ok_or_else(invalid),
		Value::String(s) => s
			.trim()
			.parse::<f64>()
			.ok()
			.filter(|f| f.is_finite())
			.map(ScalarValue::Float)
			.ok_or_else(invalid),
		_ => Err(invalid()),
	}
}

fn parse_boolean(raw: &Value) -> Result<ScalarValue, String> {
	let parsed = match raw {
		Value::Bool(b) => Some(*b),
		Value::Number(n) => match n.as_i64() {
			Some(1) => Some(true),
			Some(0) => Some(false),
			_ => None,
		},
		Value::String(s) => match s.as_str() {
			"true" | "True" | "TRUE" | "t" | "yes" | "on" | "1" => Some(true),
			"false" | "False" | "FALSE" | "f" | "no" | "off" | "0" => Some(false),
			_ => None,
		},
		_ => None,
	};
	parsed
		.map(ScalarValue::Bool)
		.ok_or_else(|| INVALID_BOOLEAN.to_string())
}

fn parse_date(raw: &Value) -> Result<ScalarValue, String> {
	raw.as_str()
		.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
		.map(ScalarValue::Date)
		.ok_or_else(|| INVALID_DATE.to_string())
}

fn parse_datetime(raw: &Value) -> Result<ScalarValue, String> {
	let Some(s) = raw.as_str().map(str::trim) else {
		return Err(INVALID_DATETIME.to_string());
	};
	if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
		return Ok(ScalarValue::DateTime(dt.with_timezone(&Utc)));
	}
	// Naive values are taken as UTC.
	["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
		.iter()
		.find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
		.map(|naive| ScalarValue::DateTime(naive.and_utc()))
		.ok_or_else(|| INVALID_DATETIME.to_string())
}
