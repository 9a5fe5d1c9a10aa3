//! Entity attribute access
//!
//! Entities are owned by the data-access layer. The serializers only read
//! attributes by name through the [`Entity`] trait, following dotted source
//! paths (`poll.question`) and double-underscore lookup paths (`poll__pk`).

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Alias accepted everywhere for the primary key attribute
pub const PK_ALIAS: &str = "pk";

/// A scalar attribute value as stored on an entity
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Date(NaiveDate),
	DateTime(DateTime<Utc>),
	Json(Value),
}

impl ScalarValue {
	pub fn is_null(&self) -> bool {
		matches!(self, ScalarValue::Null)
	}

	/// String form used as a URL parameter, `None` for null
	pub fn to_lookup_string(&self) -> Option<String> {
		match self {
			ScalarValue::Null => None,
			ScalarValue::Bool(b) => Some(b.to_string()),
			ScalarValue::Int(i) => Some(i.to_string()),
			ScalarValue::Float(f) => Some(f.to_string()),
			ScalarValue::Text(s) => Some(s.clone()),
			ScalarValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
			ScalarValue::DateTime(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
			ScalarValue::Json(Value::Null) => None,
			ScalarValue::Json(Value::String(s)) => Some(s.clone()),
			ScalarValue::Json(v) => Some(v.to_string()),
		}
	}

	/// JSON form of the value, dates as ISO-8601
	pub fn to_json(&self) -> Value {
		match self {
			ScalarValue::Null => Value::Null,
			ScalarValue::Bool(b) => Value::Bool(*b),
			ScalarValue::Int(i) => Value::from(*i),
			ScalarValue::Float(f) => serde_json::Number::from_f64(*f)
				.map(Value::Number)
				.unwrap_or(Value::Null),
			ScalarValue::Text(s) => Value::String(s.clone()),
			ScalarValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
			ScalarValue::DateTime(dt) => {
				Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
			}
			ScalarValue::Json(v) => v.clone(),
		}
	}
}

impl From<bool> for ScalarValue {
	fn from(value: bool) -> Self {
		ScalarValue::Bool(value)
	}
}

impl From<i64> for ScalarValue {
	fn from(value: i64) -> Self {
		ScalarValue::Int(value)
	}
}

impl From<i32> for ScalarValue {
	fn from(value: i32) -> Self {
		ScalarValue::Int(i64::from(value))
	}
}

impl From<f64> for ScalarValue {
	fn from(value: f64) -> Self {
		ScalarValue::Float(value)
	}
}

impl From<&str> for ScalarValue {
	fn from(value: &str) -> Self {
		ScalarValue::Text(value.to_string())
	}
}

impl From<String> for ScalarValue {
	fn from(value: String) -> Self {
		ScalarValue::Text(value)
	}
}

impl From<NaiveDate> for ScalarValue {
	fn from(value: NaiveDate) -> Self {
		ScalarValue::Date(value)
	}
}

impl From<DateTime<Utc>> for ScalarValue {
	fn from(value: DateTime<Utc>) -> Self {
		ScalarValue::DateTime(value)
	}
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(ScalarValue::Null)
	}
}

/// The value of one named attribute
#[derive(Debug, Clone)]
pub enum AttrValue {
	Scalar(ScalarValue),
	/// Single-valued relation, `None` when not set
	One(Option<Arc<dyn Entity>>),
	/// Collection-valued relation
	Many(Vec<Arc<dyn Entity>>),
}

impl AttrValue {
	/// True for a null scalar or an unset single relation
	pub fn is_absent(&self) -> bool {
		match self {
			AttrValue::Scalar(value) => value.is_null(),
			AttrValue::One(related) => related.is_none(),
			AttrValue::Many(_) => false,
		}
	}
}

macro_rules! scalar_attr_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for AttrValue {
				fn from(value: $ty) -> Self {
					AttrValue::Scalar(value.into())
				}
			}
		)*
	};
}

scalar_attr_from!(
	ScalarValue,
	bool,
	i64,
	i32,
	f64,
	&str,
	String,
	NaiveDate,
	DateTime<Utc>,
	Option<i64>,
	Option<String>,
);

/// A model instance whose attributes can be read by name
pub trait Entity: Send + Sync + fmt::Debug {
	/// Name of the model this entity belongs to (e.g. `"Choice"`)
	fn model_name(&self) -> &str;

	/// Attribute holding the primary key
	fn primary_key_name(&self) -> &str {
		"id"
	}

	/// Read one attribute; `None` when the entity has no such attribute
	fn get(&self, attribute: &str) -> Option<AttrValue>;
}

/// Read a single attribute, resolving the `pk` alias
pub fn get_attribute(entity: &dyn Entity, attribute: &str) -> Option<AttrValue> {
	if attribute == PK_ALIAS {
		entity.get(entity.primary_key_name())
	} else {
		entity.get(attribute)
	}
}

/// Traverse a sequence of attribute names
///
/// Every hop except the last must land on a single related entity. A missing
/// attribute or an unset relation on the way yields `None`.
pub fn resolve_path<'a, I>(entity: &dyn Entity, segments: I) -> Option<AttrValue>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut segments = segments.into_iter().peekable();
	let mut current: Option<Arc<dyn Entity>> = None;

	while let Some(segment) = segments.next() {
		let target: &dyn Entity = match &current {
			Some(related) => related.as_ref(),
			None => entity,
		};
		let value = get_attribute(target, segment)?;
		if segments.peek().is_none() {
			return Some(value);
		}
		match value {
			AttrValue::One(Some(related)) => current = Some(related),
			_ => return None,
		}
	}

	None
}

/// Resolve a dotted source path such as `poll.question`
pub fn resolve_source(entity: &dyn Entity, source: &str) -> Option<AttrValue> {
	resolve_path(entity, source.split('.'))
}

/// Resolve a lookup key such as `poll__pk` to its URL parameter string
///
/// A related entity resolves to its primary key. Unset values yield `None`,
/// which callers treat as "not linkable yet".
pub fn lookup_value(entity: &dyn Entity, lookup: &str) -> Option<String> {
	match resolve_path(entity, lookup.split("__"))? {
		AttrValue::Scalar(value) => value.to_lookup_string(),
		AttrValue::One(Some(related)) => lookup_value(related.as_ref(), PK_ALIAS),
		AttrValue::One(None) | AttrValue::Many(_) => None,
	}
}

/// A map-backed entity
///
/// Useful for data that does not come from a typed model, and for the
/// in-memory persistence used in tests. Attributes live behind a lock so
/// relations can be attached after creation.
pub struct Record {
	model: String,
	primary_key: String,
	attributes: RwLock<IndexMap<String, AttrValue>>,
}

impl Record {
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			primary_key: String::from("id"),
			attributes: RwLock::new(IndexMap::new()),
		}
	}

	/// Use a primary key attribute other than `id`
	pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
		self.primary_key = name.into();
		self
	}

	/// Builder-style attribute assignment
	pub fn with(self, attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.set(attribute, value);
		self
	}

	pub fn set(&self, attribute: impl Into<String>, value: impl Into<AttrValue>) {
		self.attributes.write().insert(attribute.into(), value.into());
	}

	/// Append to a collection attribute, creating it if needed
	pub fn push(&self, attribute: &str, related: Arc<dyn Entity>) {
		let mut attributes = self.attributes.write();
		match attributes.get_mut(attribute) {
			Some(AttrValue::Many(items)) => items.push(related),
			_ => {
				attributes.insert(attribute.to_string(), AttrValue::Many(vec![related]));
			}
		}
	}

	/// Keep only the members of a collection attribute matching `keep`
	pub fn retain(&self, attribute: &str, mut keep: impl FnMut(&Arc<dyn Entity>) -> bool) {
		if let Some(AttrValue::Many(items)) = self.attributes.write().get_mut(attribute) {
			items.retain(|item| keep(item));
		}
	}

	pub fn attribute_names(&self) -> Vec<String> {
		self.attributes.read().keys().cloned().collect()
	}
}

impl Entity for Record {
	fn model_name(&self) -> &str {
		&self.model
	}

	fn primary_key_name(&self) -> &str {
		&self.primary_key
	}

	fn get(&self, attribute: &str) -> Option<AttrValue> {
		self.attributes.read().get(attribute).cloned()
	}
}

// Relations may point back at this record, so only the identity is printed.
impl fmt::Debug for Record {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let pk = self
			.get(&self.primary_key)
			.and_then(|value| match value {
				AttrValue::Scalar(scalar) => scalar.to_lookup_string(),
				_ => None,
			});
		f.debug_struct("Record")
			.field("model", &self.model)
			.field("pk", &pk)
			.finish()
	}
}

impl From<Arc<dyn Entity>> for AttrValue {
	fn from(value: Arc<dyn Entity>) -> Self {
		AttrValue::One(Some(value))
	}
}

impl From<Arc<Record>> for AttrValue {
	fn from(value: Arc<Record>) -> Self {
		AttrValue::One(Some(value))
	}
}
