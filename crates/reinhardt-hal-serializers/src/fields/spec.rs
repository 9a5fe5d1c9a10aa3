//! Field specifications
//!
//! A [`FieldSpec`] is the immutable description of one representation field,
//! produced once by the field classifier and shared by every call afterwards.

use super::link::{LinkResolver, type_name};
use super::method::MethodField;
use super::plain;
use crate::context::SerializerContext;
use crate::entity::{AttrValue, Entity, resolve_source};
use crate::error::{ErrorDetail, HalError};
use crate::meta::ScalarFieldInfo;
use crate::serializer::{HalModelSerializer, InternalValue};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Post-processing hook applied to a rendered value
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Where a field's value is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
	/// Attribute path, dot separated
	Attribute(String),
	/// The entity itself
	Entity,
}

impl Source {
	/// `"*"` selects the whole entity
	pub fn parse(source: &str) -> Self {
		if source == "*" {
			Source::Entity
		} else {
			Source::Attribute(source.to_string())
		}
	}

	/// The attribute written back on parse, if this is a plain attribute
	pub fn attribute(&self) -> Option<&str> {
		match self {
			Source::Attribute(path) if !path.contains('.') => Some(path),
			_ => None,
		}
	}
}

/// How a field is computed
#[derive(Debug, Clone)]
pub enum FieldKind {
	/// A scalar attribute; metadata drives inbound validation
	Plain(Option<ScalarFieldInfo>),
	/// A relation rendered as `{"href": ...}`
	Link(LinkResolver),
	/// A relation rendered as full nested document(s)
	Embedded(Arc<HalModelSerializer>),
	/// The entity's own URL as a top-level string
	Identity(LinkResolver),
	/// A computed value
	Method(MethodField),
}

/// Which part of a document a field lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
	Attributes,
	Links,
	Embedded,
}

/// Immutable description of one representation field
#[derive(Clone)]
pub struct FieldSpec {
	pub name: String,
	pub source: Source,
	pub kind: FieldKind,
	pub read_only: bool,
	pub required: bool,
	pub allow_null: bool,
	pub allow_empty: bool,
	pub many: bool,
	pub transform: Option<Transform>,
}

impl FieldSpec {
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		let name = name.into();
		Self {
			source: Source::Attribute(name.clone()),
			name,
			kind,
			read_only: false,
			required: true,
			allow_null: false,
			allow_empty: true,
			many: false,
			transform: None,
		}
	}

	pub fn kind_name(&self) -> &'static str {
		match self.kind {
			FieldKind::Plain(_) => "plain",
			FieldKind::Link(_) => "link",
			FieldKind::Embedded(_) => "embedded",
			FieldKind::Identity(_) => "identity",
			FieldKind::Method(_) => "method",
		}
	}

	pub fn is_link(&self) -> bool {
		matches!(self.kind, FieldKind::Link(_))
	}

	pub fn is_embedded(&self) -> bool {
		matches!(self.kind, FieldKind::Embedded(_))
	}

	/// Attribute name this field writes on parse
	pub fn attribute(&self) -> Option<&str> {
		self.source.attribute()
	}

	fn read_source(&self, entity: &dyn Entity) -> Option<AttrValue> {
		match &self.source {
			Source::Attribute(path) => resolve_source(entity, path),
			Source::Entity => None,
		}
	}

	/// Render this field for `entity`
	pub fn to_representation(&self, entity: &dyn Entity, context: &SerializerContext) -> Result<Value, HalError> {
		let value = match &self.kind {
			FieldKind::Plain(_) => plain::to_representation(self.read_source(entity)),
			FieldKind::Method(method) => method.get_value(entity, context)?,
			FieldKind::Identity(resolver) => resolver.href(entity, context)?,
			FieldKind::Link(resolver) => match &self.source {
				Source::Entity => resolver.link_object(entity, context)?,
				Source::Attribute(_) => match self.read_source(entity) {
					None | Some(AttrValue::One(None)) => Value::Null,
					Some(AttrValue::One(Some(related))) => resolver.link_object(related.as_ref(), context)?,
					Some(AttrValue::Many(items)) => Value::Array(
						items
							.iter()
							.map(|item| resolver.link_object(item.as_ref(), context))
							.collect::<Result<Vec<_>, _>>()?,
					),
					Some(AttrValue::Scalar(scalar)) if scalar.is_null() => Value::Null,
					Some(AttrValue::Scalar(_)) => {
						return Err(HalError::improperly_configured(format!(
							"Field `{}` is linked but its source is not a relation.",
							self.name
						)));
					}
				},
			},
			FieldKind::Embedded(nested) => match &self.source {
				Source::Entity => nested.to_representation(entity, context)?,
				Source::Attribute(_) => match self.read_source(entity) {
					None | Some(AttrValue::One(None)) => Value::Null,
					Some(AttrValue::One(Some(related))) => nested.to_representation(related.as_ref(), context)?,
					Some(AttrValue::Many(items)) => Value::Array(nested.serialize_many(&items, context)?),
					Some(AttrValue::Scalar(scalar)) if scalar.is_null() => Value::Null,
					Some(AttrValue::Scalar(_)) => {
						return Err(HalError::improperly_configured(format!(
							"Field `{}` is embedded but its source is not a relation.",
							self.name
						)));
					}
				},
			},
		};

		Ok(match &self.transform {
			Some(transform) => transform(value),
			None => value,
		})
	}

	/// Find this field's inbound value in a document
	///
	/// Links are accepted at the top level or under `_links`, embedded
	/// documents under `_embedded` or at the top level.
	pub fn extract<'a>(&self, data: &'a Map<String, Value>, placement: Placement) -> Option<&'a Value> {
		let nested = |key: &str| {
			data.get(key)
				.and_then(Value::as_object)
				.and_then(|section| section.get(&self.name))
		};
		match placement {
			Placement::Attributes => data.get(&self.name),
			Placement::Links => data.get(&self.name).or_else(|| nested(crate::LINKS)),
			Placement::Embedded => nested(crate::EMBEDDED).or_else(|| data.get(&self.name)),
		}
	}

	/// Parse one inbound value
	///
	/// Returns `Ok(Err(detail))` for invalid input and `Err` for failures that
	/// are not the client's fault.
	pub fn to_internal_value(
		&self,
		raw: &Value,
		context: &SerializerContext,
		partial: bool,
	) -> Result<Result<InternalValue, ErrorDetail>, HalError> {
		if raw.is_null() {
			if !self.allow_null {
				return Ok(Err(ErrorDetail::message(plain::NULL)));
			}
			return Ok(Ok(match &self.kind {
				FieldKind::Link(_) if self.many => InternalValue::Entities(Vec::new()),
				FieldKind::Link(_) => InternalValue::Entity(None),
				FieldKind::Embedded(_) => InternalValue::Nested(None),
				_ => InternalValue::Scalar(crate::entity::ScalarValue::Null),
			}));
		}

		match &self.kind {
			FieldKind::Plain(info) => Ok(plain::to_internal_value(info.as_ref(), raw)
				.map(InternalValue::Scalar)
				.map_err(ErrorDetail::Messages)),
			FieldKind::Link(resolver) => {
				let persistence = context.persistence().ok_or_else(|| {
					HalError::improperly_configured(
						"Parsing hyperlinks requires a persistence layer in the serializer context.",
					)
				})?;
				if !self.many {
					return Ok(resolver
						.parse(raw, context, persistence.as_ref())
						.map(|entity| InternalValue::Entity(Some(entity)))
						.map_err(ErrorDetail::message));
				}
				let Some(items) = raw.as_array() else {
					return Ok(Err(ErrorDetail::message(not_a_list(raw))));
				};
				if items.is_empty() && !self.allow_empty {
					return Ok(Err(ErrorDetail::message("This list may not be empty.")));
				}
				let mut entities = Vec::with_capacity(items.len());
				let mut messages = Vec::new();
				for item in items {
					match resolver.parse(item, context, persistence.as_ref()) {
						Ok(entity) => entities.push(entity),
						Err(message) => messages.push(message),
					}
				}
				if messages.is_empty() {
					Ok(Ok(InternalValue::Entities(entities)))
				} else {
					Ok(Err(ErrorDetail::Messages(messages)))
				}
			}
			FieldKind::Embedded(nested) => {
				if !self.many {
					return match nested.parse(raw, context, partial) {
						Ok(attributes) => Ok(Ok(InternalValue::Nested(Some(attributes)))),
						Err(HalError::Validation(errors)) => Ok(Err(ErrorDetail::Nested(errors))),
						Err(err) => Err(err),
					};
				}
				let Some(items) = raw.as_array() else {
					return Ok(Err(ErrorDetail::message(not_a_list(raw))));
				};
				if items.is_empty() && !self.allow_empty {
					return Ok(Err(ErrorDetail::message("This list may not be empty.")));
				}
				let mut parsed = Vec::with_capacity(items.len());
				let mut item_errors = Vec::with_capacity(items.len());
				let mut failed = false;
				for item in items {
					match nested.parse(item, context, partial) {
						Ok(attributes) => {
							parsed.push(attributes);
							item_errors.push(Default::default());
						}
						Err(HalError::Validation(errors)) => {
							failed = true;
							item_errors.push(errors);
						}
						Err(err) => return Err(err),
					}
				}
				if failed {
					Ok(Err(ErrorDetail::Items(item_errors)))
				} else {
					Ok(Ok(InternalValue::NestedMany(parsed)))
				}
			}
			FieldKind::Identity(_) | FieldKind::Method(_) => Err(HalError::improperly_configured(format!(
				"Field `{}` is read-only and cannot be parsed.",
				self.name
			))),
		}
	}
}

fn not_a_list(raw: &Value) -> String {
	format!("Expected a list of items but got type \"{}\".", type_name(raw))
}

impl fmt::Debug for FieldSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldSpec")
			.field("name", &self.name)
			.field("kind", &self.kind_name())
			.field("source", &self.source)
			.field("read_only", &self.read_only)
			.field("required", &self.required)
			.field("many", &self.many)
			.finish()
	}
}
