//! Computed, read-only fields
//!
//! A [`MethodField`] gets its value by calling a function with the entity
//! being serialized, much like a `get_<name>` method on a serializer class.

use crate::context::SerializerContext;
use crate::entity::Entity;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Signature of a method field's function
pub type MethodFn =
	Arc<dyn Fn(&dyn Entity, &SerializerContext) -> Result<Value, MethodFieldError> + Send + Sync>;

/// A field whose value is computed from the entity
///
/// # Examples
///
/// ```
/// use reinhardt_hal_serializers::fields::MethodField;
/// use reinhardt_hal_serializers::entity::Entity;
/// use serde_json::json;
///
/// let field = MethodField::new("get_shout", |entity, _context| {
///     Ok(json!(entity.model_name().to_uppercase()))
/// });
/// assert_eq!(field.method_name(), "get_shout");
/// ```
#[derive(Clone)]
pub struct MethodField {
	method_name: String,
	func: MethodFn,
}

impl MethodField {
	pub fn new<F>(method_name: impl Into<String>, func: F) -> Self
	where
		F: Fn(&dyn Entity, &SerializerContext) -> Result<Value, MethodFieldError> + Send + Sync + 'static,
	{
		Self {
			method_name: method_name.into(),
			func: Arc::new(func),
		}
	}

	pub fn method_name(&self) -> &str {
		&self.method_name
	}

	/// Compute the value for one entity
	pub fn get_value(
		&self,
		entity: &dyn Entity,
		context: &SerializerContext,
	) -> Result<Value, MethodFieldError> {
		(self.func)(entity, context)
	}
}

impl fmt::Debug for MethodField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MethodField")
			.field("method_name", &self.method_name)
			.finish_non_exhaustive()
	}
}

/// Error type for method field operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum MethodFieldError {
	/// Error computing method value
	#[error("Error computing method value for `{method}`: {message}")]
	ComputationError { method: String, message: String },
}

impl MethodFieldError {
	pub fn computation(method: impl Into<String>, message: impl Into<String>) -> Self {
		MethodFieldError::ComputationError {
			method: method.into(),
			message: message.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::entity::{AttrValue, Record, ScalarValue};
	use crate::reverse::RouteTable;
	use rstest::rstest;
	use serde_json::json;

	fn context() -> SerializerContext {
		SerializerContext::new(Arc::new(RouteTable::new()))
	}

	#[rstest]
	fn test_method_reads_entity() {
		let field = MethodField::new("get_total", |entity, _| match entity.get("votes") {
			Some(AttrValue::Scalar(ScalarValue::Int(votes))) => Ok(json!(votes * 2)),
			_ => Err(MethodFieldError::computation("get_total", "votes missing")),
		});

		let record = Record::new("Choice").with("votes", 21);
		assert_eq!(field.get_value(&record, &context()).unwrap(), json!(42));
	}

	#[rstest]
	fn test_method_error_names_method() {
		let field = MethodField::new("get_total", |_, _| {
			Err(MethodFieldError::computation("get_total", "boom"))
		});
		let err = field
			.get_value(&Record::new("Choice"), &context())
			.unwrap_err();
		assert!(err.to_string().contains("`get_total`"));
	}
}
