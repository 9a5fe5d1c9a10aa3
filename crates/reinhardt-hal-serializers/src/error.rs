//! Error types for HAL serialization
//!
//! Configuration and routing problems are fatal and surface as [`HalError`].
//! Inbound validation problems are collected into [`ValidationErrors`] so a
//! single parse call can report every invalid field at once.

use crate::fields::method::MethodFieldError;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Field name used for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Errors produced while building or running a HAL serializer
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum HalError {
	/// The serializer configuration is invalid (unknown field, both `fields`
	/// and `exclude`, missing view name, ...)
	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),

	/// URL reversal failed for a configured view
	#[error(
		"Could not resolve URL for hyperlinked relationship using view name \"{view_name}\". \
		 You may have failed to include the related model in your API, or incorrectly \
		 configured the `lookup_field` attribute on this field."
	)]
	RoutingMismatch { view_name: String },

	/// Inbound data failed validation
	#[error("Invalid data: {0}")]
	Validation(ValidationErrors),

	/// The persistence collaborator refused a write
	#[error("Persistence error: {0}")]
	Persistence(String),

	/// A computed field failed
	#[error(transparent)]
	Method(#[from] MethodFieldError),
}

impl HalError {
	/// Create a configuration error
	pub fn improperly_configured(message: impl Into<String>) -> Self {
		HalError::ImproperlyConfigured(message.into())
	}

	/// HTTP status code this error maps to
	///
	/// Validation failures are the client's fault (400); everything else is a
	/// server-side misconfiguration (500).
	pub fn status_code(&self) -> u16 {
		match self {
			HalError::Validation(_) => 400,
			_ => 500,
		}
	}

	/// Returns the validation errors if this is a validation failure
	pub fn as_validation(&self) -> Option<&ValidationErrors> {
		match self {
			HalError::Validation(errors) => Some(errors),
			_ => None,
		}
	}
}

impl From<ValidationErrors> for HalError {
	fn from(errors: ValidationErrors) -> Self {
		HalError::Validation(errors)
	}
}

/// Failure of the URL reverse-resolution collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Reverse for '{view_name}' not found: {reason}")]
pub struct NoReverseMatch {
	pub view_name: String,
	pub reason: String,
}

impl NoReverseMatch {
	pub fn new(view_name: impl Into<String>, reason: impl Into<String>) -> Self {
		Self {
			view_name: view_name.into(),
			reason: reason.into(),
		}
	}
}

/// Error detail attached to a single field
///
/// Serializes the way REST clients expect: a list of messages, a nested
/// error object, or a list of per-item error objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
	/// Messages for a scalar or link field
	Messages(Vec<String>),
	/// Errors of a single embedded document
	Nested(ValidationErrors),
	/// Errors of an embedded collection, one entry per item
	Items(Vec<ValidationErrors>),
}

impl ErrorDetail {
	pub fn message(message: impl Into<String>) -> Self {
		ErrorDetail::Messages(vec![message.into()])
	}

	/// Flat list of messages, if this is a leaf error
	pub fn messages(&self) -> Option<&[String]> {
		match self {
			ErrorDetail::Messages(messages) => Some(messages),
			_ => None,
		}
	}
}

/// Ordered, field-keyed validation errors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, ErrorDetail>);

impl ValidationErrors {
	pub fn new() -> Self {
		Self::default()
	}

	/// Errors with a single message under `non_field_errors`
	pub fn non_field(message: impl Into<String>) -> Self {
		let mut errors = Self::new();
		errors.add(NON_FIELD_ERRORS, message);
		errors
	}

	/// Append a message to a field, creating the entry if needed
	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		let field = field.into();
		match self.0.get_mut(&field) {
			Some(ErrorDetail::Messages(messages)) => messages.push(message.into()),
			_ => {
				self.0.insert(field, ErrorDetail::message(message));
			}
		}
	}

	/// Attach a structured detail to a field, replacing any previous one
	pub fn insert(&mut self, field: impl Into<String>, detail: ErrorDetail) {
		self.0.insert(field.into(), detail);
	}

	/// Merge another error set into this one
	pub fn extend(&mut self, other: ValidationErrors) {
		for (field, detail) in other.0 {
			match detail {
				ErrorDetail::Messages(messages) => {
					for message in messages {
						self.add(field.clone(), message);
					}
				}
				detail => self.insert(field, detail),
			}
		}
	}

	pub fn get(&self, field: &str) -> Option<&ErrorDetail> {
		self.0.get(field)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.0.contains_key(field)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// Convert into `Ok(value)` when empty, `Err(self)` otherwise
	pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
		if self.is_empty() { Ok(value) } else { Err(self) }
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match serde_json::to_string(self) {
			Ok(json) => f.write_str(&json),
			Err(_) => write!(f, "{} invalid field(s)", self.len()),
		}
	}
}

impl std::error::Error for ValidationErrors {}
