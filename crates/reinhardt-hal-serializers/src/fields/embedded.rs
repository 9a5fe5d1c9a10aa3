//! The `_embedded` section

use super::spec::FieldSpec;
use crate::context::SerializerContext;
use crate::entity::Entity;
use crate::error::HalError;
use serde_json::{Map, Value};

/// Named nested documents of one entity
///
/// Embedded relations render through their own serializer, recursively.
/// Other fields moved here render exactly as they would at the top level.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedField {
	fields: Vec<FieldSpec>,
}

impl EmbeddedField {
	pub fn new(fields: Vec<FieldSpec>) -> Self {
		Self { fields }
	}

	pub fn fields(&self) -> &[FieldSpec] {
		&self.fields
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// An absent single relation renders `null`
	pub fn to_representation(
		&self,
		entity: &dyn Entity,
		context: &SerializerContext,
	) -> Result<Map<String, Value>, HalError> {
		let mut embedded = Map::new();
		for field in &self.fields {
			embedded.insert(field.name.clone(), field.to_representation(entity, context)?);
		}
		Ok(embedded)
	}
}
