//! Model metadata introspection
//!
//! Describes the scalar fields, forward and reverse relations and computed
//! properties of a model type. Serializers read this once at build time to
//! derive their field specs.

use crate::entity::ScalarValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Storage type of a scalar model field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
	Integer,
	Float,
	Boolean,
	Text,
	Date,
	DateTime,
	Json,
}

/// Metadata for one scalar model field
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarFieldInfo {
	pub name: String,
	pub kind: ScalarKind,
	pub nullable: bool,
	pub blank: bool,
	pub default: Option<ScalarValue>,
	pub max_length: Option<usize>,
	pub primary_key: bool,
	pub editable: bool,
}

impl ScalarFieldInfo {
	pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
		Self {
			name: name.into(),
			kind,
			nullable: false,
			blank: false,
			default: None,
			max_length: None,
			primary_key: false,
			editable: true,
		}
	}

	/// Auto-incrementing integer primary key
	pub fn auto_pk(name: impl Into<String>) -> Self {
		let mut field = Self::new(name, ScalarKind::Integer);
		field.primary_key = true;
		field.editable = false;
		field
	}

	pub fn nullable(mut self) -> Self {
		self.nullable = true;
		self
	}

	pub fn blank(mut self) -> Self {
		self.blank = true;
		self
	}

	pub fn default_value(mut self, value: impl Into<ScalarValue>) -> Self {
		self.default = Some(value.into());
		self
	}

	pub fn max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}

	pub fn not_editable(mut self) -> Self {
		self.editable = false;
		self
	}

	/// Whether inbound data must supply this field
	pub fn is_required(&self) -> bool {
		!(self.nullable || self.blank || self.default.is_some() || !self.editable)
	}
}

/// Metadata for one relation
#[derive(Debug, Clone, PartialEq)]
pub struct RelationInfo {
	pub name: String,
	pub related_model: String,
	pub many: bool,
	/// Declared on the related model (e.g. `Poll.choices` for `Choice.poll`)
	pub reverse: bool,
	/// Many-to-many through an explicit intermediate model
	pub has_through_model: bool,
	pub nullable: bool,
	pub blank: bool,
}

impl RelationInfo {
	/// Foreign key style relation
	pub fn forward(name: impl Into<String>, related_model: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			related_model: related_model.into(),
			many: false,
			reverse: false,
			has_through_model: false,
			nullable: false,
			blank: false,
		}
	}

	/// Many-to-many relation declared on this model
	pub fn many_to_many(name: impl Into<String>, related_model: impl Into<String>) -> Self {
		let mut relation = Self::forward(name, related_model);
		relation.many = true;
		relation
	}

	/// Reverse accessor of a relation declared on another model
	pub fn reverse(name: impl Into<String>, related_model: impl Into<String>, many: bool) -> Self {
		let mut relation = Self::forward(name, related_model);
		relation.many = many;
		relation.reverse = true;
		relation
	}

	pub fn nullable(mut self) -> Self {
		self.nullable = true;
		self
	}

	pub fn blank(mut self) -> Self {
		self.blank = true;
		self
	}

	pub fn through_model(mut self) -> Self {
		self.has_through_model = true;
		self
	}

	pub fn is_required(&self) -> bool {
		!(self.reverse || self.nullable || self.blank)
	}
}

/// Metadata describing a model type
///
/// # Examples
///
/// ```
/// use reinhardt_hal_serializers::meta::{ModelMeta, RelationInfo, ScalarFieldInfo, ScalarKind};
///
/// let choice = ModelMeta::new("polls", "Choice")
///     .field(ScalarFieldInfo::auto_pk("id"))
///     .relation(RelationInfo::forward("poll", "Poll"))
///     .field(ScalarFieldInfo::new("choice_text", ScalarKind::Text).max_length(200))
///     .field(ScalarFieldInfo::new("votes", ScalarKind::Integer).default_value(0));
///
/// assert_eq!(choice.pk_name(), "id");
/// assert_eq!(choice.model_name(), "choice");
/// assert_eq!(choice.verbose_name_plural(), "choices");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMeta {
	app_label: String,
	object_name: String,
	verbose_name_plural: Option<String>,
	/// Declaration order of scalar fields and forward relations
	declared: Vec<String>,
	fields: Vec<ScalarFieldInfo>,
	relations: Vec<RelationInfo>,
	properties: Vec<String>,
}

impl ModelMeta {
	pub fn new(app_label: impl Into<String>, object_name: impl Into<String>) -> Self {
		Self {
			app_label: app_label.into(),
			object_name: object_name.into(),
			verbose_name_plural: None,
			declared: Vec::new(),
			fields: Vec::new(),
			relations: Vec::new(),
			properties: Vec::new(),
		}
	}

	pub fn field(mut self, field: ScalarFieldInfo) -> Self {
		self.declared.push(field.name.clone());
		self.fields.push(field);
		self
	}

	pub fn relation(mut self, relation: RelationInfo) -> Self {
		if !relation.reverse {
			self.declared.push(relation.name.clone());
		}
		self.relations.push(relation);
		self
	}

	/// Register a read-only computed attribute
	pub fn property(mut self, name: impl Into<String>) -> Self {
		self.properties.push(name.into());
		self
	}

	pub fn verbose_name_plural(&self) -> String {
		self.verbose_name_plural
			.clone()
			.unwrap_or_else(|| format!("{}s", self.model_name()))
	}

	pub fn with_verbose_name_plural(mut self, name: impl Into<String>) -> Self {
		self.verbose_name_plural = Some(name.into());
		self
	}

	pub fn app_label(&self) -> &str {
		&self.app_label
	}

	/// Class-style name, e.g. `Choice`
	pub fn object_name(&self) -> &str {
		&self.object_name
	}

	/// Lowercased model name, e.g. `choice`
	pub fn model_name(&self) -> String {
		self.object_name.to_lowercase()
	}

	pub fn pk_field(&self) -> Option<&ScalarFieldInfo> {
		self.fields.iter().find(|f| f.primary_key)
	}

	pub fn pk_name(&self) -> &str {
		self.pk_field().map(|f| f.name.as_str()).unwrap_or("id")
	}

	pub fn scalar(&self, name: &str) -> Option<&ScalarFieldInfo> {
		if name == crate::entity::PK_ALIAS {
			return self.pk_field();
		}
		self.fields.iter().find(|f| f.name == name)
	}

	pub fn relation_info(&self, name: &str) -> Option<&RelationInfo> {
		self.relations.iter().find(|r| r.name == name)
	}

	pub fn has_property(&self, name: &str) -> bool {
		self.properties.iter().any(|p| p == name)
	}

	pub fn scalar_fields(&self) -> &[ScalarFieldInfo] {
		&self.fields
	}

	pub fn relations(&self) -> &[RelationInfo] {
		&self.relations
	}

	pub fn forward_relations(&self) -> impl Iterator<Item = &RelationInfo> {
		self.relations.iter().filter(|r| !r.reverse)
	}

	pub fn reverse_relations(&self) -> impl Iterator<Item = &RelationInfo> {
		self.relations.iter().filter(|r| r.reverse)
	}

	/// Whether `name` is any kind of attribute of the model
	pub fn has_attribute(&self, name: &str) -> bool {
		self.scalar(name).is_some() || self.relation_info(name).is_some() || self.has_property(name)
	}

	/// Default field names: primary key first, then scalar fields and forward
	/// relations in declaration order
	pub fn default_field_names(&self) -> Vec<String> {
		let pk = self.pk_name().to_string();
		let mut names = vec![pk.clone()];
		names.extend(self.declared.iter().filter(|n| **n != pk).cloned());
		names
	}
}

/// Registry of model metadata keyed by model name
///
/// Needed to build nested serializers for related models.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
	models: HashMap<String, Arc<ModelMeta>>,
}

impl ModelRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, meta: ModelMeta) -> Arc<ModelMeta> {
		let meta = Arc::new(meta);
		self.models
			.insert(meta.object_name().to_string(), Arc::clone(&meta));
		meta
	}

	pub fn with(mut self, meta: ModelMeta) -> Self {
		self.register(meta);
		self
	}

	pub fn get(&self, object_name: &str) -> Option<Arc<ModelMeta>> {
		self.models.get(object_name).cloned()
	}

	pub fn contains(&self, object_name: &str) -> bool {
		self.models.contains_key(object_name)
	}

	pub fn model_names(&self) -> Vec<String> {
		self.models.keys().cloned().collect()
	}
}
