//! Declarative serializer configuration
//!
//! [`HalSerializerConfig`] plays the role of a serializer's `Meta` options
//! plus its declared fields. It is turned into an immutable
//! [`HalModelSerializer`] once, by [`HalSerializerConfig::build`].

use crate::classifier::FieldClassifier;
use crate::error::HalError;
use crate::fields::{MethodField, Transform};
use crate::meta::ModelRegistry;
use crate::serializer::HalModelSerializer;
use crate::settings::HalSettings;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-field keyword overrides (`extra_kwargs`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOverrides {
	pub read_only: Option<bool>,
	pub required: Option<bool>,
	pub allow_null: Option<bool>,
	pub source: Option<String>,
	pub view_name: Option<String>,
	pub lookup_fields: Option<Vec<String>>,
	pub format: Option<String>,
}

impl FieldOverrides {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn read_only(mut self) -> Self {
		self.read_only = Some(true);
		self
	}

	pub fn required(mut self, required: bool) -> Self {
		self.required = Some(required);
		self
	}

	pub fn allow_null(mut self) -> Self {
		self.allow_null = Some(true);
		self
	}

	pub fn source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	pub fn view_name(mut self, view_name: impl Into<String>) -> Self {
		self.view_name = Some(view_name.into());
		self
	}

	pub fn lookup_fields<I, S>(mut self, lookup_fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.lookup_fields = Some(lookup_fields.into_iter().map(Into::into).collect());
		self
	}

	pub fn format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}

	/// Layer `other` on top of `self`
	pub fn merge(mut self, other: &FieldOverrides) -> Self {
		self.read_only = other.read_only.or(self.read_only);
		self.required = other.required.or(self.required);
		self.allow_null = other.allow_null.or(self.allow_null);
		self.source = other.source.clone().or(self.source);
		self.view_name = other.view_name.clone().or(self.view_name);
		self.lookup_fields = other.lookup_fields.clone().or(self.lookup_fields);
		self.format = other.format.clone().or(self.format);
		self
	}
}

/// Kind of an explicitly declared field
#[derive(Debug, Clone)]
pub enum DeclaredKind {
	Link,
	Embedded(Arc<HalModelSerializer>),
	Method(MethodField),
	Plain,
}

/// An explicitly declared field; its kind always wins over classification
///
/// # Examples
///
/// ```
/// use reinhardt_hal_serializers::config::DeclaredField;
///
/// let poll = DeclaredField::link().view_name("poll-detail").read_only();
/// assert!(poll.overrides().read_only.unwrap_or(false));
/// ```
#[derive(Debug, Clone)]
pub struct DeclaredField {
	kind: DeclaredKind,
	many: Option<bool>,
	overrides: FieldOverrides,
}

impl DeclaredField {
	fn of(kind: DeclaredKind) -> Self {
		Self {
			kind,
			many: None,
			overrides: FieldOverrides::default(),
		}
	}

	/// A hyperlinked relation
	pub fn link() -> Self {
		Self::of(DeclaredKind::Link)
	}

	/// A relation embedded through `serializer`
	pub fn embedded(serializer: impl Into<Arc<HalModelSerializer>>) -> Self {
		Self::of(DeclaredKind::Embedded(serializer.into()))
	}

	/// A read-only computed value
	pub fn method(method: MethodField) -> Self {
		Self::of(DeclaredKind::Method(method))
	}

	pub fn plain() -> Self {
		Self::of(DeclaredKind::Plain)
	}

	pub fn many(mut self, many: bool) -> Self {
		self.many = Some(many);
		self
	}

	pub fn read_only(mut self) -> Self {
		self.overrides = self.overrides.read_only();
		self
	}

	pub fn required(mut self, required: bool) -> Self {
		self.overrides = self.overrides.required(required);
		self
	}

	pub fn allow_null(mut self) -> Self {
		self.overrides = self.overrides.allow_null();
		self
	}

	pub fn source(mut self, source: impl Into<String>) -> Self {
		self.overrides = self.overrides.source(source);
		self
	}

	pub fn view_name(mut self, view_name: impl Into<String>) -> Self {
		self.overrides = self.overrides.view_name(view_name);
		self
	}

	pub fn lookup_fields<I, S>(mut self, lookup_fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.overrides = self.overrides.lookup_fields(lookup_fields);
		self
	}

	pub fn format(mut self, format: impl Into<String>) -> Self {
		self.overrides = self.overrides.format(format);
		self
	}

	pub fn kind(&self) -> &DeclaredKind {
		&self.kind
	}

	pub fn declared_many(&self) -> Option<bool> {
		self.many
	}

	pub fn overrides(&self) -> &FieldOverrides {
		&self.overrides
	}
}

/// Serializer options for one model
///
/// # Examples
///
/// ```
/// use reinhardt_hal_serializers::config::HalSerializerConfig;
///
/// let config = HalSerializerConfig::new("Choice")
///     .exclude(["poll"])
///     .depth(1);
/// assert_eq!(config.model(), "Choice");
/// ```
#[derive(Clone, Default)]
pub struct HalSerializerConfig {
	pub(crate) model: String,
	pub(crate) view_name: Option<String>,
	pub(crate) lookup_fields: Option<Vec<String>>,
	pub(crate) format: Option<String>,
	pub(crate) fields: Option<Vec<String>>,
	pub(crate) exclude: Option<Vec<String>>,
	pub(crate) depth: usize,
	pub(crate) read_only_fields: Vec<String>,
	pub(crate) extra_kwargs: IndexMap<String, FieldOverrides>,
	pub(crate) declared: IndexMap<String, DeclaredField>,
	pub(crate) additional_embedded: Vec<String>,
	pub(crate) transforms: HashMap<String, Transform>,
}

impl HalSerializerConfig {
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			..Self::default()
		}
	}

	pub fn model(&self) -> &str {
		&self.model
	}

	/// View serving this model's detail documents
	pub fn view_name(mut self, view_name: impl Into<String>) -> Self {
		self.view_name = Some(view_name.into());
		self
	}

	pub fn lookup_field(self, lookup_field: impl Into<String>) -> Self {
		let lookup_field: String = lookup_field.into();
		self.lookup_fields([lookup_field])
	}

	/// Composite lookups, in URL order
	pub fn lookup_fields<I, S>(mut self, lookup_fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.lookup_fields = Some(lookup_fields.into_iter().map(Into::into).collect());
		self
	}

	pub fn format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}

	/// Allow-list of fields; also fixes output order
	pub fn fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.fields = Some(fields.into_iter().map(Into::into).collect());
		self
	}

	pub fn exclude<I, S>(mut self, exclude: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.exclude = Some(exclude.into_iter().map(Into::into).collect());
		self
	}

	/// Embed relations this many levels deep instead of linking them
	pub fn depth(mut self, depth: usize) -> Self {
		self.depth = depth;
		self
	}

	pub fn read_only_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.read_only_fields.extend(fields.into_iter().map(Into::into));
		self
	}

	pub fn extra_kwargs(mut self, field: impl Into<String>, overrides: FieldOverrides) -> Self {
		self.extra_kwargs.insert(field.into(), overrides);
		self
	}

	pub fn declare(mut self, name: impl Into<String>, field: DeclaredField) -> Self {
		self.declared.insert(name.into(), field);
		self
	}

	/// Render these fields under `_embedded` instead of the top level
	pub fn additional_embedded<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.additional_embedded
			.extend(fields.into_iter().map(Into::into));
		self
	}

	/// Register a post-processing hook for one field's rendered value
	pub fn transform<F>(mut self, field: impl Into<String>, transform: F) -> Self
	where
		F: Fn(Value) -> Value + Send + Sync + 'static,
	{
		self.transforms.insert(field.into(), Arc::new(transform));
		self
	}

	/// Classify every field and freeze the result
	pub fn build(&self, registry: &ModelRegistry, settings: &HalSettings) -> Result<HalModelSerializer, HalError> {
		FieldClassifier::new(self, registry, settings)?.build()
	}
}

impl std::fmt::Debug for HalSerializerConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HalSerializerConfig")
			.field("model", &self.model)
			.field("view_name", &self.view_name)
			.field("lookup_fields", &self.lookup_fields)
			.field("fields", &self.fields)
			.field("exclude", &self.exclude)
			.field("depth", &self.depth)
			.field("declared", &self.declared.keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_overrides_merge_prefers_other() {
		let base = FieldOverrides::new().source("poll").required(true);
		let merged = base.merge(&FieldOverrides::new().required(false).format("json"));
		assert_eq!(merged.source.as_deref(), Some("poll"));
		assert_eq!(merged.required, Some(false));
		assert_eq!(merged.format.as_deref(), Some("json"));
	}

	#[rstest]
	fn test_declared_field_builder() {
		let field = DeclaredField::link()
			.many(true)
			.lookup_fields(["poll__pk", "pk"]);
		assert!(matches!(field.kind(), DeclaredKind::Link));
		assert_eq!(field.declared_many(), Some(true));
		assert_eq!(
			field.overrides().lookup_fields.as_deref(),
			Some(&["poll__pk".to_string(), "pk".to_string()][..])
		);
	}

	#[rstest]
	fn test_config_keeps_declaration_order() {
		let config = HalSerializerConfig::new("Poll")
			.declare("choices", DeclaredField::link().many(true))
			.declare("owner", DeclaredField::plain());
		let names: Vec<_> = config.declared.keys().cloned().collect();
		assert_eq!(names, vec!["choices", "owner"]);
	}
}
