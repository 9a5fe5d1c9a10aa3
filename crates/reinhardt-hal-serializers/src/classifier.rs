//! Field classification
//!
//! Decides, once per serializer, what every field becomes: a plain
//! attribute, a link under `_links`, or a nested document under `_embedded`.
//!
//! The policy:
//! - an explicitly declared field keeps its declared kind;
//! - a relation becomes a link at depth 0, and a read-only embedded document
//!   (built with `depth - 1`) at greater depths;
//! - reverse relations are only included when named in `fields` or declared;
//! - relations through an explicit intermediate model are read-only.

use crate::config::{DeclaredField, DeclaredKind, FieldOverrides, HalSerializerConfig};
use crate::error::HalError;
use crate::fields::{FieldKind, FieldSpec, LinkResolver, Source};
use crate::meta::{ModelMeta, ModelRegistry, RelationInfo};
use crate::serializer::HalModelSerializer;
use crate::settings::HalSettings;
use std::sync::Arc;
use tracing::debug;

/// Deepest automatic nesting accepted
pub const MAX_DEPTH: usize = 10;

/// Field specs partitioned by document section
#[derive(Debug, Clone)]
pub struct Classification {
	pub self_link: LinkResolver,
	/// Top-level attributes, in output order
	pub attributes: Vec<FieldSpec>,
	pub links: Vec<FieldSpec>,
	pub embedded: Vec<FieldSpec>,
}

/// Turns a [`HalSerializerConfig`] into field specs for one model
pub struct FieldClassifier<'a> {
	config: &'a HalSerializerConfig,
	registry: &'a ModelRegistry,
	settings: &'a HalSettings,
	meta: Arc<ModelMeta>,
}

impl<'a> FieldClassifier<'a> {
	pub fn new(
		config: &'a HalSerializerConfig,
		registry: &'a ModelRegistry,
		settings: &'a HalSettings,
	) -> Result<Self, HalError> {
		let meta = registry.get(&config.model).ok_or_else(|| {
			HalError::improperly_configured(format!("Model `{}` is not registered.", config.model))
		})?;
		Ok(Self {
			config,
			registry,
			settings,
			meta,
		})
	}

	fn serializer_name(&self) -> String {
		format!("{}Serializer", self.meta.object_name())
	}

	/// Resolver for the document's `self` link
	pub fn self_link(&self) -> Result<LinkResolver, HalError> {
		let view_name = self
			.config
			.view_name
			.clone()
			.unwrap_or_else(|| self.settings.view_name_for(&self.meta));
		if view_name.trim().is_empty() {
			return Err(HalError::improperly_configured(format!(
				"`view_name` is missing on serializer `{}`.",
				self.serializer_name()
			)));
		}

		let lookup_fields = self
			.config
			.lookup_fields
			.clone()
			.unwrap_or_else(|| vec![self.settings.default_lookup_field.clone()]);
		if lookup_fields.is_empty() {
			return Err(HalError::improperly_configured(format!(
				"`lookup_fields` may not be empty on serializer `{}`.",
				self.serializer_name()
			)));
		}

		let mut resolver = LinkResolver::new(view_name)
			.with_lookup_fields(lookup_fields)
			.for_model(self.meta.object_name());
		if let Some(format) = &self.config.format {
			resolver = resolver.with_format(format.clone());
		}
		Ok(resolver)
	}

	/// Names of the fields to render, in output order
	pub fn field_names(&self) -> Result<Vec<String>, HalError> {
		let config = self.config;
		if config.fields.is_some() && config.exclude.is_some() {
			return Err(HalError::improperly_configured(format!(
				"Cannot set both `fields` and `exclude` options on serializer `{}`.",
				self.serializer_name()
			)));
		}
		if config.depth > MAX_DEPTH {
			return Err(HalError::improperly_configured(format!(
				"`depth` may not be greater than {}.",
				MAX_DEPTH
			)));
		}

		if let Some(fields) = &config.fields {
			if let Some(missing) = config.declared.keys().find(|name| !fields.contains(name)) {
				return Err(HalError::improperly_configured(format!(
					"Field `{}` has been declared on serializer `{}`, but is missing from `Meta.fields`.",
					missing,
					self.serializer_name()
				)));
			}
			return Ok(fields.clone());
		}

		let mut names = self.meta.default_field_names();
		for declared in config.declared.keys() {
			if !names.contains(declared) {
				names.push(declared.clone());
			}
		}
		if let Some(exclude) = &config.exclude {
			if let Some(unknown) = exclude
				.iter()
				.find(|name| !names.contains(name) && !self.meta.has_attribute(name))
			{
				return Err(HalError::improperly_configured(format!(
					"The field `{}` was included on serializer `{}` in `exclude`, but does not match any field.",
					unknown,
					self.serializer_name()
				)));
			}
			names.retain(|name| !exclude.contains(name));
		}
		Ok(names)
	}

	/// Classify every field
	pub fn classify(&self) -> Result<Classification, HalError> {
		let self_link = self.self_link()?;
		let names = self.field_names()?;

		for (option, listed) in [
			("additional_embedded", self.config.additional_embedded.iter().collect::<Vec<_>>()),
			("transform", self.config.transforms.keys().collect::<Vec<_>>()),
		] {
			if let Some(unknown) = listed.into_iter().find(|name| !names.contains(name)) {
				return Err(HalError::improperly_configured(format!(
					"Field `{}` is named in `{}` but is not included on serializer `{}`.",
					unknown,
					option,
					self.serializer_name()
				)));
			}
		}

		let mut attributes = Vec::new();
		let mut links = Vec::new();
		let mut embedded = Vec::new();
		for name in &names {
			let mut spec = self.build_field(name, &self_link)?;
			spec.transform = self.config.transforms.get(name).cloned();
			debug!(
				serializer = %self.serializer_name(),
				field = %spec.name,
				kind = spec.kind_name(),
				read_only = spec.read_only,
				many = spec.many,
				"classified field"
			);

			if spec.is_embedded() || self.config.additional_embedded.contains(name) {
				embedded.push(spec);
			} else if spec.is_link() {
				links.push(spec);
			} else {
				attributes.push(spec);
			}
		}

		Ok(Classification {
			self_link,
			attributes,
			links,
			embedded,
		})
	}

	/// Classify and freeze into a serializer
	pub fn build(self) -> Result<HalModelSerializer, HalError> {
		let classification = self.classify()?;
		Ok(HalModelSerializer::from_parts(
			Arc::clone(&self.meta),
			classification,
		))
	}

	fn overrides_for(&self, name: &str) -> FieldOverrides {
		let mut overrides = self
			.config
			.declared
			.get(name)
			.map(|declared| declared.overrides().clone())
			.unwrap_or_default();
		if let Some(extra) = self.config.extra_kwargs.get(name) {
			overrides = overrides.merge(extra);
		}
		if self.config.read_only_fields.iter().any(|field| field == name) {
			overrides.read_only = Some(true);
		}
		overrides
	}

	fn build_field(&self, name: &str, self_link: &LinkResolver) -> Result<FieldSpec, HalError> {
		let overrides = self.overrides_for(name);
		if let Some(declared) = self.config.declared.get(name) {
			let spec = self.build_declared(name, declared, &overrides, self_link)?;
			return Ok(apply_overrides(spec, &overrides));
		}

		if name == self.settings.url_field_name && !self.meta.has_attribute(name) {
			let mut spec = FieldSpec::new(name, FieldKind::Identity(self_link.clone()));
			spec.source = Source::Entity;
			spec.read_only = true;
			spec.required = false;
			return Ok(spec);
		}

		let source = overrides.source.clone().unwrap_or_else(|| name.to_string());
		let spec = if let Some(info) = self.meta.scalar(&source) {
			let mut spec = FieldSpec::new(name, FieldKind::Plain(Some(info.clone())));
			spec.read_only = !info.editable || info.primary_key;
			spec.required = info.is_required();
			spec.allow_null = info.nullable;
			spec
		} else if let Some(relation) = self.meta.relation_info(&source) {
			self.build_relation(name, relation, &overrides)?
		} else if self.meta.has_property(&source) || source.contains('.') {
			let mut spec = FieldSpec::new(name, FieldKind::Plain(None));
			spec.read_only = true;
			spec
		} else {
			return Err(HalError::improperly_configured(format!(
				"Field name `{}` is not valid for model `{}`.",
				name,
				self.meta.object_name()
			)));
		};

		let mut spec = spec;
		spec.source = Source::parse(&source);
		Ok(apply_overrides(spec, &overrides))
	}

	fn build_relation(
		&self,
		name: &str,
		relation: &RelationInfo,
		overrides: &FieldOverrides,
	) -> Result<FieldSpec, HalError> {
		let mut spec = if self.config.depth > 0 {
			let nested = HalSerializerConfig::new(relation.related_model.clone())
				.depth(self.config.depth - 1)
				.build(self.registry, self.settings)?;
			let mut spec = FieldSpec::new(name, FieldKind::Embedded(Arc::new(nested)));
			spec.read_only = true;
			spec
		} else {
			let resolver = self.relation_resolver(name, Some(&relation.related_model), overrides)?;
			let mut spec = FieldSpec::new(name, FieldKind::Link(resolver));
			spec.read_only = relation.reverse || relation.has_through_model;
			spec
		};
		spec.many = relation.many;
		spec.required = !spec.read_only && relation.is_required();
		spec.allow_null = relation.nullable;
		spec.allow_empty = !relation.many || relation.blank || relation.reverse;
		Ok(spec)
	}

	fn relation_resolver(
		&self,
		name: &str,
		related_model: Option<&str>,
		overrides: &FieldOverrides,
	) -> Result<LinkResolver, HalError> {
		let related_meta = related_model.and_then(|model| self.registry.get(model));
		let view_name = match (&overrides.view_name, &related_meta) {
			(Some(view_name), _) => view_name.clone(),
			(None, Some(related_meta)) => self.settings.view_name_for(related_meta),
			(None, None) => {
				return Err(HalError::improperly_configured(format!(
					"Could not derive a view name for link field `{}` on serializer `{}`. \
					 Set `view_name` on the field.",
					name,
					self.serializer_name()
				)));
			}
		};

		let lookup_fields = overrides
			.lookup_fields
			.clone()
			.unwrap_or_else(|| vec![self.settings.default_lookup_field.clone()]);
		let mut resolver = LinkResolver::new(view_name).with_lookup_fields(lookup_fields);
		if let Some(model) = related_model {
			resolver = resolver.for_model(model);
		}
		if let Some(format) = &overrides.format {
			resolver = resolver.with_format(format.clone());
		}
		Ok(resolver)
	}

	fn build_declared(
		&self,
		name: &str,
		declared: &DeclaredField,
		overrides: &FieldOverrides,
		self_link: &LinkResolver,
	) -> Result<FieldSpec, HalError> {
		let source = Source::parse(overrides.source.as_deref().unwrap_or(name));
		let relation = match &source {
			Source::Attribute(path) => path
				.split('.')
				.next()
				.and_then(|attribute| self.meta.relation_info(attribute)),
			Source::Entity => None,
		};

		let mut spec = match declared.kind() {
			DeclaredKind::Link => {
				let resolver = match (&source, relation) {
					(Source::Entity, _) if overrides.view_name.is_none() => self_link.clone(),
					(Source::Entity, _) => {
						self.relation_resolver(name, Some(self.meta.object_name()), overrides)?
					}
					(_, relation) => self.relation_resolver(
						name,
						relation.map(|r| r.related_model.as_str()),
						overrides,
					)?,
				};
				let mut spec = FieldSpec::new(name, FieldKind::Link(resolver));
				spec.read_only = match relation {
					Some(relation) => relation.has_through_model,
					None => true,
				};
				spec
			}
			DeclaredKind::Embedded(serializer) => {
				FieldSpec::new(name, FieldKind::Embedded(Arc::clone(serializer)))
			}
			DeclaredKind::Method(method) => {
				let mut spec = FieldSpec::new(name, FieldKind::Method(method.clone()));
				spec.read_only = true;
				spec
			}
			DeclaredKind::Plain => {
				let info = match &source {
					Source::Attribute(path) => self.meta.scalar(path).cloned(),
					Source::Entity => None,
				};
				let read_only = info
					.as_ref()
					.is_none_or(|info| !info.editable || info.primary_key);
				let mut spec = FieldSpec::new(name, FieldKind::Plain(info));
				spec.read_only = read_only;
				spec
			}
		};

		spec.source = source;
		spec.many = declared
			.declared_many()
			.or(relation.map(|r| r.many))
			.unwrap_or(false);
		spec.allow_null = relation.is_some_and(|r| r.nullable);
		spec.allow_empty = relation.is_none_or(|r| r.blank || r.reverse);
		spec.required = !spec.read_only;
		Ok(spec)
	}
}

fn apply_overrides(mut spec: FieldSpec, overrides: &FieldOverrides) -> FieldSpec {
	if let Some(read_only) = overrides.read_only {
		spec.read_only = read_only;
	}
	if let Some(required) = overrides.required {
		spec.required = required;
	}
	if let Some(allow_null) = overrides.allow_null {
		spec.allow_null = allow_null;
	}
	if spec.read_only {
		spec.required = false;
	}
	spec
}
