//! HAL model serializer
//!
//! [`HalModelSerializer`] is the frozen result of classifying a
//! [`HalSerializerConfig`](crate::config::HalSerializerConfig). Rendering
//! walks its partition once: `_links` first, then plain attributes, then
//! `_embedded`. Parsing goes the other way and collects every field error
//! before failing.

use crate::classifier::Classification;
use crate::context::SerializerContext;
use crate::entity::{AttrValue, Entity, ScalarValue};
use crate::error::{HalError, ValidationErrors};
use crate::fields::link::type_name;
use crate::fields::{EmbeddedField, FieldKind, FieldSpec, LinkResolver, LinksField, Placement, SELF_LINK, plain};
use crate::meta::ModelMeta;
use crate::persistence::{Attributes, Persistence, RelatedInput};
use crate::{EMBEDDED, LINKS};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// A parsed inbound value, before it is written to an entity
#[derive(Debug, Clone)]
pub enum InternalValue {
	Scalar(ScalarValue),
	/// A single linked entity, `None` for an explicit null
	Entity(Option<Arc<dyn Entity>>),
	/// Linked entities of a collection relation
	Entities(Vec<Arc<dyn Entity>>),
	/// One embedded document
	Nested(Option<AttributeSet>),
	/// An embedded collection
	NestedMany(Vec<AttributeSet>),
}

/// Validated attributes keyed by attribute name
pub type AttributeSet = IndexMap<String, InternalValue>;

/// Serializer for one model, HAL flavored
#[derive(Debug, Clone)]
pub struct HalModelSerializer {
	meta: Arc<ModelMeta>,
	self_link: LinkResolver,
	attributes: Vec<FieldSpec>,
	links: LinksField,
	embedded: EmbeddedField,
}

impl HalModelSerializer {
	pub(crate) fn from_parts(meta: Arc<ModelMeta>, classification: Classification) -> Self {
		let Classification {
			self_link,
			attributes,
			links,
			embedded,
		} = classification;
		Self {
			meta,
			links: LinksField::new(Some(self_link.clone()), links),
			self_link,
			attributes,
			embedded: EmbeddedField::new(embedded),
		}
	}

	pub fn meta(&self) -> &ModelMeta {
		&self.meta
	}

	/// Object name of the serialized model
	pub fn model(&self) -> &str {
		self.meta.object_name()
	}

	/// Name used for collections of this resource, e.g. `polls`
	pub fn plural_name(&self) -> String {
		self.meta.verbose_name_plural()
	}

	pub fn self_link(&self) -> &LinkResolver {
		&self.self_link
	}

	pub fn attributes(&self) -> &[FieldSpec] {
		&self.attributes
	}

	pub fn links(&self) -> &LinksField {
		&self.links
	}

	pub fn embedded(&self) -> &EmbeddedField {
		&self.embedded
	}

	/// Every field, in document order
	pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
		self.links
			.relations()
			.iter()
			.chain(self.attributes.iter())
			.chain(self.embedded.fields().iter())
	}

	pub fn field(&self, name: &str) -> Option<&FieldSpec> {
		self.fields().find(|field| field.name == name)
	}

	/// Render one entity
	///
	/// `_embedded` is only present when the serializer has embedded fields.
	pub fn to_representation(&self, entity: &dyn Entity, context: &SerializerContext) -> Result<Value, HalError> {
		let mut document = Map::new();
		document.insert(
			LINKS.to_string(),
			Value::Object(self.links.to_representation(entity, context)?),
		);
		for field in &self.attributes {
			document.insert(field.name.clone(), field.to_representation(entity, context)?);
		}
		if !self.embedded.is_empty() {
			document.insert(
				EMBEDDED.to_string(),
				Value::Object(self.embedded.to_representation(entity, context)?),
			);
		}
		Ok(Value::Object(document))
	}

	pub fn serialize_many(
		&self,
		entities: &[Arc<dyn Entity>],
		context: &SerializerContext,
	) -> Result<Vec<Value>, HalError> {
		entities
			.iter()
			.map(|entity| self.to_representation(entity.as_ref(), context))
			.collect()
	}

	/// Validate a full inbound document
	pub fn to_internal_value(&self, data: &Value, context: &SerializerContext) -> Result<AttributeSet, HalError> {
		self.parse(data, context, false)
	}

	/// Validate a partial document; missing fields are not an error
	pub fn to_internal_value_partial(
		&self,
		data: &Value,
		context: &SerializerContext,
	) -> Result<AttributeSet, HalError> {
		self.parse(data, context, true)
	}

	/// Shared parse routine
	///
	/// Fails with [`HalError::Validation`] holding the errors of every
	/// invalid field at once.
	pub fn parse(&self, data: &Value, context: &SerializerContext, partial: bool) -> Result<AttributeSet, HalError> {
		let Some(object) = data.as_object() else {
			return Err(ValidationErrors::non_field(format!(
				"Invalid data. Expected a dictionary, but got {}.",
				type_name(data)
			))
			.into());
		};

		let mut errors = ValidationErrors::new();
		let mut attributes = AttributeSet::new();
		let sections = [
			(Placement::Attributes, &self.attributes[..]),
			(Placement::Links, self.links.relations()),
			(Placement::Embedded, self.embedded.fields()),
		];
		for (placement, fields) in sections {
			for field in fields.iter().filter(|field| !field.read_only) {
				let Some(attribute) = field.attribute() else {
					continue;
				};
				match field.extract(object, placement) {
					None if field.required && !partial => errors.add(field.name.clone(), plain::REQUIRED),
					None => {}
					Some(raw) => match field.to_internal_value(raw, context, partial)? {
						Ok(value) => {
							attributes.insert(attribute.to_string(), value);
						}
						Err(detail) => errors.insert(field.name.clone(), detail),
					},
				}
			}
		}

		errors.into_result(attributes).map_err(HalError::from)
	}

	/// The identity of an inbound document: its `_links.self.href`
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_hal_serializers::HalModelSerializer;
	/// use serde_json::json;
	///
	/// let document = json!({"_links": {"self": {"href": "http://testserver/poll/1"}}});
	/// assert_eq!(
	///     HalModelSerializer::get_identity(&document).as_deref(),
	///     Some("http://testserver/poll/1")
	/// );
	/// assert_eq!(HalModelSerializer::get_identity(&json!({"id": 1})), None);
	/// ```
	pub fn get_identity(data: &Value) -> Option<String> {
		data.get(LINKS)?
			.get(SELF_LINK)?
			.get("href")?
			.as_str()
			.map(str::to_string)
	}

	/// Parse `data` and create or update an entity with it
	pub fn save(
		&self,
		data: &Value,
		instance: Option<&Arc<dyn Entity>>,
		context: &SerializerContext,
	) -> Result<Arc<dyn Entity>, HalError> {
		let attributes = self.to_internal_value(data, context)?;
		match instance {
			Some(instance) => self.update(instance, attributes, context),
			None => self.create(attributes, context),
		}
	}

	/// Persist a new entity, children included
	///
	/// Forward embedded singles are created first so the parent can point at
	/// them. Collections are attached once the parent exists.
	pub fn create(&self, attributes: AttributeSet, context: &SerializerContext) -> Result<Arc<dyn Entity>, HalError> {
		let persistence = Self::persistence(context)?;
		let (flat, deferred) = self.split(attributes, context)?;
		let entity = persistence.create(self.model(), flat)?;
		self.apply_collections(&entity, deferred, context, false)?;
		debug!(model = self.model(), "created entity");
		Ok(entity)
	}

	/// Write attributes to an existing entity
	///
	/// Linked collections are replaced; embedded children are added.
	pub fn update(
		&self,
		entity: &Arc<dyn Entity>,
		attributes: AttributeSet,
		context: &SerializerContext,
	) -> Result<Arc<dyn Entity>, HalError> {
		let persistence = Self::persistence(context)?;
		let (flat, deferred) = self.split(attributes, context)?;
		let entity = persistence.save(entity, flat)?;
		self.apply_collections(&entity, deferred, context, true)?;
		debug!(model = self.model(), "updated entity");
		Ok(entity)
	}

	fn persistence(context: &SerializerContext) -> Result<&dyn Persistence, HalError> {
		context
			.persistence()
			.map(|persistence| persistence.as_ref())
			.ok_or_else(|| {
				HalError::improperly_configured(
					"Saving requires a persistence layer in the serializer context.",
				)
			})
	}

	fn nested_for(&self, attribute: &str) -> Result<&HalModelSerializer, HalError> {
		self.fields()
			.filter(|field| field.attribute() == Some(attribute))
			.find_map(|field| match &field.kind {
				FieldKind::Embedded(nested) => Some(nested.as_ref()),
				_ => None,
			})
			.ok_or_else(|| {
				HalError::improperly_configured(format!(
					"No embedded serializer writes attribute `{}` of `{}`.",
					attribute,
					self.model()
				))
			})
	}

	fn is_forward_single(&self, attribute: &str) -> bool {
		self.meta
			.relation_info(attribute)
			.is_some_and(|relation| !relation.reverse && !relation.many)
	}

	// Separate what can be written with the entity itself from collections.
	fn split(
		&self,
		attributes: AttributeSet,
		context: &SerializerContext,
	) -> Result<(Attributes, Vec<(String, InternalValue)>), HalError> {
		let mut flat = Attributes::new();
		let mut deferred = Vec::new();
		for (attribute, value) in attributes {
			match value {
				InternalValue::Scalar(scalar) => {
					flat.insert(attribute, AttrValue::Scalar(scalar));
				}
				InternalValue::Entity(related) => {
					flat.insert(attribute, AttrValue::One(related));
				}
				InternalValue::Nested(None) => {
					flat.insert(attribute, AttrValue::One(None));
				}
				InternalValue::Nested(Some(child)) if self.is_forward_single(&attribute) => {
					let created = self.nested_for(&attribute)?.create(child, context)?;
					flat.insert(attribute, AttrValue::One(Some(created)));
				}
				other => deferred.push((attribute, other)),
			}
		}
		Ok((flat, deferred))
	}

	fn apply_collections(
		&self,
		entity: &Arc<dyn Entity>,
		deferred: Vec<(String, InternalValue)>,
		context: &SerializerContext,
		replace: bool,
	) -> Result<(), HalError> {
		let persistence = Self::persistence(context)?;
		for (attribute, value) in deferred {
			match value {
				InternalValue::Entities(related) if replace => {
					persistence.set_collection(entity, &attribute, related)?;
				}
				InternalValue::Entities(related) => {
					for item in related {
						persistence.add_to_collection(entity, &attribute, RelatedInput::Existing(item))?;
					}
				}
				InternalValue::Nested(Some(child)) => {
					self.add_child(entity, &attribute, child, context)?;
				}
				InternalValue::NestedMany(children) => {
					for child in children {
						self.add_child(entity, &attribute, child, context)?;
					}
				}
				_ => {}
			}
		}
		Ok(())
	}

	fn add_child(
		&self,
		parent: &Arc<dyn Entity>,
		attribute: &str,
		child: AttributeSet,
		context: &SerializerContext,
	) -> Result<(), HalError> {
		let persistence = Self::persistence(context)?;
		let nested = self.nested_for(attribute)?;
		let (flat, deferred) = nested.split(child, context)?;
		let created = persistence.add_to_collection(
			parent,
			attribute,
			RelatedInput::New {
				model: nested.model().to_string(),
				attributes: flat,
			},
		)?;
		nested.apply_collections(&created, deferred, context, false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{DeclaredField, HalSerializerConfig};
	use crate::context::RequestContext;
	use crate::entity::Record;
	use crate::error::ErrorDetail;
	use crate::meta::{ModelRegistry, RelationInfo, ScalarFieldInfo, ScalarKind};
	use crate::persistence::MemoryStore;
	use crate::reverse::RouteTable;
	use crate::settings::HalSettings;
	use assert_json_diff::assert_json_eq;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn registry() -> Arc<ModelRegistry> {
		Arc::new(
			ModelRegistry::new()
				.with(
					ModelMeta::new("polls", "Poll")
						.field(ScalarFieldInfo::auto_pk("id"))
						.field(ScalarFieldInfo::new("question", ScalarKind::Text).max_length(200))
						.relation(RelationInfo::reverse("choices", "Choice", true)),
				)
				.with(
					ModelMeta::new("polls", "Choice")
						.field(ScalarFieldInfo::auto_pk("id"))
						.relation(RelationInfo::forward("poll", "Poll"))
						.field(ScalarFieldInfo::new("choice_text", ScalarKind::Text).max_length(200))
						.field(ScalarFieldInfo::new("votes", ScalarKind::Integer).default_value(0)),
				),
		)
	}

	fn context(store: Arc<MemoryStore>) -> SerializerContext {
		let routes = RouteTable::new()
			.route("poll-detail", "/poll/{pk}")
			.route("choice-detail", "/choice/{pk}");
		SerializerContext::new(Arc::new(routes))
			.with_request(RequestContext::parse("http://testserver/").unwrap())
			.with_persistence(store)
	}

	fn build(config: HalSerializerConfig, registry: &ModelRegistry) -> HalModelSerializer {
		config.build(registry, &HalSettings::default()).unwrap()
	}

	#[rstest]
	fn test_links_come_first_and_embedded_is_omitted(registry: Arc<ModelRegistry>) {
		let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
		let poll = store.insert(Record::new("Poll").with("question", "Lunch?")).unwrap();
		let serializer = build(HalSerializerConfig::new("Poll"), &registry);

		let document = serializer.to_representation(poll.as_ref(), &context(store)).unwrap();
		let keys: Vec<_> = document.as_object().unwrap().keys().cloned().collect();
		assert_eq!(keys, vec!["_links", "id", "question"]);
		assert_json_eq!(
			document,
			json!({
				"_links": {"self": {"href": "http://testserver/poll/1"}},
				"id": 1,
				"question": "Lunch?"
			})
		);
	}

	#[rstest]
	fn test_parse_aggregates_errors(registry: Arc<ModelRegistry>) {
		let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
		let serializer = build(HalSerializerConfig::new("Choice"), &registry);

		let err = serializer
			.to_internal_value(
				&json!({"choice_text": "", "votes": "many", "poll": "http://testserver/poll/9"}),
				&context(store),
			)
			.unwrap_err();
		let errors = err.as_validation().unwrap();
		assert_eq!(errors.len(), 3);
		assert_eq!(
			errors.get("votes"),
			Some(&ErrorDetail::message(plain::INVALID_INTEGER))
		);
	}

	#[rstest]
	fn test_non_object_payload(registry: Arc<ModelRegistry>) {
		let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
		let serializer = build(HalSerializerConfig::new("Poll"), &registry);
		let err = serializer.to_internal_value(&json!([1]), &context(store)).unwrap_err();
		assert_json_eq!(
			serde_json::to_value(err.as_validation().unwrap()).unwrap(),
			json!({"non_field_errors": ["Invalid data. Expected a dictionary, but got list."]})
		);
	}

	#[rstest]
	fn test_partial_skips_missing(registry: Arc<ModelRegistry>) {
		let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
		let serializer = build(HalSerializerConfig::new("Choice"), &registry);
		let attributes = serializer
			.to_internal_value_partial(&json!({"votes": 3}), &context(store))
			.unwrap();
		assert_eq!(attributes.len(), 1);
		assert!(matches!(attributes["votes"], InternalValue::Scalar(ScalarValue::Int(3))));
	}

	#[rstest]
	fn test_create_with_children(registry: Arc<ModelRegistry>) {
		let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
		let choices = build(HalSerializerConfig::new("Choice").exclude(["poll"]), &registry);
		let polls = build(
			HalSerializerConfig::new("Poll")
				.declare("choices", DeclaredField::embedded(choices).many(true)),
			&registry,
		);
		let context = context(Arc::clone(&store));

		let poll = polls
			.save(
				&json!({
					"question": "Lunch?",
					"_embedded": {"choices": [{"choice_text": "Sushi"}, {"choice_text": "Ramen", "votes": 2}]}
				}),
				None,
				&context,
			)
			.unwrap();

		let document = polls.to_representation(poll.as_ref(), &context).unwrap();
		assert_eq!(document["_embedded"]["choices"][0]["choice_text"], json!("Sushi"));
		assert_eq!(document["_embedded"]["choices"][0]["votes"], json!(0));
		assert_eq!(
			document["_embedded"]["choices"][1]["_links"]["self"]["href"],
			json!("http://testserver/choice/2")
		);
		assert_eq!(store.all("Choice").len(), 2);
	}

	#[rstest]
	fn test_save_without_persistence_is_misconfigured(registry: Arc<ModelRegistry>) {
		let serializer = build(HalSerializerConfig::new("Poll"), &registry);
		let context = SerializerContext::new(Arc::new(RouteTable::new()));
		let err = serializer
			.save(&json!({"question": "Lunch?"}), None, &context)
			.unwrap_err();
		assert!(matches!(err, HalError::ImproperlyConfigured(_)));
	}
}
