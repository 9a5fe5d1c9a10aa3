//! Persistence collaborator for writes
//!
//! Serializers never talk to a database. `create` and `update` hand flat
//! attribute maps to a [`Persistence`] implementation, and writable
//! hyperlinks are turned back into entities through [`Persistence::lookup`].

use crate::entity::{AttrValue, Entity, PK_ALIAS, Record, ScalarValue, lookup_value};
use crate::error::HalError;
use crate::meta::{ModelMeta, ModelRegistry};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Flat attribute values ready to be written to an entity
pub type Attributes = IndexMap<String, AttrValue>;

/// Something to attach to a collection relation
#[derive(Debug, Clone)]
pub enum RelatedInput {
	/// An entity that already exists
	Existing(Arc<dyn Entity>),
	/// A new entity to create and attach
	New { model: String, attributes: Attributes },
}

/// Write access to the data-access layer
pub trait Persistence: Send + Sync {
	/// Create and persist a new entity
	fn create(&self, model: &str, attributes: Attributes) -> Result<Arc<dyn Entity>, HalError>;

	/// Apply attributes to an existing entity and persist it
	fn save(&self, entity: &Arc<dyn Entity>, attributes: Attributes) -> Result<Arc<dyn Entity>, HalError>;

	/// Attach an entity to a collection relation, creating it first if needed
	fn add_to_collection(
		&self,
		entity: &Arc<dyn Entity>,
		field: &str,
		related: RelatedInput,
	) -> Result<Arc<dyn Entity>, HalError>;

	/// Replace the members of a collection relation
	fn set_collection(
		&self,
		entity: &Arc<dyn Entity>,
		field: &str,
		related: Vec<Arc<dyn Entity>>,
	) -> Result<(), HalError>;

	/// Find one entity of `model` matching every lookup (`pk`, `poll__pk`, ...)
	fn lookup(&self, model: &str, kwargs: &HashMap<String, String>) -> Option<Arc<dyn Entity>>;
}

/// In-memory [`Persistence`] backed by [`Record`] entities
///
/// Assigns integer primary keys, fills model defaults and keeps both sides
/// of foreign key relations in sync.
pub struct MemoryStore {
	registry: Arc<ModelRegistry>,
	records: RwLock<IndexMap<String, Vec<Arc<Record>>>>,
	sequences: RwLock<HashMap<String, i64>>,
}

impl MemoryStore {
	pub fn new(registry: Arc<ModelRegistry>) -> Self {
		Self {
			registry,
			records: RwLock::new(IndexMap::new()),
			sequences: RwLock::new(HashMap::new()),
		}
	}

	fn meta(&self, model: &str) -> Result<Arc<ModelMeta>, HalError> {
		self.registry
			.get(model)
			.ok_or_else(|| HalError::Persistence(format!("Unknown model `{}`.", model)))
	}

	fn next_pk(&self, model: &str) -> i64 {
		let mut sequences = self.sequences.write();
		let next = sequences.entry(model.to_string()).or_insert(0);
		*next += 1;
		*next
	}

	/// Store a prepared record, assigning a primary key and defaults
	pub fn insert(&self, record: Record) -> Result<Arc<Record>, HalError> {
		let meta = self.meta(record.model_name())?;
		let pk_name = meta.pk_name().to_string();

		let pk = record.get(&pk_name);
		match pk {
			Some(AttrValue::Scalar(ScalarValue::Int(existing))) => {
				let mut sequences = self.sequences.write();
				let current = sequences.entry(meta.object_name().to_string()).or_insert(0);
				*current = (*current).max(existing);
			}
			Some(AttrValue::Scalar(ScalarValue::Null)) | None => {
				record.set(pk_name, self.next_pk(meta.object_name()));
			}
			Some(_) => {}
		}

		for field in meta.scalar_fields() {
			if record.get(&field.name).is_none() {
				let value = field.default.clone().unwrap_or(ScalarValue::Null);
				record.set(field.name.clone(), value);
			}
		}
		for relation in meta.relations() {
			if record.get(&relation.name).is_none() {
				let empty = if relation.many {
					AttrValue::Many(Vec::new())
				} else {
					AttrValue::One(None)
				};
				record.set(relation.name.clone(), empty);
			}
		}

		let record = Arc::new(record);
		self.link_reverse_sides(&meta, &record);
		self.records
			.write()
			.entry(meta.object_name().to_string())
			.or_default()
			.push(Arc::clone(&record));
		Ok(record)
	}

	/// All entities of a model, in insertion order
	pub fn all(&self, model: &str) -> Vec<Arc<dyn Entity>> {
		self.records
			.read()
			.get(model)
			.map(|records| {
				records
					.iter()
					.map(|record| Arc::clone(record) as Arc<dyn Entity>)
					.collect()
			})
			.unwrap_or_default()
	}

	fn find_record(&self, entity: &dyn Entity) -> Option<Arc<Record>> {
		let pk = lookup_value(entity, PK_ALIAS)?;
		self.records
			.read()
			.get(entity.model_name())?
			.iter()
			.find(|record| record_pk(record).as_deref() == Some(pk.as_str()))
			.cloned()
	}

	fn record_for(&self, entity: &dyn Entity) -> Result<Arc<Record>, HalError> {
		self.find_record(entity).ok_or_else(|| {
			HalError::Persistence(format!(
				"{} instance is not stored in this repository.",
				entity.model_name()
			))
		})
	}

	// Push a new child onto the reverse accessor of every parent it points at.
	fn link_reverse_sides(&self, meta: &ModelMeta, record: &Arc<Record>) {
		for relation in meta.forward_relations().filter(|r| !r.many) {
			if let Some(AttrValue::One(Some(parent))) = record.get(&relation.name) {
				self.attach_to_parent(meta, parent.as_ref(), record);
			}
		}
	}

	/// Parent record and name of the reverse collection `meta` objects appear in
	fn reverse_side(&self, meta: &ModelMeta, parent: &dyn Entity) -> Option<(Arc<Record>, String)> {
		let parent_meta = self.registry.get(parent.model_name())?;
		let reverse = parent_meta
			.reverse_relations()
			.find(|r| r.related_model == meta.object_name() && r.many)?;
		Some((self.find_record(parent)?, reverse.name.clone()))
	}

	fn attach_to_parent(&self, meta: &ModelMeta, parent: &dyn Entity, record: &Arc<Record>) {
		if let Some((parent, accessor)) = self.reverse_side(meta, parent) {
			parent.push(&accessor, Arc::clone(record) as Arc<dyn Entity>);
		}
	}

	fn detach_from_parent(&self, meta: &ModelMeta, parent: &dyn Entity, record: &Arc<Record>) {
		if let Some((parent, accessor)) = self.reverse_side(meta, parent) {
			let pk = record_pk(record);
			parent.retain(&accessor, |child| {
				child.model_name() != record.model_name() || lookup_value(child.as_ref(), PK_ALIAS) != pk
			});
		}
	}
}

fn record_pk(record: &Record) -> Option<String> {
	lookup_value(record, PK_ALIAS)
}

fn matches_kwargs(record: &Record, kwargs: &HashMap<String, String>) -> bool {
	kwargs
		.iter()
		.all(|(key, expected)| lookup_value(record, key).as_deref() == Some(expected.as_str()))
}

impl Persistence for MemoryStore {
	fn create(&self, model: &str, attributes: Attributes) -> Result<Arc<dyn Entity>, HalError> {
		let meta = self.meta(model)?;
		let mut record = Record::new(meta.object_name()).with_primary_key(meta.pk_name());
		for (name, value) in attributes {
			record = record.with(name, value);
		}
		let record = self.insert(record)?;
		Ok(record as Arc<dyn Entity>)
	}

	fn save(&self, entity: &Arc<dyn Entity>, attributes: Attributes) -> Result<Arc<dyn Entity>, HalError> {
		let record = self.record_for(entity.as_ref())?;
		let meta = self.meta(record.model_name())?;
		for (name, value) in attributes {
			let moved = meta
				.relation_info(&name)
				.is_some_and(|relation| !relation.reverse && !relation.many);
			if !moved {
				record.set(name, value);
				continue;
			}

			let previous = match record.get(&name) {
				Some(AttrValue::One(previous)) => previous,
				_ => None,
			};
			let next = match &value {
				AttrValue::One(next) => next.clone(),
				_ => None,
			};
			let previous_pk = previous.as_ref().and_then(|p| lookup_value(p.as_ref(), PK_ALIAS));
			let next_pk = next.as_ref().and_then(|n| lookup_value(n.as_ref(), PK_ALIAS));
			record.set(name, value);
			if previous_pk == next_pk {
				continue;
			}
			if let Some(previous) = previous {
				self.detach_from_parent(&meta, previous.as_ref(), &record);
			}
			if let Some(next) = next {
				self.attach_to_parent(&meta, next.as_ref(), &record);
			}
		}
		Ok(record as Arc<dyn Entity>)
	}

	fn add_to_collection(
		&self,
		entity: &Arc<dyn Entity>,
		field: &str,
		related: RelatedInput,
	) -> Result<Arc<dyn Entity>, HalError> {
		let parent = self.record_for(entity.as_ref())?;
		match related {
			RelatedInput::Existing(related) => {
				parent.push(field, Arc::clone(&related));
				Ok(related)
			}
			RelatedInput::New { model, mut attributes } => {
				let meta = self.meta(&model)?;
				let backlink = meta
					.forward_relations()
					.find(|r| !r.many && r.related_model == parent.model_name());
				match backlink {
					// The reverse side is filled in by `insert`.
					Some(backlink) => {
						attributes.insert(
							backlink.name.clone(),
							AttrValue::One(Some(Arc::clone(&parent) as Arc<dyn Entity>)),
						);
						self.create(&model, attributes)
					}
					None => {
						let child = self.create(&model, attributes)?;
						parent.push(field, Arc::clone(&child));
						Ok(child)
					}
				}
			}
		}
	}

	fn set_collection(
		&self,
		entity: &Arc<dyn Entity>,
		field: &str,
		related: Vec<Arc<dyn Entity>>,
	) -> Result<(), HalError> {
		let record = self.record_for(entity.as_ref())?;
		record.set(field, AttrValue::Many(related));
		Ok(())
	}

	fn lookup(&self, model: &str, kwargs: &HashMap<String, String>) -> Option<Arc<dyn Entity>> {
		self.records
			.read()
			.get(model)?
			.iter()
			.find(|record| matches_kwargs(record, kwargs))
			.map(|record| Arc::clone(record) as Arc<dyn Entity>)
	}
}
