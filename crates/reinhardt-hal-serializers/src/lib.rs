//! # Reinhardt HAL Serializers
//!
//! Model serializers that speak [HAL](https://datatracker.ietf.org/doc/html/draft-kelly-json-hal):
//! relations are rendered as hyperlinks under `_links`, nested documents
//! under `_embedded`, and every document links to itself.
//!
//! ## Overview
//!
//! A serializer is declared with [`HalSerializerConfig`], the equivalent of a
//! serializer `Meta` class, and frozen into a [`HalModelSerializer`] by
//! [`HalSerializerConfig::build`]. Building runs the [`FieldClassifier`],
//! which decides for every field whether it is a plain attribute, a link or
//! an embedded document.
//!
//! Rendering and parsing both need a [`SerializerContext`]: a URL reverser,
//! usually the current request, and for writes a [`Persistence`] backend.
//!
//! ## Example
//!
//! ```
//! use reinhardt_hal_serializers::{
//!     HalSerializerConfig, HalSettings, MemoryStore, ModelMeta, ModelRegistry, Record,
//!     RequestContext, RouteTable, ScalarFieldInfo, ScalarKind, SerializerContext,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ModelRegistry::new().with(
//!     ModelMeta::new("polls", "Poll")
//!         .field(ScalarFieldInfo::auto_pk("id"))
//!         .field(ScalarFieldInfo::new("question", ScalarKind::Text)),
//! ));
//! let store = MemoryStore::new(Arc::clone(&registry));
//! let poll = store.insert(Record::new("Poll").with("question", "Lunch?")).unwrap();
//!
//! let serializer = HalSerializerConfig::new("Poll")
//!     .build(&registry, &HalSettings::default())
//!     .unwrap();
//! let context = SerializerContext::new(Arc::new(RouteTable::new().route("poll-detail", "/poll/{pk}")))
//!     .with_request(RequestContext::parse("http://testserver/polls").unwrap());
//!
//! let document = serializer.to_representation(poll.as_ref(), &context).unwrap();
//! assert_eq!(document["_links"]["self"]["href"], json!("http://testserver/poll/1"));
//! assert_eq!(document["question"], json!("Lunch?"));
//! ```

pub mod classifier;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod fields;
pub mod meta;
pub mod persistence;
pub mod reverse;
pub mod serializer;
pub mod settings;

/// Key of the hyperlink section of a HAL document
pub const LINKS: &str = "_links";

/// Key of the nested document section of a HAL document
pub const EMBEDDED: &str = "_embedded";

pub use classifier::FieldClassifier;
pub use config::{DeclaredField, DeclaredKind, FieldOverrides, HalSerializerConfig};
pub use context::{RequestContext, SerializerContext};
pub use entity::{AttrValue, Entity, Record, ScalarValue};
pub use error::{ErrorDetail, HalError, NON_FIELD_ERRORS, NoReverseMatch, ValidationErrors};
pub use fields::{EmbeddedField, FieldKind, FieldSpec, LinkResolver, LinksField, MethodField, MethodFieldError};
pub use meta::{ModelMeta, ModelRegistry, RelationInfo, ScalarFieldInfo, ScalarKind};
pub use persistence::{Attributes, MemoryStore, Persistence, RelatedInput};
pub use reverse::{ResolverMatch, RouteTable, UrlReverser};
pub use serializer::{AttributeSet, HalModelSerializer, InternalValue};
pub use settings::{HalSettings, PaginationSettings, SettingsError};
