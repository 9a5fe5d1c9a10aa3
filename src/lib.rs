//! # Reinhardt HAL
//!
//! [HAL](https://datatracker.ietf.org/doc/html/draft-kelly-json-hal) support for Reinhardt,
//! inspired by drf-hal.
//!
//! Every model document carries a `_links` object with a `self` link and one
//! link per related resource; related resources can instead be nested under
//! `_embedded`. Collections are wrapped in a paginated envelope with
//! `first`/`last`/`next`/`prev` links.
//!
//! ## Crates
//!
//! - [`serializers`]: model metadata, field classification, link resolution,
//!   the HAL model serializer, writable hyperlinked and embedded relations
//! - [`pagination`] (feature `pagination`, enabled by default): page-number
//!   pagination and the HAL envelope
//! - [`renderers`]: the `application/hal+json` renderer
//!
//! ## Quick Example
//!
//! ```
//! use reinhardt_hal::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(
//!     ModelRegistry::new()
//!         .with(
//!             ModelMeta::new("polls", "Poll")
//!                 .field(ScalarFieldInfo::auto_pk("id"))
//!                 .field(ScalarFieldInfo::new("question", ScalarKind::Text)),
//!         )
//!         .with(
//!             ModelMeta::new("polls", "Choice")
//!                 .field(ScalarFieldInfo::auto_pk("id"))
//!                 .relation(RelationInfo::forward("poll", "Poll"))
//!                 .field(ScalarFieldInfo::new("choice_text", ScalarKind::Text)),
//!         ),
//! );
//! let store = MemoryStore::new(Arc::clone(&registry));
//! let poll = store.insert(Record::new("Poll").with("question", "Lunch?")).unwrap();
//! let choice = store
//!     .insert(Record::new("Choice").with("poll", poll.clone()).with("choice_text", "Sushi"))
//!     .unwrap();
//!
//! let routes = RouteTable::new()
//!     .route("poll-detail", "/poll/{pk}")
//!     .route("choice-detail", "/choice/{pk}");
//! let context = SerializerContext::new(Arc::new(routes))
//!     .with_request(RequestContext::parse("http://testserver/choice/1").unwrap());
//!
//! let serializer = HalSerializerConfig::new("Choice")
//!     .build(&registry, &HalSettings::default())
//!     .unwrap();
//! let document = serializer.to_representation(choice.as_ref(), &context).unwrap();
//! assert_eq!(document["_links"]["poll"]["href"], json!("http://testserver/poll/1"));
//!
//! let body = HalJsonRenderer::new().render(&document).unwrap();
//! assert!(body.starts_with(b"{\"_links\""));
//! ```

pub mod renderers;

pub use reinhardt_hal_serializers as serializers;

#[cfg(feature = "pagination")]
pub use reinhardt_hal_pagination as pagination;

pub use renderers::{HAL_JSON_MEDIA_TYPE, HalJsonRenderer, RenderError};

pub use reinhardt_hal_serializers::{
	DeclaredField, EMBEDDED, Entity, ErrorDetail, FieldOverrides, HalError, HalModelSerializer,
	HalSerializerConfig, HalSettings, LINKS, LinkResolver, MemoryStore, MethodField, ModelMeta,
	ModelRegistry, Persistence, Record, RelationInfo, RequestContext, RouteTable, ScalarFieldInfo,
	ScalarKind, SerializerContext, UrlReverser, ValidationErrors,
};

#[cfg(feature = "pagination")]
pub use reinhardt_hal_pagination::{
	HalPaginationSerializer, Page, PageNumberPagination, Paginated, PaginationError,
};

/// Everything needed to declare and run HAL serializers
pub mod prelude {
	pub use crate::renderers::HalJsonRenderer;
	pub use reinhardt_hal_serializers::{
		AttrValue, DeclaredField, Entity, FieldOverrides, HalError, HalModelSerializer,
		HalSerializerConfig, HalSettings, MemoryStore, MethodField, ModelMeta, ModelRegistry,
		Persistence, Record, RelationInfo, RequestContext, RouteTable, ScalarFieldInfo, ScalarKind,
		ScalarValue, SerializerContext, UrlReverser, ValidationErrors,
	};

	#[cfg(feature = "pagination")]
	pub use reinhardt_hal_pagination::{HalPaginationSerializer, PageNumberPagination, Paginated};
}
