//! # Reinhardt HAL Pagination
//!
//! Page-number pagination for HAL collections. A [`PageNumberPagination`]
//! selects a [`Page`]; a [`HalPaginationSerializer`] wraps it in an envelope
//! carrying `first`/`last`/`next`/`prev` links, the totals, and the page's
//! documents under `_embedded`.
//!
//! ## Example
//!
//! ```
//! use reinhardt_hal_pagination::{HalPaginationSerializer, PageNumberPagination};
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
//! for question in ["Lunch?", "Dinner?", "Coffee?"] {
//!     store.insert(Record::new("Poll").with("question", question)).unwrap();
//! }
//!
//! let serializer = HalSerializerConfig::new("Poll")
//!     .build(&registry, &HalSettings::default())
//!     .unwrap();
//! let context = SerializerContext::new(Arc::new(RouteTable::new().route("poll-detail", "/poll/{pk}")))
//!     .with_request(RequestContext::parse("http://testserver/polls?page_size=2").unwrap());
//!
//! let envelope = HalPaginationSerializer::new(serializer)
//!     .paginate(&PageNumberPagination::new(), &store.all("Poll"), &context)
//!     .unwrap();
//! assert_eq!(envelope["num_pages"], json!(2));
//! assert_eq!(
//!     envelope["_links"]["next"]["href"],
//!     json!("http://testserver/polls?page=2&page_size=2")
//! );
//! ```

pub mod envelope;
pub mod page;
pub mod query;

pub use envelope::HalPaginationSerializer;
pub use page::{Page, PageNumberPagination, Paginated, PaginationError};
pub use query::replace_query_param;
