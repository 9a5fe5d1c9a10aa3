//! HAL pagination envelope
//!
//! ```text
//! {
//!   "_links": {"self": .., "first": .., "last": .., "next": .., "prev": ..},
//!   "total": 30,
//!   "num_pages": 3,
//!   "count": 10,
//!   "_embedded": {"polls": [..]}
//! }
//! ```

use crate::page::{PageNumberPagination, Paginated, PaginationError};
use crate::query::replace_query_param;
use reinhardt_hal_serializers::{
	EMBEDDED, Entity, HalError, HalModelSerializer, LINKS, PaginationSettings, SerializerContext,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Wraps one page of entities with navigation links
#[derive(Debug, Clone)]
pub struct HalPaginationSerializer {
	serializer: Arc<HalModelSerializer>,
	page_query_param: String,
	collection_name: Option<String>,
}

impl HalPaginationSerializer {
	pub fn new(serializer: impl Into<Arc<HalModelSerializer>>) -> Self {
		Self {
			serializer: serializer.into(),
			page_query_param: PaginationSettings::default().page_query_param,
			collection_name: None,
		}
	}

	pub fn from_settings(serializer: impl Into<Arc<HalModelSerializer>>, settings: &PaginationSettings) -> Self {
		Self::new(serializer).with_page_query_param(settings.page_query_param.clone())
	}

	pub fn with_page_query_param(mut self, param: impl Into<String>) -> Self {
		self.page_query_param = param.into();
		self
	}

	/// Override the `_embedded` key, which defaults to the model's plural name
	pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
		self.collection_name = Some(name.into());
		self
	}

	pub fn serializer(&self) -> &HalModelSerializer {
		&self.serializer
	}

	pub fn collection_name(&self) -> String {
		self.collection_name
			.clone()
			.unwrap_or_else(|| self.serializer.plural_name())
	}

	/// Build the envelope for `page`
	///
	/// Requires a request in `context`; every navigation link is derived
	/// from the current request URI.
	pub fn wrap<P>(&self, page: &P, context: &SerializerContext) -> Result<Value, PaginationError>
	where
		P: Paginated<Item = Arc<dyn Entity>>,
	{
		self.build_envelope(page, context, &self.page_query_param)
	}

	/// Paginate `items` the way the current request asks and wrap the page
	///
	/// Navigation links use the paginator's page query parameter.
	pub fn paginate(
		&self,
		paginator: &PageNumberPagination,
		items: &[Arc<dyn Entity>],
		context: &SerializerContext,
	) -> Result<Value, PaginationError> {
		let request = context.request().ok_or_else(missing_request)?;
		let page = paginator.paginate_request(items, request)?;
		self.build_envelope(&page, context, &paginator.page_query_param)
	}

	fn build_envelope<P>(
		&self,
		page: &P,
		context: &SerializerContext,
		page_query_param: &str,
	) -> Result<Value, PaginationError>
	where
		P: Paginated<Item = Arc<dyn Entity>>,
	{
		let request = context.request().ok_or_else(missing_request)?;
		let url = request.url();
		let empty = page.count() == 0;

		let page_link = |number: usize| {
			json!({"href": replace_query_param(url, page_query_param, &number.to_string())})
		};
		let mut links = Map::new();
		links.insert("self".to_string(), json!({"href": request.absolute_uri()}));
		links.insert(
			"first".to_string(),
			if empty { Value::Null } else { page_link(1) },
		);
		links.insert(
			"last".to_string(),
			if empty { Value::Null } else { page_link(page.num_pages()) },
		);
		links.insert(
			"next".to_string(),
			page.next_page_number().map(page_link).unwrap_or(Value::Null),
		);
		links.insert(
			"prev".to_string(),
			page.previous_page_number().map(page_link).unwrap_or(Value::Null),
		);

		let count = if empty || page.end_index() == 0 {
			0
		} else {
			page.end_index() - page.start_index() + 1
		};
		let items = self.serializer.serialize_many(page.items(), context)?;
		let mut embedded = Map::new();
		embedded.insert(self.collection_name(), Value::Array(items));

		let mut envelope = Map::new();
		envelope.insert(LINKS.to_string(), Value::Object(links));
		envelope.insert("total".to_string(), json!(page.count()));
		envelope.insert("num_pages".to_string(), json!(page.num_pages()));
		envelope.insert("count".to_string(), json!(count));
		envelope.insert(EMBEDDED.to_string(), Value::Object(embedded));
		Ok(Value::Object(envelope))
	}
}

fn missing_request() -> HalError {
	HalError::improperly_configured(
		"Paginated HAL responses require a request in the serializer context.",
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::page::Page;
	use reinhardt_hal_serializers::{
		HalSerializerConfig, HalSettings, MemoryStore, ModelMeta, ModelRegistry, Record, RequestContext,
		RouteTable, ScalarFieldInfo, ScalarKind,
	};
	use rstest::{fixture, rstest};

	struct Polls {
		serializer: HalModelSerializer,
		store: MemoryStore,
	}

	#[fixture]
	fn polls() -> Polls {
		let registry = Arc::new(
			ModelRegistry::new().with(
				ModelMeta::new("polls", "Poll")
					.field(ScalarFieldInfo::auto_pk("id"))
					.field(ScalarFieldInfo::new("question", ScalarKind::Text)),
			),
		);
		let serializer = HalSerializerConfig::new("Poll")
			.build(&registry, &HalSettings::default())
			.unwrap();
		Polls {
			serializer,
			store: MemoryStore::new(registry),
		}
	}

	fn context(uri: &str) -> SerializerContext {
		SerializerContext::new(Arc::new(RouteTable::new().route("poll-detail", "/poll/{pk}")))
			.with_request(RequestContext::parse(uri).unwrap())
	}

	#[rstest]
	fn test_first_page_links(polls: Polls) {
		for i in 0..30 {
			polls
				.store
				.insert(Record::new("Poll").with("question", format!("Question {i}")))
				.unwrap();
		}
		let all = polls.store.all("Poll");
		let page = Page::new(all[..10].to_vec(), 1, 3, 30, 10);
		let envelope = HalPaginationSerializer::new(polls.serializer)
			.wrap(&page, &context("http://testserver/polls?page=1"))
			.unwrap();

		assert_eq!(envelope["_links"]["first"]["href"], json!("http://testserver/polls?page=1"));
		assert_eq!(envelope["_links"]["last"]["href"], json!("http://testserver/polls?page=3"));
		assert_eq!(envelope["_links"]["next"]["href"], json!("http://testserver/polls?page=2"));
		assert_eq!(envelope["_links"]["prev"], Value::Null);
		assert_eq!(envelope["total"], json!(30));
		assert_eq!(envelope["num_pages"], json!(3));
		assert_eq!(envelope["count"], json!(10));
		assert_eq!(envelope["_embedded"]["polls"].as_array().unwrap().len(), 10);
	}

	#[rstest]
	fn test_empty_page(polls: Polls) {
		let page: Page<Arc<dyn Entity>> = Page::new(Vec::new(), 1, 1, 0, 10);
		let envelope = HalPaginationSerializer::new(polls.serializer)
			.wrap(&page, &context("http://testserver/polls"))
			.unwrap();

		assert_json_diff::assert_json_eq!(
			envelope,
			json!({
				"_links": {
					"self": {"href": "http://testserver/polls"},
					"first": null,
					"last": null,
					"next": null,
					"prev": null
				},
				"total": 0,
				"num_pages": 1,
				"count": 0,
				"_embedded": {"polls": []}
			})
		);
	}

	#[rstest]
	fn test_links_use_the_paginator_query_param(polls: Polls) {
		for i in 0..5 {
			polls
				.store
				.insert(Record::new("Poll").with("question", format!("Question {i}")))
				.unwrap();
		}
		let paginator = PageNumberPagination::new().page_size(2).page_query_param("p");
		let envelope = HalPaginationSerializer::new(polls.serializer)
			.paginate(&paginator, &polls.store.all("Poll"), &context("http://testserver/polls?p=2"))
			.unwrap();

		assert_eq!(envelope["_links"]["first"]["href"], json!("http://testserver/polls?p=1"));
		assert_eq!(envelope["_links"]["last"]["href"], json!("http://testserver/polls?p=3"));
		assert_eq!(envelope["_links"]["next"]["href"], json!("http://testserver/polls?p=3"));
		assert_eq!(envelope["_links"]["prev"]["href"], json!("http://testserver/polls?p=1"));
		assert_eq!(envelope["count"], json!(2));
	}

	#[rstest]
	fn test_page_without_items_counts_zero(polls: Polls) {
		let page: Page<Arc<dyn Entity>> = Page::new(Vec::new(), 2, 2, 12, 10);
		let envelope = HalPaginationSerializer::new(polls.serializer)
			.wrap(&page, &context("http://testserver/polls?page=2"))
			.unwrap();

		assert_eq!(envelope["count"], json!(0));
		assert_eq!(envelope["total"], json!(12));
	}

	#[rstest]
	fn test_request_is_required(polls: Polls) {
		let page: Page<Arc<dyn Entity>> = Page::new(Vec::new(), 1, 1, 0, 10);
		let context = SerializerContext::new(Arc::new(RouteTable::new()));
		let err = HalPaginationSerializer::new(polls.serializer)
			.wrap(&page, &context)
			.unwrap_err();
		assert!(matches!(err, PaginationError::Serializer(HalError::ImproperlyConfigured(_))));
	}
}
