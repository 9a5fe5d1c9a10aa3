//! The `_links` section
//!
//! Holds the resolver for the document's own `self` link plus every field
//! classified as a link.

use super::link::LinkResolver;
use super::spec::FieldSpec;
use crate::context::SerializerContext;
use crate::entity::Entity;
use crate::error::HalError;
use serde_json::{Map, Value};
use tracing::warn;

/// Relation name of a document's own link
pub const SELF_LINK: &str = "self";

#[derive(Debug, Clone, Default)]
pub struct LinksField {
	self_link: Option<LinkResolver>,
	relations: Vec<FieldSpec>,
}

impl LinksField {
	pub fn new(self_link: Option<LinkResolver>, relations: Vec<FieldSpec>) -> Self {
		Self { self_link, relations }
	}

	pub fn self_link(&self) -> Option<&LinkResolver> {
		self.self_link.as_ref()
	}

	pub fn relations(&self) -> &[FieldSpec] {
		&self.relations
	}

	pub fn is_empty(&self) -> bool {
		self.self_link.is_none() && self.relations.is_empty()
	}

	/// Build `{"self": {"href": ...}, <relation>: ...}` for `entity`
	///
	/// A routing failure for any link aborts the whole document.
	pub fn to_representation(
		&self,
		entity: &dyn Entity,
		context: &SerializerContext,
	) -> Result<Map<String, Value>, HalError> {
		if context.request().is_none() {
			warn!(
				model = entity.model_name(),
				"Building `_links` without a request in the serializer context is not allowed. \
				 Add a request to the serializer context when serializing."
			);
		}

		let mut links = Map::new();
		if let Some(self_link) = &self.self_link {
			links.insert(SELF_LINK.to_string(), self_link.link_object(entity, context)?);
		}
		for relation in &self.relations {
			links.insert(relation.name.clone(), relation.to_representation(entity, context)?);
		}
		Ok(links)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::RequestContext;
	use crate::entity::{AttrValue, Record};
	use crate::fields::spec::FieldKind;
	use crate::reverse::RouteTable;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use std::sync::{Arc, Mutex};
	use tracing_subscriber::layer::SubscriberExt as _;
	use tracing_subscriber::util::SubscriberInitExt as _;

	#[fixture]
	fn links() -> LinksField {
		LinksField::new(
			Some(LinkResolver::new("choice-detail")),
			vec![FieldSpec::new("poll", FieldKind::Link(LinkResolver::new("poll-detail")))],
		)
	}

	fn routes() -> Arc<RouteTable> {
		Arc::new(
			RouteTable::new()
				.route("choice-detail", "/choice/{pk}")
				.route("poll-detail", "/poll/{pk}"),
		)
	}

	fn choice() -> Record {
		Record::new("Choice")
			.with("id", 5)
			.with("poll", Arc::new(Record::new("Poll").with("id", 3)))
	}

	#[rstest]
	fn test_self_and_relation(links: LinksField) {
		let context = SerializerContext::new(routes())
			.with_request(RequestContext::parse("http://testserver/").unwrap());
		let rendered = links.to_representation(&choice(), &context).unwrap();
		assert_eq!(
			Value::Object(rendered),
			json!({
				"self": {"href": "http://testserver/choice/5"},
				"poll": {"href": "http://testserver/poll/3"}
			})
		);
	}

	/// Records every event's level and message
	struct LogCapture {
		logs: Arc<Mutex<Vec<String>>>,
	}

	impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
		fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
			struct MessageVisitor {
				message: String,
			}

			impl tracing::field::Visit for MessageVisitor {
				fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
					if field.name() == "message" {
						self.message = format!("{:?}", value);
					}
				}
			}

			let mut visitor = MessageVisitor { message: String::new() };
			event.record(&mut visitor);
			self.logs
				.lock()
				.unwrap()
				.push(format!("[{}] {}", event.metadata().level(), visitor.message));
		}
	}

	fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
		let logs = Arc::new(Mutex::new(Vec::new()));
		let capture = LogCapture { logs: logs.clone() };
		let result = {
			let _guard = tracing_subscriber::registry().with(capture).set_default();
			f()
		};
		let captured = logs.lock().unwrap().clone();
		(result, captured)
	}

	#[rstest]
	fn test_without_request_warns_and_renders_relative_hrefs(links: LinksField) {
		let context = SerializerContext::new(routes());

		let (rendered, logs) = capture_logs(|| links.to_representation(&choice(), &context).unwrap());

		assert_eq!(rendered["self"], json!({"href": "/choice/5"}));
		assert_eq!(rendered["poll"], json!({"href": "/poll/3"}));
		assert!(
			logs.iter()
				.any(|line| line.starts_with("[WARN]") && line.contains("without a request")),
			"{:?}",
			logs
		);
	}

	#[rstest]
	fn test_with_request_does_not_warn(links: LinksField) {
		let context = SerializerContext::new(routes())
			.with_request(RequestContext::parse("http://testserver/").unwrap());

		let (_, logs) = capture_logs(|| links.to_representation(&choice(), &context).unwrap());

		assert!(!logs.iter().any(|line| line.starts_with("[WARN]")), "{:?}", logs);
	}

	#[rstest]
	fn test_unsaved_entity(links: LinksField) {
		let context = SerializerContext::new(routes());
		let unsaved = Record::new("Choice").with("poll", AttrValue::One(None));
		let rendered = links.to_representation(&unsaved, &context).unwrap();
		assert_eq!(rendered["self"], json!({"href": null}));
		assert_eq!(rendered["poll"], Value::Null);
	}

	#[rstest]
	fn test_routing_mismatch_names_view() {
		let links = LinksField::new(Some(LinkResolver::new("missing-detail")), Vec::new());
		let err = links
			.to_representation(&choice(), &SerializerContext::new(routes()))
			.unwrap_err();
		assert!(matches!(err, HalError::RoutingMismatch { view_name } if view_name == "missing-detail"));
	}
}
