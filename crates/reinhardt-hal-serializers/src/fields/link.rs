//! Hyperlink resolution
//!
//! A [`LinkResolver`] knows which view an entity is served by and which
//! attributes parameterize that view's URL. It builds hrefs for outbound
//! documents and turns inbound hrefs back into entities.

use crate::context::SerializerContext;
use crate::entity::{Entity, lookup_value};
use crate::error::{HalError, NoReverseMatch};
use crate::persistence::Persistence;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub const NO_MATCH: &str = "Invalid hyperlink - No URL match.";
pub const INCORRECT_MATCH: &str = "Invalid hyperlink - Incorrect URL match.";
pub const DOES_NOT_EXIST: &str = "Invalid hyperlink - Object does not exist.";

/// Builds and parses hyperlinks for one view
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use reinhardt_hal_serializers::context::{RequestContext, SerializerContext};
/// use reinhardt_hal_serializers::entity::Record;
/// use reinhardt_hal_serializers::fields::LinkResolver;
/// use reinhardt_hal_serializers::reverse::RouteTable;
///
/// let routes = RouteTable::new().route("poll-choice-detail", "/poll/{poll__pk}/choice/{pk}");
/// let context = SerializerContext::new(Arc::new(routes))
///     .with_request(RequestContext::parse("http://testserver/").unwrap());
///
/// let poll = Arc::new(Record::new("Poll").with("id", 3));
/// let choice = Record::new("Choice").with("id", 5).with("poll", poll);
///
/// let resolver = LinkResolver::new("poll-choice-detail").with_lookup_fields(["poll__pk", "pk"]);
/// assert_eq!(
///     resolver.resolve(&choice, &context).unwrap().as_deref(),
///     Some("http://testserver/poll/3/choice/5")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResolver {
	view_name: String,
	lookup_fields: Vec<String>,
	format: Option<String>,
	model: Option<String>,
}

impl LinkResolver {
	/// Resolver keyed on `pk`
	pub fn new(view_name: impl Into<String>) -> Self {
		Self {
			view_name: view_name.into(),
			lookup_fields: vec![crate::entity::PK_ALIAS.to_string()],
			format: None,
			model: None,
		}
	}

	/// Lookup attributes in URL order; `a__b` traverses relation `a`
	pub fn with_lookup_fields<I, S>(mut self, lookup_fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.lookup_fields = lookup_fields.into_iter().map(Into::into).collect();
		self
	}

	/// Format this link prefers over the current response's format
	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}

	/// Model that inbound links resolve to
	pub fn for_model(mut self, model: impl Into<String>) -> Self {
		self.model = Some(model.into());
		self
	}

	pub fn view_name(&self) -> &str {
		&self.view_name
	}

	pub fn lookup_fields(&self) -> &[String] {
		&self.lookup_fields
	}

	pub fn format(&self) -> Option<&str> {
		self.format.as_deref()
	}

	pub fn model(&self) -> Option<&str> {
		self.model.as_deref()
	}

	/// URL parameters for `entity`, `None` if any lookup value is unset
	pub fn lookup_params(&self, entity: &dyn Entity) -> Option<HashMap<String, String>> {
		self.lookup_fields
			.iter()
			.map(|field| lookup_value(entity, field).map(|value| (field.clone(), value)))
			.collect()
	}

	fn effective_format<'a>(&'a self, context: &'a SerializerContext) -> Option<&'a str> {
		match (context.format(), self.format.as_deref()) {
			(Some(current), Some(own)) if current != own => Some(own),
			(current, _) => current,
		}
	}

	/// Build the URL of `entity`
	///
	/// Returns `Ok(None)` for an entity that cannot be linked yet (a lookup
	/// value is unset).
	pub fn resolve(
		&self,
		entity: &dyn Entity,
		context: &SerializerContext,
	) -> Result<Option<String>, NoReverseMatch> {
		let Some(params) = self.lookup_params(entity) else {
			debug!(
				view_name = %self.view_name,
				model = entity.model_name(),
				"lookup value unset, rendering a null link"
			);
			return Ok(None);
		};

		let path = context
			.reverser()
			.reverse(&self.view_name, &params, self.effective_format(context))?;
		let url = match context.request() {
			Some(request) => request.build_absolute_uri(&path),
			None => path,
		};
		Ok(Some(url))
	}

	/// The href of `entity` as JSON, a routing failure becomes [`HalError::RoutingMismatch`]
	pub fn href(&self, entity: &dyn Entity, context: &SerializerContext) -> Result<Value, HalError> {
		match self.resolve(entity, context) {
			Ok(Some(url)) => Ok(Value::String(url)),
			Ok(None) => Ok(Value::Null),
			Err(err) => {
				warn!(view_name = %err.view_name, reason = %err.reason, "hyperlink could not be reversed");
				Err(HalError::RoutingMismatch {
					view_name: self.view_name.clone(),
				})
			}
		}
	}

	/// `{"href": ...}` object for `entity`
	pub fn link_object(&self, entity: &dyn Entity, context: &SerializerContext) -> Result<Value, HalError> {
		Ok(json!({ "href": self.href(entity, context)? }))
	}

	/// Turn an inbound hyperlink into the entity it points at
	///
	/// Accepts a URL string or a `{"href": ...}` object. Absolute URLs are
	/// reduced to their path before matching.
	pub fn parse(
		&self,
		raw: &Value,
		context: &SerializerContext,
		persistence: &dyn Persistence,
	) -> Result<Arc<dyn Entity>, String> {
		let href = match raw {
			Value::Object(link) => link.get("href").unwrap_or(&Value::Null),
			other => other,
		};
		let Value::String(href) = href else {
			return Err(format!(
				"Incorrect type. Expected URL string, received {}.",
				type_name(href)
			));
		};

		let path = match Url::parse(href) {
			Ok(url) => url.path().to_string(),
			Err(_) => href.clone(),
		};
		let found = context
			.reverser()
			.resolve(&path)
			.ok_or_else(|| NO_MATCH.to_string())?;
		if found.view_name != self.view_name {
			return Err(INCORRECT_MATCH.to_string());
		}

		let model = self.model.as_deref().ok_or_else(|| DOES_NOT_EXIST.to_string())?;
		persistence
			.lookup(model, &found.lookup_kwargs())
			.ok_or_else(|| DOES_NOT_EXIST.to_string())
	}
}

/// Name of a JSON value's type, as reported in validation messages
pub fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "NoneType",
		Value::Bool(_) => "bool",
		Value::Number(n) if n.is_f64() => "float",
		Value::Number(_) => "int",
		Value::String(_) => "str",
		Value::Array(_) => "list",
		Value::Object(_) => "dict",
	}
}
