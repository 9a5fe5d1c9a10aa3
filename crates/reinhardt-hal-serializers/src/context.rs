//! Request and serializer context
//!
//! A [`SerializerContext`] carries everything a serialize or parse call needs
//! from the outside world: the current request (for absolute URLs and query
//! strings), the negotiated format, the URL reverser and, for writes, the
//! persistence layer. It is built per request and never shared.

use crate::persistence::Persistence;
use crate::reverse::UrlReverser;
use std::sync::Arc;
use url::Url;

/// The parts of the current HTTP request serializers care about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
	url: Url,
	format: Option<String>,
}

impl RequestContext {
	pub fn new(url: Url) -> Self {
		Self { url, format: None }
	}

	/// Parse an absolute request URI
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_hal_serializers::context::RequestContext;
	///
	/// let request = RequestContext::parse("http://testserver/polls?page=2").unwrap();
	/// assert_eq!(request.query_param("page").as_deref(), Some("2"));
	/// assert_eq!(request.build_absolute_uri("/poll/1"), "http://testserver/poll/1");
	/// ```
	pub fn parse(uri: &str) -> Result<Self, url::ParseError> {
		Url::parse(uri).map(Self::new)
	}

	/// Set the format negotiated for the response
	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	pub fn format(&self) -> Option<&str> {
		self.format.as_deref()
	}

	/// The full URI of the current request
	pub fn absolute_uri(&self) -> String {
		self.url.to_string()
	}

	/// Resolve `path` against the current request's origin
	pub fn build_absolute_uri(&self, path: &str) -> String {
		match self.url.join(path) {
			Ok(url) => url.to_string(),
			Err(_) => path.to_string(),
		}
	}

	/// First value of a query parameter
	pub fn query_param(&self, key: &str) -> Option<String> {
		self.url
			.query_pairs()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.into_owned())
	}
}

/// Per-call context passed to every serializer operation
#[derive(Clone)]
pub struct SerializerContext {
	request: Option<RequestContext>,
	format: Option<String>,
	reverser: Arc<dyn UrlReverser>,
	persistence: Option<Arc<dyn Persistence>>,
}

impl SerializerContext {
	pub fn new(reverser: Arc<dyn UrlReverser>) -> Self {
		Self {
			request: None,
			format: None,
			reverser,
			persistence: None,
		}
	}

	pub fn with_request(mut self, request: RequestContext) -> Self {
		self.request = Some(request);
		self
	}

	/// Format requested through the URL suffix of the current view
	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}

	pub fn with_persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
		self.persistence = Some(persistence);
		self
	}

	pub fn request(&self) -> Option<&RequestContext> {
		self.request.as_ref()
	}

	/// Format of the current response, from the view or the request
	pub fn format(&self) -> Option<&str> {
		self.format
			.as_deref()
			.or_else(|| self.request.as_ref().and_then(RequestContext::format))
	}

	pub fn reverser(&self) -> &dyn UrlReverser {
		self.reverser.as_ref()
	}

	pub fn persistence(&self) -> Option<&Arc<dyn Persistence>> {
		self.persistence.as_ref()
	}
}

impl std::fmt::Debug for SerializerContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SerializerContext")
			.field("request", &self.request)
			.field("format", &self.format)
			.field("persistence", &self.persistence.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reverse::RouteTable;
	use rstest::rstest;

	#[rstest]
	fn test_context_format_falls_back_to_request() {
		let request = RequestContext::parse("http://testserver/polls")
			.unwrap()
			.with_format("json");
		let context = SerializerContext::new(Arc::new(RouteTable::new())).with_request(request);
		assert_eq!(context.format(), Some("json"));

		let context = context.with_format("api");
		assert_eq!(context.format(), Some("api"));
	}

	#[rstest]
	fn test_absolute_uri_keeps_query() {
		let request = RequestContext::parse("http://testserver/polls?page=2&page_size=3").unwrap();
		assert_eq!(
			request.absolute_uri(),
			"http://testserver/polls?page=2&page_size=3"
		);
		assert_eq!(request.query_param("page_size").as_deref(), Some("3"));
		assert_eq!(request.query_param("missing"), None);
	}
}
