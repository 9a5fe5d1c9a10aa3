//! URL reverse resolution
//!
//! Hyperlinked fields never build URLs themselves. They hand a view name and a
//! parameter map to a [`UrlReverser`], and go the other way (URL to view name
//! plus keyword arguments) when parsing inbound links.
//!
//! [`RouteTable`] is a small name-to-pattern table that is enough for most
//! applications and for tests.

use crate::error::NoReverseMatch;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Keyword argument under which a format suffix is reported by [`UrlReverser::resolve`]
pub const FORMAT_KWARG: &str = "format";

/// Result of resolving a path back to a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverMatch {
	pub view_name: String,
	pub kwargs: HashMap<String, String>,
}

impl ResolverMatch {
	/// Keyword arguments without the format suffix
	pub fn lookup_kwargs(&self) -> HashMap<String, String> {
		self.kwargs
			.iter()
			.filter(|(key, _)| key.as_str() != FORMAT_KWARG)
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect()
	}
}

/// Maps view names to URL paths and back
pub trait UrlReverser: Send + Sync {
	/// Build the path for `view_name`
	///
	/// `params` must match the route's parameters exactly. A `format` appends
	/// a `.{format}` suffix.
	fn reverse(
		&self,
		view_name: &str,
		params: &HashMap<String, String>,
		format: Option<&str>,
	) -> Result<String, NoReverseMatch>;

	/// Match a path against the known routes
	fn resolve(&self, path: &str) -> Option<ResolverMatch>;
}

/// Single-pass `{param}` substitution
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use reinhardt_hal_serializers::reverse::substitute_params;
///
/// let mut params = HashMap::new();
/// params.insert("poll__pk".to_string(), "3".to_string());
/// params.insert("pk".to_string(), "5".to_string());
///
/// let path = substitute_params("/poll/{poll__pk}/choice/{pk}", &params);
/// assert_eq!(path, "/poll/3/choice/5");
/// ```
pub fn substitute_params(pattern: &str, params: &HashMap<String, String>) -> String {
	let mut result = String::with_capacity(pattern.len());
	let mut chars = pattern.chars();

	while let Some(ch) = chars.next() {
		if ch == '{' {
			let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
			match params.get(&name) {
				Some(value) => result.push_str(value),
				None => {
					result.push('{');
					result.push_str(&name);
					result.push('}');
				}
			}
		} else {
			result.push(ch);
		}
	}

	result
}

/// Extract the placeholder names of a pattern, in order
pub fn extract_param_names(pattern: &str) -> Vec<String> {
	let mut names = Vec::new();
	let mut chars = pattern.chars();

	while let Some(ch) = chars.next() {
		if ch == '{' {
			let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
			if !name.is_empty() {
				names.push(name);
			}
		}
	}

	names
}

/// Reject values that would change the shape of the generated path
fn is_safe_param(value: &str) -> bool {
	!value.is_empty() && !value.contains(['/', '?', '#', '%', '\\'])
}

/// Name-to-pattern route table
///
/// Patterns use `{name}` placeholders, one per path segment. Every route also
/// answers to a `.{format}` suffixed variant unless suffixes are disabled.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use reinhardt_hal_serializers::reverse::{RouteTable, UrlReverser};
///
/// let routes = RouteTable::new()
///     .route("poll-detail", "/poll/{pk}")
///     .route("polls", "/polls");
///
/// let mut params = HashMap::new();
/// params.insert("pk".to_string(), "3".to_string());
/// assert_eq!(routes.reverse("poll-detail", &params, None).unwrap(), "/poll/3");
/// assert_eq!(routes.reverse("poll-detail", &params, Some("json")).unwrap(), "/poll/3.json");
///
/// let matched = routes.resolve("/poll/3").unwrap();
/// assert_eq!(matched.view_name, "poll-detail");
/// assert_eq!(matched.kwargs["pk"], "3");
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable {
	routes: IndexMap<String, String>,
	format_suffixes: bool,
}

impl RouteTable {
	pub fn new() -> Self {
		Self {
			routes: IndexMap::new(),
			format_suffixes: true,
		}
	}

	/// Register a route, builder style
	pub fn route(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
		self.register(name, pattern);
		self
	}

	pub fn register(&mut self, name: impl Into<String>, pattern: impl Into<String>) {
		self.routes.insert(name.into(), pattern.into());
	}

	/// Stop accepting `.{format}` suffixes
	pub fn without_format_suffixes(mut self) -> Self {
		self.format_suffixes = false;
		self
	}

	pub fn has_route(&self, name: &str) -> bool {
		self.routes.contains_key(name)
	}

	pub fn route_names(&self) -> Vec<String> {
		self.routes.keys().cloned().collect()
	}

	fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
		let expected: Vec<&str> = pattern.trim_matches('/').split('/').collect();
		let actual: Vec<&str> = path.trim_matches('/').split('/').collect();
		if expected.len() != actual.len() {
			return None;
		}

		let mut kwargs = HashMap::new();
		for (expected, actual) in expected.iter().zip(actual.iter()) {
			match expected
				.strip_prefix('{')
				.and_then(|rest| rest.strip_suffix('}'))
			{
				Some(name) => {
					if actual.is_empty() {
						return None;
					}
					// Hrefs come back percent-encoded; kwargs hold raw values.
					let value = percent_decode_str(actual).decode_utf8().ok()?;
					kwargs.insert(name.to_string(), value.into_owned());
				}
				None if expected == actual => {}
				None => return None,
			}
		}

		Some(kwargs)
	}

	fn resolve_exact(&self, path: &str) -> Option<ResolverMatch> {
		self.routes.iter().find_map(|(name, pattern)| {
			Self::match_pattern(pattern, path).map(|kwargs| ResolverMatch {
				view_name: name.clone(),
				kwargs,
			})
		})
	}
}

impl Default for RouteTable {
	fn default() -> Self {
		Self::new()
	}
}

impl UrlReverser for RouteTable {
	fn reverse(
		&self,
		view_name: &str,
		params: &HashMap<String, String>,
		format: Option<&str>,
	) -> Result<String, NoReverseMatch> {
		let pattern = self
			.routes
			.get(view_name)
			.ok_or_else(|| NoReverseMatch::new(view_name, "no route with this name"))?;

		let names = extract_param_names(pattern);
		for name in &names {
			if !params.contains_key(name) {
				return Err(NoReverseMatch::new(
					view_name,
					format!("missing parameter '{}'", name),
				));
			}
		}
		for (name, value) in params {
			if !names.contains(name) {
				return Err(NoReverseMatch::new(
					view_name,
					format!("unexpected parameter '{}'", name),
				));
			}
			if !is_safe_param(value) {
				return Err(NoReverseMatch::new(
					view_name,
					format!("invalid value for parameter '{}'", name),
				));
			}
		}

		let mut path = substitute_params(pattern, params);
		if let Some(format) = format {
			if !self.format_suffixes {
				return Err(NoReverseMatch::new(view_name, "format suffixes are disabled"));
			}
			path.push('.');
			path.push_str(format);
		}
		Ok(path)
	}

	fn resolve(&self, path: &str) -> Option<ResolverMatch> {
		if let Some(found) = self.resolve_exact(path) {
			return Some(found);
		}
		if !self.format_suffixes {
			return None;
		}

		let (stem, format) = path.rsplit_once('.')?;
		if format.is_empty() || format.contains('/') {
			return None;
		}
		let mut found = self.resolve_exact(stem)?;
		found
			.kwargs
			.insert(FORMAT_KWARG.to_string(), format.to_string());
		Some(found)
	}
}
