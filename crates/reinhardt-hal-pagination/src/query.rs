//! Query-string mutation

use url::Url;

/// `url` with `key` set to `value`, replacing earlier values
///
/// The query string is re-encoded with its keys sorted; repeated keys keep
/// their relative order.
///
/// # Examples
///
/// ```
/// use reinhardt_hal_pagination::replace_query_param;
/// use url::Url;
///
/// let url = Url::parse("http://testserver/polls?search=lunch&page=2").unwrap();
/// assert_eq!(
///     replace_query_param(&url, "page", "3"),
///     "http://testserver/polls?page=3&search=lunch"
/// );
/// ```
pub fn replace_query_param(url: &Url, key: &str, value: &str) -> String {
	let mut pairs: Vec<(String, String)> = url
		.query_pairs()
		.filter(|(k, _)| k != key)
		.map(|(k, v)| (k.into_owned(), v.into_owned()))
		.collect();
	pairs.push((key.to_string(), value.to_string()));
	pairs.sort_by(|a, b| a.0.cmp(&b.0));

	let mut replaced = url.clone();
	replaced.query_pairs_mut().clear().extend_pairs(&pairs);
	replaced.into()
}
