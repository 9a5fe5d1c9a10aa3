//! Page-number pagination

use reinhardt_hal_serializers::{PaginationSettings, RequestContext};
use tracing::debug;

/// Errors raised while selecting a page
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PaginationError {
	/// The requested page does not exist
	#[error("Invalid page: {0}")]
	InvalidPage(String),
	/// Rendering the page failed
	#[error(transparent)]
	Serializer(#[from] reinhardt_hal_serializers::HalError),
}

const NOT_AN_INTEGER: &str = "That page number is not an integer";
const LESS_THAN_ONE: &str = "That page number is less than 1";
const NO_RESULTS: &str = "That page contains no results";

/// What an envelope needs to know about a page
pub trait Paginated {
	type Item;

	/// Items on this page
	fn items(&self) -> &[Self::Item];
	/// Current page number, 1-based
	fn number(&self) -> usize;
	fn num_pages(&self) -> usize;
	/// Total number of items across all pages
	fn count(&self) -> usize;
	/// 1-based index of the first item on this page, `0` when empty
	fn start_index(&self) -> usize;
	/// 1-based index of the last item on this page, `0` when empty
	fn end_index(&self) -> usize;

	fn has_next(&self) -> bool {
		self.number() < self.num_pages()
	}

	fn has_previous(&self) -> bool {
		self.number() > 1
	}

	fn next_page_number(&self) -> Result<usize, PaginationError> {
		if self.has_next() {
			Ok(self.number() + 1)
		} else {
			Err(PaginationError::InvalidPage(NO_RESULTS.to_string()))
		}
	}

	fn previous_page_number(&self) -> Result<usize, PaginationError> {
		if self.has_previous() {
			Ok(self.number() - 1)
		} else {
			Err(PaginationError::InvalidPage(LESS_THAN_ONE.to_string()))
		}
	}
}

/// A single page of results
#[derive(Debug, Clone)]
pub struct Page<T> {
	/// Items in this page
	pub object_list: Vec<T>,
	/// Current page number (1-indexed)
	pub number: usize,
	/// Total number of pages
	pub num_pages: usize,
	/// Total number of items across all pages
	pub count: usize,
	/// Items per page
	pub page_size: usize,
}

impl<T> Page<T> {
	/// # Examples
	///
	/// ```
	/// use reinhardt_hal_pagination::{Page, Paginated};
	///
	/// let page = Page::new(vec!["a", "b", "c"], 2, 5, 15, 3);
	/// assert_eq!(page.start_index(), 4);
	/// assert_eq!(page.end_index(), 6);
	/// assert!(page.has_next());
	/// assert_eq!(page.previous_page_number().unwrap(), 1);
	/// ```
	pub fn new(object_list: Vec<T>, number: usize, num_pages: usize, count: usize, page_size: usize) -> Self {
		Self {
			object_list,
			number,
			num_pages,
			count,
			page_size,
		}
	}

	pub fn len(&self) -> usize {
		self.object_list.len()
	}

	pub fn is_empty(&self) -> bool {
		self.object_list.is_empty()
	}

	/// All page numbers, 1-indexed
	pub fn page_range(&self) -> std::ops::RangeInclusive<usize> {
		1..=self.num_pages
	}
}

impl<T> Paginated for Page<T> {
	type Item = T;

	fn items(&self) -> &[T] {
		&self.object_list
	}

	fn number(&self) -> usize {
		self.number
	}

	fn num_pages(&self) -> usize {
		self.num_pages
	}

	fn count(&self) -> usize {
		self.count
	}

	fn start_index(&self) -> usize {
		if self.object_list.is_empty() {
			0
		} else {
			self.number.saturating_sub(1) * self.page_size + 1
		}
	}

	fn end_index(&self) -> usize {
		if self.object_list.is_empty() {
			0
		} else {
			self.start_index() + self.object_list.len() - 1
		}
	}
}

/// Page number based pagination
///
/// Example URLs:
/// - `http://testserver/polls?page=4`
/// - `http://testserver/polls?page=4&page_size=100`
#[derive(Debug, Clone)]
pub struct PageNumberPagination {
	/// Default page size
	pub page_size: usize,
	/// Query parameter name for page number
	pub page_query_param: String,
	/// Query parameter name for page size (optional)
	pub page_size_query_param: Option<String>,
	/// Maximum allowed page size
	pub max_page_size: Option<usize>,
	/// Strings that represent the last page
	pub last_page_strings: Vec<String>,
}

impl Default for PageNumberPagination {
	fn default() -> Self {
		Self::from_settings(&PaginationSettings::default())
	}
}

impl PageNumberPagination {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_settings(settings: &PaginationSettings) -> Self {
		Self {
			page_size: settings.page_size,
			page_query_param: settings.page_query_param.clone(),
			page_size_query_param: settings.page_size_query_param.clone(),
			max_page_size: settings.max_page_size,
			last_page_strings: settings.last_page_strings.clone(),
		}
	}

	pub fn page_size(mut self, size: usize) -> Self {
		self.page_size = size;
		self
	}

	pub fn page_query_param(mut self, param: impl Into<String>) -> Self {
		self.page_query_param = param.into();
		self
	}

	pub fn max_page_size(mut self, size: usize) -> Self {
		self.max_page_size = Some(size);
		self
	}

	pub fn page_size_query_param(mut self, param: impl Into<String>) -> Self {
		self.page_size_query_param = Some(param.into());
		self
	}

	/// Page size for a request: the query parameter, if valid, capped by
	/// `max_page_size`
	pub fn resolve_page_size(&self, request: &RequestContext) -> usize {
		let requested = self
			.page_size_query_param
			.as_deref()
			.and_then(|param| request.query_param(param))
			.and_then(|value| value.parse::<usize>().ok())
			.filter(|size| *size > 0);
		match (requested, self.max_page_size) {
			(Some(size), Some(max)) => size.min(max),
			(Some(size), None) => size,
			(None, _) => self.page_size,
		}
		.max(1)
	}

	/// Select one page of `items`
	///
	/// An empty result set always has one empty first page.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_hal_pagination::{PageNumberPagination, Paginated};
	///
	/// let paginator = PageNumberPagination::new().page_size(3);
	/// let items: Vec<i32> = (1..=7).collect();
	///
	/// let page = paginator.paginate(&items, Some("last")).unwrap();
	/// assert_eq!(page.number(), 3);
	/// assert_eq!(page.items(), &[7]);
	/// assert!(paginator.paginate(&items, Some("4")).is_err());
	/// ```
	pub fn paginate<T: Clone>(&self, items: &[T], page_param: Option<&str>) -> Result<Page<T>, PaginationError> {
		self.paginate_with_size(items, page_param, self.page_size.max(1))
	}

	/// Select the page a request asks for
	pub fn paginate_request<T: Clone>(
		&self,
		items: &[T],
		request: &RequestContext,
	) -> Result<Page<T>, PaginationError> {
		let page_param = request.query_param(&self.page_query_param);
		self.paginate_with_size(items, page_param.as_deref(), self.resolve_page_size(request))
	}

	fn paginate_with_size<T: Clone>(
		&self,
		items: &[T],
		page_param: Option<&str>,
		page_size: usize,
	) -> Result<Page<T>, PaginationError> {
		let count = items.len();
		let num_pages = count.div_ceil(page_size).max(1);

		let number = match page_param {
			Some(raw) => self.parse_page_number(raw, num_pages)?,
			None => 1,
		};
		if number > num_pages {
			return Err(PaginationError::InvalidPage(NO_RESULTS.to_string()));
		}

		let start = (number - 1) * page_size;
		let end = (start + page_size).min(count);
		debug!(number, num_pages, count, page_size, "selected page");
		Ok(Page::new(items[start..end].to_vec(), number, num_pages, count, page_size))
	}

	fn parse_page_number(&self, raw: &str, num_pages: usize) -> Result<usize, PaginationError> {
		if self.last_page_strings.iter().any(|s| s == raw) {
			return Ok(num_pages);
		}
		match raw.parse::<usize>() {
			Ok(0) => Err(PaginationError::InvalidPage(LESS_THAN_ONE.to_string())),
			Ok(number) => Ok(number),
			Err(_) => Err(PaginationError::InvalidPage(NOT_AN_INTEGER.to_string())),
		}
	}
}
