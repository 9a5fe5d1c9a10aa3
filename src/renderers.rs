//! HAL JSON renderer

use bytes::Bytes;
use serde::Serialize;

/// Media type of HAL documents
pub const HAL_JSON_MEDIA_TYPE: &str = "application/hal+json";

/// Errors produced while rendering
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Renders documents, pagination envelopes and validation errors as
/// `application/hal+json`
#[derive(Debug, Clone, Default)]
pub struct HalJsonRenderer {
	/// Whether to indent the output
	pub pretty: bool,
}

impl HalJsonRenderer {
	/// # Examples
	///
	/// ```
	/// use reinhardt_hal::HalJsonRenderer;
	///
	/// let renderer = HalJsonRenderer::new();
	/// assert!(!renderer.pretty);
	/// assert_eq!(renderer.media_type(), "application/hal+json");
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	pub fn pretty(mut self, pretty: bool) -> Self {
		self.pretty = pretty;
		self
	}

	pub fn media_type(&self) -> &'static str {
		HAL_JSON_MEDIA_TYPE
	}

	/// Value of the `Content-Type` header
	pub fn content_type(&self) -> String {
		format!("{}; charset=utf-8", HAL_JSON_MEDIA_TYPE)
	}

	pub fn format(&self) -> Option<&str> {
		Some("hal")
	}

	pub fn render<T: Serialize + ?Sized>(&self, data: &T) -> Result<Bytes, RenderError> {
		let body = if self.pretty {
			serde_json::to_vec_pretty(data)?
		} else {
			serde_json::to_vec(data)?
		};
		tracing::debug!(bytes = body.len(), media_type = HAL_JSON_MEDIA_TYPE, "rendered response body");
		Ok(Bytes::from(body))
	}
}
