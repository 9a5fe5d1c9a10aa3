//! HAL serializer settings
//!
//! Settings are loaded once, typically from the project's TOML configuration,
//! and read when serializers are built. Every key is optional.
//!
//! ```toml
//! [hal]
//! default_view_name = "{app_label}:{model_name}-detail"
//! url_field_name = "url"
//!
//! [hal.pagination]
//! page_size = 20
//! max_page_size = 50
//! ```

use crate::meta::ModelMeta;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error type for settings loading
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Invalid setting `{key}`: {message}")]
	Invalid { key: String, message: String },
}

/// Settings for hyperlinked HAL serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalSettings {
	/// Pattern for a model's detail view name; supports `{model_name}` and `{app_label}`
	pub default_view_name: String,
	/// Name in `fields` that renders the self link as a top-level attribute
	pub url_field_name: String,
	/// Lookup used by links when none is configured
	pub default_lookup_field: String,
	pub pagination: PaginationSettings,
}

impl Default for HalSettings {
	fn default() -> Self {
		Self {
			default_view_name: "{model_name}-detail".to_string(),
			url_field_name: "url".to_string(),
			default_lookup_field: "pk".to_string(),
			pagination: PaginationSettings::default(),
		}
	}
}

/// Page-number pagination defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
	pub page_query_param: String,
	pub page_size: usize,
	/// Query parameter letting clients pick a page size; `None` disables it
	pub page_size_query_param: Option<String>,
	pub max_page_size: Option<usize>,
	/// Page values meaning "the last page"
	pub last_page_strings: Vec<String>,
}

impl Default for PaginationSettings {
	fn default() -> Self {
		Self {
			page_query_param: "page".to_string(),
			page_size: 10,
			page_size_query_param: Some("page_size".to_string()),
			max_page_size: Some(100),
			last_page_strings: vec!["last".to_string()],
		}
	}
}

impl HalSettings {
	/// Parse settings from TOML, either at the top level or under `[hal]`
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_hal_serializers::settings::HalSettings;
	///
	/// let settings = HalSettings::from_toml_str(r#"
	/// [hal]
	/// url_field_name = "href"
	///
	/// [hal.pagination]
	/// page_size = 3
	/// "#).unwrap();
	///
	/// assert_eq!(settings.url_field_name, "href");
	/// assert_eq!(settings.pagination.page_size, 3);
	/// assert_eq!(settings.default_lookup_field, "pk");
	/// ```
	pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
		let mut table: toml::Table = toml::from_str(content)?;
		let settings: HalSettings = match table.remove("hal") {
			Some(section) => section.try_into()?,
			None => toml::Value::Table(table).try_into()?,
		};
		settings.validate()?;
		Ok(settings)
	}

	/// Read and parse a TOML settings file
	pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	fn validate(&self) -> Result<(), SettingsError> {
		if self.default_view_name.trim().is_empty() {
			return Err(SettingsError::Invalid {
				key: "default_view_name".to_string(),
				message: "must not be empty".to_string(),
			});
		}
		if self.pagination.page_size == 0 {
			return Err(SettingsError::Invalid {
				key: "pagination.page_size".to_string(),
				message: "must be greater than zero".to_string(),
			});
		}
		Ok(())
	}

	/// Detail view name of a model, e.g. `choice-detail`
	pub fn view_name_for(&self, meta: &ModelMeta) -> String {
		self.default_view_name
			.replace("{model_name}", &meta.model_name())
			.replace("{app_label}", meta.app_label())
	}
}
