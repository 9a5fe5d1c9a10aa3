//! Representation fields
//!
//! - [`plain`]: scalar attributes
//! - [`link`]: [`LinkResolver`], one hyperlink
//! - [`links`]: [`LinksField`], the `_links` section
//! - [`embedded`]: [`EmbeddedField`], the `_embedded` section
//! - [`method`]: computed values
//! - [`spec`]: [`FieldSpec`], the classified description of each field

pub mod embedded;
pub mod link;
pub mod links;
pub mod method;
pub mod plain;
pub mod spec;

pub use embedded::EmbeddedField;
pub use link::LinkResolver;
pub use links::{LinksField, SELF_LINK};
pub use method::{MethodField, MethodFieldError, MethodFn};
pub use spec::{FieldKind, FieldSpec, Placement, Source, Transform};
