//! Template catalog
//!
//! Every supported chain operation is a data entry in `templates/catalog.json`.
//! Adding an operation means adding an entry there and a resolver rule that
//! points at it; nothing else branches on intent identifiers.

mod catalog;
mod error;

pub use catalog::{TemplateCatalog, TemplateEntry};
pub use error::CatalogError;
