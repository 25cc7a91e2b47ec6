mod models;
mod query;
mod schema;
mod store;
mod validation;

pub use models::*;
pub use query::{Bound, CardFilter, FilterError, NumericField, TextField};
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::{CatalogWriter, SqliteCardStore};
pub use validation::{validate_card, ValidationError, ValidationResult};
