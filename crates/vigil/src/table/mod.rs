//! In-memory feature tables and their cell values.

mod feature_table;
mod value;

pub use feature_table::FeatureTable;
pub use value::Value;
