//! Declared table schemas.
//!
//! Schemas are supplied as configuration, never inferred from data.

mod config;

pub use config::{ColumnRoles, ValidationConfig};
