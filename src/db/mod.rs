//! MySQL access layer: connection, schema reflection, dynamic query results.
//!
//! Layout:
//! - `config.rs`: the database YAML shape and connect options
//! - `mysql.rs`: pool management, reflection, read-only query execution
//! - `context.rs`: rendering reflected tables into the prompt context

pub mod config;
pub mod context;
pub mod mysql;

pub use config::DatabaseConfig;
pub use context::{ColumnInfo, TableInfo, render_context};
pub use mysql::{Database, QueryTable};
