//! PostgreSQL destination adapter.
pub mod db_context;
pub mod record_source;
pub mod schema;
