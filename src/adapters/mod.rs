//! Reference adapters producing ordered sequences and consuming classified actions.
pub mod iter;
pub mod ndjson;
