#![recursion_limit = "1024"]

#[macro_use]
extern crate log;
#[cfg(feature = "postgres")]
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate error_chain;

pub mod adapters;
pub mod app_config;
#[cfg(feature = "postgres")]
pub mod db;
pub mod errors;
pub mod merge;
pub mod models;
pub mod reporting;
pub mod sync;
