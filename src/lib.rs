#[macro_use]
extern crate diesel;

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod nn;
mod query;
pub mod schema;
pub mod service;
pub mod store;

pub use error::ServiceError;
