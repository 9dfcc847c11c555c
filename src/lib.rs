//! Aircraft tracking feed ingestion
//!
//! Seeds a record store from a live aircraft feed, then keeps stored
//! positions current on a fixed interval.

pub mod config;
pub mod database;
pub mod errors;
pub mod feed;
pub mod models;
pub mod query;
pub mod updater;
