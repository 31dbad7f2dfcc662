//! Listing core for the OkinawaNow rental marketplace: keeps the two
//! denormalized listing collections reconciled, assembles the amenity view
//! model, and carries the favorites and tour-request workflows. Consumed as
//! a library by the web tier; the bundled binary runs the maintenance tasks.

pub mod amenities;
pub mod auth;
pub mod config;
pub mod error;
pub mod favorites;
pub mod models;
pub mod store;
pub mod sync;
pub mod tours;

pub use error::{Error, Result};
