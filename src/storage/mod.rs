pub mod db;
mod media;
pub mod models;
mod settings;
mod tables;

pub use db::{Database, DatabaseError, PurgeStats};
pub use tables::*;
