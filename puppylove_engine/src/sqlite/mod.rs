//! SQLite backend for the PuppyLove engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
