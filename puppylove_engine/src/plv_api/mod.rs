//! # PuppyLove public API
//!
//! * [`hearts_api`] drives hearts through the ledger: sending, drafts, claims, returns and match verification.
//! * [`profile_api`] manages profiles and the public directories every client downloads.
//! * [`admin_api`] controls the phases of PuppyLove and serves statistics once results are out.
//!
//! Each API is created from a database backend implementing the traits it needs:
//!
//! ```rust,ignore
//! use puppylove_engine::{HeartsApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/puppylove.db", 5).await?;
//! let hearts = HeartsApi::new(db);
//! let outcome = hearts.verify("210001", "my secret", "enc").await?;
//! ```
pub mod admin_api;
pub mod errors;
pub mod heart_objects;
pub mod hearts_api;
pub mod profile_api;
pub mod profile_objects;
