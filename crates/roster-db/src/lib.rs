//! Roster Database — SurrealDB connection management, schema migrations
//! and the [`UserRepository`](roster_core::repository::UserRepository)
//! implementation.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::SurrealUserRepository;
pub use schema::{latest_version, run_migrations};
