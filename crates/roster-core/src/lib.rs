//! Roster Core — domain models, error taxonomy, repository traits and
//! input validation shared by every Roster crate.

pub mod error;
pub mod models;
pub mod nickname;
pub mod repository;
pub mod validation;

pub use error::{RosterError, RosterResult};
