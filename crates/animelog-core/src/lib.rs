//! Anime notes in a markdown vault.
//!
//! [`note::NoteService`] resolves a catalog record to its note, creating it
//! with front-matter, tags, a thumbnail and a status block when missing.
//! [`status`] keeps that block in step with the status control, and
//! [`flow`] and [`panel`] hold the state of the selection wizard and the
//! rendered status block.

pub mod block;
pub mod config;
pub mod error;
pub mod flow;
pub mod frontmatter;
pub mod models;
pub mod naming;
pub mod note;
pub mod notify;
pub mod panel;
pub mod status;
pub mod thumbnail;
pub mod vault;

pub use error::{AnimelogError, VaultError};
pub use models::WatchStatus;
