//! Gauntlet - challenge board content service
//!
//! Users post Challenges, other users respond with Submissions, those
//! receive Replies, and any of the three may later receive Edits. Every
//! post carries an append-only list of content items (text or uploaded
//! file metadata) that are only ever soft-deleted.
//!
//! The whole tree for one Challenge lives in a single MongoDB document
//! (the aggregate), so two read paths cover everything the transport
//! layer needs:
//!
//! - **PathResolver**: walk a chain of ids (challenge / submission /
//!   reply / edit) down the tree of one loaded aggregate
//! - **PaginationEngine**: list Challenges by tag, boosted entries
//!   first, then by views, with stable cursor pagination
//!
//! Mutations load one aggregate, apply one change, and save the whole
//! aggregate back. The GraphQL transport and file storage live in the
//! embedding service, not here.

pub mod config;
pub mod db;
pub mod logging;
pub mod mutation;
pub mod pagination;
pub mod path;
pub mod store;
pub mod types;

pub use config::{Args, Limits};
pub use types::{GauntletError, Result};
