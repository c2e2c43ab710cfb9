//! Document schemas for the challenge aggregate.
//!
//! One MongoDB document holds a whole Challenge together with its
//! embedded Submissions, Replies, Edits, and Content items. The
//! aggregate is the unit of load and save; nothing below the Challenge
//! has an independent lifecycle.

pub mod challenge;
pub mod content;

pub use challenge::{
    append_content, append_edit, deactivate_content, find_edit, Challenge, Edit, PostFields, Reply,
    Submission, CHALLENGE_COLLECTION,
};
pub use content::Content;
