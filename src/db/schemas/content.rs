//! Content items attached to posts and edits.
//!
//! A post's content list is append-only: items are soft-deleted by
//! clearing `is_active`, never removed, so the sequence keeps its
//! insertion order forever. The `kind` discriminator is fixed at
//! construction time and stored with the document.

use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A single content item: either a block of text or the metadata of an
/// uploaded file (the bytes live in the file storage collaborator).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content {
    Text {
        id: ObjectId,
        created_at: DateTime,
        #[serde(default = "default_true")]
        is_active: bool,
        text_content: String,
    },
    Upload {
        id: ObjectId,
        created_at: DateTime,
        #[serde(default = "default_true")]
        is_active: bool,
        filename: String,
        mimetype: String,
    },
}

impl Content {
    /// Create a text content item
    pub fn text(text_content: impl Into<String>) -> Self {
        Content::Text {
            id: ObjectId::new(),
            created_at: DateTime::now(),
            is_active: true,
            text_content: text_content.into(),
        }
    }

    /// Create an uploaded-file content item
    pub fn upload(filename: impl Into<String>, mimetype: impl Into<String>) -> Self {
        Content::Upload {
            id: ObjectId::new(),
            created_at: DateTime::now(),
            is_active: true,
            filename: filename.into(),
            mimetype: mimetype.into(),
        }
    }

    /// Item id (unique within its containing list)
    pub fn id(&self) -> ObjectId {
        match self {
            Content::Text { id, .. } | Content::Upload { id, .. } => *id,
        }
    }

    /// Whether the item is still visible
    pub fn is_active(&self) -> bool {
        match self {
            Content::Text { is_active, .. } | Content::Upload { is_active, .. } => *is_active,
        }
    }

    /// Creation timestamp
    pub fn created_at(&self) -> DateTime {
        match self {
            Content::Text { created_at, .. } | Content::Upload { created_at, .. } => *created_at,
        }
    }

    /// Soft-delete this item
    pub fn deactivate(&mut self) {
        match self {
            Content::Text { is_active, .. } | Content::Upload { is_active, .. } => {
                *is_active = false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminator_is_stored() {
        let text = Content::text("hello");
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["kind"], "text");
        assert_eq!(json["text_content"], "hello");

        let upload = Content::upload("diagram.png", "image/png");
        let json = serde_json::to_value(&upload).unwrap();
        assert_eq!(json["kind"], "upload");
        assert_eq!(json["mimetype"], "image/png");
    }

    #[test]
    fn test_deactivate_keeps_payload() {
        let mut item = Content::upload("a.txt", "text/plain");
        assert!(item.is_active());
        item.deactivate();
        assert!(!item.is_active());
        match item {
            Content::Upload { filename, .. } => assert_eq!(filename, "a.txt"),
            _ => panic!("kind changed"),
        }
    }
}
