//! WordPress REST entities.
//!
//! Only the commonly used fields are modeled; every field the API may omit
//! (depending on `context` or permissions) defaults instead of failing the
//! decode. Dates are kept as the ISO-8601 strings the API returns.

use serde::{Deserialize, Serialize};

/// A `{ "rendered": ..., "raw": ... }` text field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    /// HTML as rendered for display.
    #[serde(default)]
    pub rendered: String,
    /// The stored source, only present in `context=edit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Whether the content is password protected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
}

/// Publication status of a post, page or media item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Publicly visible.
    #[default]
    Publish,
    /// Scheduled for the future.
    Future,
    /// Not yet published.
    Draft,
    /// Awaiting review.
    Pending,
    /// Visible only to authorized users.
    Private,
    /// In the trash.
    Trash,
    /// Attachments use this status.
    Inherit,
    /// Any status not listed above, e.g. `auto-draft` or one registered by a
    /// plugin.
    #[serde(other)]
    Other,
}

/// A blog post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    /// Unique identifier.
    pub id: u64,
    /// Publication date in the site's timezone.
    pub date: Option<String>,
    /// Publication date in UTC.
    pub date_gmt: Option<String>,
    /// Last modification date in the site's timezone.
    pub modified: Option<String>,
    /// URL-friendly name.
    pub slug: String,
    /// Publication status.
    pub status: Status,
    /// Permalink.
    pub link: String,
    /// Title.
    pub title: Rendered,
    /// Body.
    pub content: Rendered,
    /// Excerpt.
    pub excerpt: Rendered,
    /// Author user id.
    pub author: u64,
    /// Featured media id, `0` when none.
    pub featured_media: u64,
    /// Whether comments are open.
    pub comment_status: String,
    /// Whether the post is sticky.
    pub sticky: bool,
    /// Category ids.
    pub categories: Vec<u64>,
    /// Tag ids.
    pub tags: Vec<u64>,
}

/// A static page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    /// Unique identifier.
    pub id: u64,
    /// Publication date in the site's timezone.
    pub date: Option<String>,
    /// URL-friendly name.
    pub slug: String,
    /// Publication status.
    pub status: Status,
    /// Permalink.
    pub link: String,
    /// Title.
    pub title: Rendered,
    /// Body.
    pub content: Rendered,
    /// Author user id.
    pub author: u64,
    /// Parent page id, `0` for top-level pages.
    pub parent: u64,
    /// Sort order among siblings.
    pub menu_order: i64,
}

/// A registered user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Unique identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Author archive URL.
    pub link: String,
    /// URL-friendly name.
    pub slug: String,
    /// Biography.
    pub description: String,
    /// Login name, only present in `context=edit`.
    pub username: Option<String>,
    /// Email, only present in `context=edit`.
    pub email: Option<String>,
    /// Roles, only present in `context=edit`.
    pub roles: Vec<String>,
}

/// A post category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    /// Unique identifier.
    pub id: u64,
    /// Number of published posts in the category.
    pub count: u64,
    /// Description.
    pub description: String,
    /// Archive URL.
    pub link: String,
    /// Display name.
    pub name: String,
    /// URL-friendly name.
    pub slug: String,
    /// Parent category id, `0` for top-level.
    pub parent: u64,
}

/// A post tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    /// Unique identifier.
    pub id: u64,
    /// Number of published posts with the tag.
    pub count: u64,
    /// Description.
    pub description: String,
    /// Archive URL.
    pub link: String,
    /// Display name.
    pub name: String,
    /// URL-friendly name.
    pub slug: String,
}

/// A comment on a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    /// Unique identifier.
    pub id: u64,
    /// Id of the commented post.
    pub post: u64,
    /// Parent comment id, `0` for top-level.
    pub parent: u64,
    /// Author user id, `0` for guests.
    pub author: u64,
    /// Author display name.
    pub author_name: String,
    /// Publication date in the site's timezone.
    pub date: Option<String>,
    /// Body.
    pub content: Rendered,
    /// Moderation status (`approved`, `hold`, ...).
    pub status: String,
}

/// An item in the media library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    /// Unique identifier.
    pub id: u64,
    /// Upload date in the site's timezone.
    pub date: Option<String>,
    /// URL-friendly name.
    pub slug: String,
    /// Attachment page URL.
    pub link: String,
    /// Title.
    pub title: Rendered,
    /// Alternative text.
    pub alt_text: String,
    /// `image`, `file`, ...
    pub media_type: String,
    /// MIME type of the file.
    pub mime_type: String,
    /// Direct URL of the file.
    pub source_url: String,
    /// Id of the post the file is attached to.
    pub post: Option<u64>,
}

/// Writable fields of a post or page.
///
/// Unset fields are left out of the request so the server keeps its values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostFields {
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Excerpt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Publication status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// URL-friendly name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Category ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<u64>,
    /// Tag ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<u64>,
}

/// Writable fields of a category or tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TermFields {
    /// Display name.
    pub name: String,
    /// URL-friendly name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent term id (categories only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
}

/// Writable fields of a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentFields {
    /// Id of the commented post.
    pub post: u64,
    /// Body.
    pub content: String,
    /// Parent comment id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    /// Guest author name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Guest author email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_decodes_sparse_json() {
        let post: Post = serde_json::from_str(
            r#"{"id": 7, "title": {"rendered": "Hello"}, "status": "draft", "tags": [3]}"#,
        )
        .unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.title.rendered, "Hello");
        assert_eq!(post.status, Status::Draft);
        assert_eq!(post.tags, vec![3]);
        assert!(post.categories.is_empty());
    }

    #[test]
    fn test_post_fields_skip_unset() {
        let fields = PostFields {
            title: Some("Hi".to_string()),
            status: Some(Status::Publish),
            ..Default::default()
        };
        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value, serde_json::json!({"title": "Hi", "status": "publish"}));
    }

    #[test]
    fn test_unknown_status_decodes_as_other() {
        let posts: Vec<Post> = serde_json::from_str(
            r#"[{"id": 1, "status": "publish"}, {"id": 2, "status": "auto-draft"}]"#,
        )
        .unwrap();
        assert_eq!(posts[0].status, Status::Publish);
        assert_eq!(posts[1].status, Status::Other);
    }
}
