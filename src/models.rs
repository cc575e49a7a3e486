use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use thiserror::Error;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The authorization level of a user. Stored as lowercase text in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Reader,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Admin => "admin",
        }
    }
}

/// Raised when a stored role string is not one of the known roles.
#[derive(Debug, Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "reader" => Ok(Role::Reader),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

/// User
///
/// A registered account from the `users` table. The password is only ever held
/// as an argon2 PHC string and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: i64,
    // Unique, stored trimmed and lower-cased.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// BlogPost
///
/// A row of the `blog_posts` table. `author_id` always references an existing user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct BlogPost {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub subtitle: String,
    // Trusted HTML written by an administrator.
    pub body: String,
    pub img_url: String,
    pub created_at: DateTime<Utc>,
}

impl BlogPost {
    /// Publication date as shown on the site, e.g. `March 04, 2026`.
    pub fn display_date(&self) -> String {
        self.created_at.format("%B %d, %Y").to_string()
    }
}

/// AuthoredPost
///
/// A post joined with its author's display name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct AuthoredPost {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: BlogPost,
    pub author_name: String,
}

/// Comment
///
/// A row of the `comments` table. Comments are never edited; they disappear
/// only through cascading deletes of their post or author.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// AuthoredComment
///
/// A comment joined with the commenter's name and email (the email only feeds the avatar).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct AuthoredComment {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub comment: Comment,
    pub author_name: String,
    #[serde(skip_serializing)]
    pub author_email: String,
}

impl AuthoredComment {
    pub fn avatar_url(&self) -> String {
        gravatar_url(&self.author_email)
    }
}

/// PostDetail
///
/// Everything the single-post page needs: the post, its author and its comments (oldest first).
#[derive(Debug, Clone, Serialize, Default)]
pub struct PostDetail {
    pub post: AuthoredPost,
    pub comments: Vec<AuthoredComment>,
}

/// Gravatar image for an email: 100px, rating `g`, `retro` fallback.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=100&r=g&d=retro",
        hex::encode(digest)
    )
}

// --- Persistence Inputs ---

/// NewUser
///
/// Insert payload for a registration. The role is decided by the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

// --- Request Payloads (Form Schemas) ---

/// RegisterForm
///
/// Body of `POST /register`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// LoginForm
///
/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// PostDraft
///
/// Body of `POST /new-post` and `POST /edit-post/{id}`. Every field is required;
/// an edit overwrites all four in place.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

impl From<&BlogPost> for PostDraft {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            body: post.body.clone(),
            img_url: post.img_url.clone(),
        }
    }
}

/// CommentForm
///
/// Body of `POST /post/{id}/comment`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommentForm {
    pub text: String,
}
