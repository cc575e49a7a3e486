use crate::models::{AuthoredComment, AuthoredPost, BlogPost, Comment, NewUser, PostDraft, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;

/// RepositoryError
///
/// Persistence failures, split so callers can turn constraint violations into
/// user-facing errors while everything else becomes a 500.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A UNIQUE constraint rejected the write (duplicate email or post title).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A FOREIGN KEY constraint rejected the write (the referenced row is gone).
    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::MissingReference(db.message().to_string())
            }
            _ => RepositoryError::Database(err),
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence contract used by the services. Handlers never see SQL; tests swap
/// in a mock or an in-memory SQLite database.
///
/// **Send + Sync + async_trait** are required to share `Arc<dyn Repository>` across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    // `email` must already be normalized (trimmed, lower-cased).
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    // The first user ever inserted becomes the admin; `Conflict` on a duplicate email.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Posts ---
    // Newest first, ties broken by id descending.
    async fn list_posts(&self) -> RepoResult<Vec<AuthoredPost>>;
    async fn get_post(&self, id: i64) -> RepoResult<Option<AuthoredPost>>;
    // `Conflict` on a duplicate title.
    async fn create_post(&self, author_id: i64, draft: PostDraft) -> RepoResult<BlogPost>;
    // Overwrites the editable fields; author and creation time are kept. `None` if absent.
    async fn update_post(&self, id: i64, draft: PostDraft) -> RepoResult<Option<BlogPost>>;
    // Returns false if no row was deleted. Comments go with the post (ON DELETE CASCADE).
    async fn delete_post(&self, id: i64) -> RepoResult<bool>;

    // --- Comments ---
    async fn add_comment(&self, post_id: i64, author_id: i64, text: String) -> RepoResult<Comment>;
    // Oldest first.
    async fn get_comments(&self, post_id: i64) -> RepoResult<Vec<AuthoredComment>>;
}

/// RepositoryState
///
/// The shared handle stored in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by SQLite.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance over an initialized, migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "p.id, p.author_id, p.title, p.subtitle, p.body, p.img_url, p.created_at, u.name AS author_name";

fn logged(operation: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |err| {
        let err = RepositoryError::from(err);
        if let RepositoryError::Database(inner) = &err {
            tracing::error!(operation, error = ?inner, "repository query failed");
        }
        err
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, name, role FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(logged("get_user"))
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, name, role FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(logged("find_user_by_email"))
    }

    /// create_user
    ///
    /// The role is chosen inside the INSERT so two concurrent first registrations
    /// cannot both become admin.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, role)
            VALUES (?, ?, ?, CASE WHEN EXISTS (SELECT 1 FROM users) THEN 'reader' ELSE 'admin' END)
            RETURNING id, email, password_hash, name, role
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(logged("create_user"))
    }

    async fn list_posts(&self) -> RepoResult<Vec<AuthoredPost>> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM blog_posts p JOIN users u ON u.id = p.author_id \
             ORDER BY p.created_at DESC, p.id DESC"
        );
        sqlx::query_as::<_, AuthoredPost>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(logged("list_posts"))
    }

    async fn get_post(&self, id: i64) -> RepoResult<Option<AuthoredPost>> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM blog_posts p JOIN users u ON u.id = p.author_id \
             WHERE p.id = ?"
        );
        sqlx::query_as::<_, AuthoredPost>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(logged("get_post"))
    }

    async fn create_post(&self, author_id: i64, draft: PostDraft) -> RepoResult<BlogPost> {
        sqlx::query_as::<_, BlogPost>(
            r#"
            INSERT INTO blog_posts (author_id, title, subtitle, body, img_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, author_id, title, subtitle, body, img_url, created_at
            "#,
        )
        .bind(author_id)
        .bind(&draft.title)
        .bind(&draft.subtitle)
        .bind(&draft.body)
        .bind(&draft.img_url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(logged("create_post"))
    }

    async fn update_post(&self, id: i64, draft: PostDraft) -> RepoResult<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(
            r#"
            UPDATE blog_posts
            SET title = ?, subtitle = ?, body = ?, img_url = ?
            WHERE id = ?
            RETURNING id, author_id, title, subtitle, body, img_url, created_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.subtitle)
        .bind(&draft.body)
        .bind(&draft.img_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(logged("update_post"))
    }

    async fn delete_post(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(logged("delete_post"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_comment(&self, post_id: i64, author_id: i64, text: String) -> RepoResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, text, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, post_id, author_id, text, created_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(logged("add_comment"))
    }

    async fn get_comments(&self, post_id: i64) -> RepoResult<Vec<AuthoredComment>> {
        sqlx::query_as::<_, AuthoredComment>(
            r#"
            SELECT c.id, c.post_id, c.author_id, c.text, c.created_at,
                   u.name AS author_name, u.email AS author_email
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ?
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(logged("get_comments"))
    }
}
