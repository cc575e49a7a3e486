//! Post management and commenting.

use url::Url;

use crate::{
    auth::{AdminUser, CurrentUser},
    error::{AppError, Result},
    models::{AuthoredPost, BlogPost, Comment, PostDetail, PostDraft},
    repository::{Repository, RepositoryError},
};

use super::required;

/// Trims every field, rejects blanks and requires an absolute http(s) image URL.
pub fn validate_draft(draft: PostDraft) -> Result<PostDraft> {
    let title = required(&draft.title, "Title")?;
    let subtitle = required(&draft.subtitle, "Subtitle")?;
    let body = required(&draft.body, "Content")?;
    let img_url = required(&draft.img_url, "Image URL")?;

    match Url::parse(&img_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => {
            return Err(AppError::Validation(
                "Image URL must be an absolute http(s) URL.".to_string(),
            ));
        }
    }

    Ok(PostDraft {
        title,
        subtitle,
        body,
        img_url,
    })
}

fn title_conflict(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Conflict(_) => AppError::DuplicateTitle,
        other => AppError::Repository(other),
    }
}

/// All posts, newest first (ties broken by id, highest first).
pub async fn list_posts(repo: &dyn Repository) -> Result<Vec<AuthoredPost>> {
    Ok(repo.list_posts().await?)
}

/// One post with its author and comments.
pub async fn view_post(repo: &dyn Repository, id: i64) -> Result<PostDetail> {
    let post = repo.get_post(id).await?.ok_or(AppError::NotFound)?;
    let comments = repo.get_comments(id).await?;
    Ok(PostDetail { post, comments })
}

/// Publishes a new post authored by `admin`, dated now.
pub async fn create_post(
    repo: &dyn Repository,
    admin: &AdminUser,
    draft: PostDraft,
) -> Result<BlogPost> {
    let draft = validate_draft(draft)?;
    let post = repo
        .create_post(admin.id(), draft)
        .await
        .map_err(title_conflict)?;

    tracing::info!(post_id = post.id, admin_id = admin.id(), "post created");
    Ok(post)
}

/// edit_post
///
/// Overwrites title, subtitle, body and image URL. Id, author and creation date
/// are preserved.
pub async fn edit_post(
    repo: &dyn Repository,
    admin: &AdminUser,
    id: i64,
    draft: PostDraft,
) -> Result<BlogPost> {
    if repo.get_post(id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let draft = validate_draft(draft)?;

    let post = repo
        .update_post(id, draft)
        .await
        .map_err(title_conflict)?
        .ok_or(AppError::NotFound)?;

    tracing::info!(post_id = post.id, admin_id = admin.id(), "post edited");
    Ok(post)
}

/// Removes a post together with its comments.
pub async fn delete_post(repo: &dyn Repository, admin: &AdminUser, id: i64) -> Result<()> {
    if !repo.delete_post(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(post_id = id, admin_id = admin.id(), "post deleted");
    Ok(())
}

/// add_comment
///
/// Stores a comment by `user` on `post_id`. The post must exist and the text must
/// contain something other than whitespace; it is stored trimmed.
pub async fn add_comment(
    repo: &dyn Repository,
    user: &CurrentUser,
    post_id: i64,
    text: &str,
) -> Result<Comment> {
    if repo.get_post(post_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::EmptyComment);
    }

    let comment = repo
        .add_comment(post_id, user.id, text.to_string())
        .await
        .map_err(|e| match e {
            // The post was deleted between the check and the insert.
            RepositoryError::MissingReference(_) => AppError::NotFound,
            other => AppError::Repository(other),
        })?;

    tracing::debug!(comment_id = comment.id, post_id, user_id = user.id, "comment added");
    Ok(comment)
}
