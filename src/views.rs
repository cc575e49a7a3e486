//! Typed view-models, one per page.
//!
//! Handlers build these structs and return them; askama renders them with the
//! templates under `templates/`. Templates never see database rows directly.

use askama::Template;
use askama_web::WebTemplate;
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    models::{AuthoredComment, AuthoredPost, PostDraft},
};

/// NavContext
///
/// What the navigation bar needs to know about the visitor.
#[derive(Debug, Clone, Default)]
pub struct NavContext {
    pub user_name: Option<String>,
    pub is_admin: bool,
}

impl NavContext {
    pub fn for_user(user: Option<&CurrentUser>) -> Self {
        Self {
            user_name: user.map(|u| u.name.clone()),
            is_admin: user.is_some_and(CurrentUser::is_admin),
        }
    }

    pub fn logged_in(&self) -> bool {
        self.user_name.is_some()
    }
}

/// `?notice=<code>` carried by redirects and shown once on the target page.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    pub fn message(&self) -> Option<String> {
        self.notice.as_deref().and_then(notice_message).map(str::to_string)
    }
}

/// Text for a notice code. Unknown codes render nothing.
pub fn notice_message(code: &str) -> Option<&'static str> {
    match code {
        "login_required" => Some("You need to login or register to do that."),
        "existing_account" => {
            Some("There is an existing user with this email! Try to login with your credentials")
        }
        "logged_out" => Some("You have been logged out."),
        "post_deleted" => Some("The post has been deleted."),
        _ => None,
    }
}

/// PostCard
///
/// One entry of the post listing.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

impl From<&AuthoredPost> for PostCard {
    fn from(authored: &AuthoredPost) -> Self {
        Self {
            id: authored.post.id,
            title: authored.post.title.clone(),
            subtitle: authored.post.subtitle.clone(),
            author: authored.author_name.clone(),
            date: authored.post.display_date(),
        }
    }
}

/// PostView
///
/// The full post as shown on its own page.
#[derive(Debug, Clone)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
    pub author: String,
    pub date: String,
}

impl From<&AuthoredPost> for PostView {
    fn from(authored: &AuthoredPost) -> Self {
        Self {
            id: authored.post.id,
            title: authored.post.title.clone(),
            subtitle: authored.post.subtitle.clone(),
            body: authored.post.body.clone(),
            img_url: authored.post.img_url.clone(),
            author: authored.author_name.clone(),
            date: authored.post.display_date(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub text: String,
    pub author: String,
    pub avatar_url: String,
}

impl From<&AuthoredComment> for CommentView {
    fn from(authored: &AuthoredComment) -> Self {
        Self {
            text: authored.comment.text.clone(),
            author: authored.author_name.clone(),
            avatar_url: authored.avatar_url(),
        }
    }
}

// --- Pages ---

/// Home page: every post, newest first.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub nav: NavContext,
    pub notice: Option<String>,
    pub posts: Vec<PostCard>,
}

/// Single post with its comments and, for logged-in users, the comment form.
#[derive(Template, WebTemplate)]
#[template(path = "post.html")]
pub struct PostPage {
    pub nav: NavContext,
    pub post: PostView,
    pub comments: Vec<CommentView>,
    // Inline message for a rejected comment.
    pub error: Option<String>,
    pub comment_text: String,
}

/// Create and edit form for posts.
#[derive(Template, WebTemplate)]
#[template(path = "make-post.html")]
pub struct PostFormPage {
    pub nav: NavContext,
    pub is_edit: bool,
    pub action: String,
    pub draft: PostDraft,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub nav: NavContext,
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub nav: NavContext,
    pub email: String,
    pub name: String,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutPage {
    pub nav: NavContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactPage {
    pub nav: NavContext,
}

/// Status page for 403/404/500 responses.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub nav: NavContext,
    pub status: u16,
    pub message: String,
}
