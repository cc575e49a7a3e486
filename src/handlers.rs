use crate::{
    AppState,
    auth::{self, AdminUser, AuthUser, MaybeUser},
    error::{AppError, Result},
    models::{CommentForm, LoginForm, PostDraft, RegisterForm},
    services::{accounts, posts},
    views::{
        AboutPage, CommentView, ContactPage, IndexPage, LoginPage, NavContext, NoticeQuery,
        PostCard, PostFormPage, PostPage, PostView, RegisterPage,
    },
};
use axum::{
    Form,
    extract::{FromRequestParts, Path, Query, State, rejection::QueryRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// PostId
///
/// The `{id}` segment of post routes. Anything that is not an integer id names
/// no post, so it is rejected with 404 like an unknown id.
#[derive(Debug, Clone, Copy)]
pub struct PostId(pub i64);

impl<S> FromRequestParts<S> for PostId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        raw.parse().map(Self).map_err(|_| AppError::NotFound)
    }
}

/// `?notice=` as received. A malformed query string renders the page without a notice.
pub type NoticeParam = std::result::Result<Query<NoticeQuery>, QueryRejection>;

fn notice_from(query: NoticeParam) -> Option<String> {
    query.ok().and_then(|Query(query)| query.message())
}

// --- Posts ---

/// list_posts
///
/// [Public Route] The home page: every post, newest first.
pub async fn list_posts(
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
    query: NoticeParam,
) -> Result<IndexPage> {
    let all = posts::list_posts(state.repo.as_ref()).await?;
    Ok(IndexPage {
        nav: NavContext::for_user(user.as_ref()),
        notice: notice_from(query),
        posts: all.iter().map(PostCard::from).collect(),
    })
}

async fn post_page(
    state: &AppState,
    nav: NavContext,
    id: i64,
    error: Option<String>,
    comment_text: String,
) -> Result<PostPage> {
    let detail = posts::view_post(state.repo.as_ref(), id).await?;
    Ok(PostPage {
        nav,
        post: PostView::from(&detail.post),
        comments: detail.comments.iter().map(CommentView::from).collect(),
        error,
        comment_text,
    })
}

/// show_post
///
/// [Public Route] One post with its comments. The comment form is only rendered
/// for logged-in visitors.
pub async fn show_post(
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
    PostId(id): PostId,
) -> Result<PostPage> {
    post_page(&state, NavContext::for_user(user.as_ref()), id, None, String::new()).await
}

/// add_comment
///
/// [Authenticated Route] Stores a comment and returns to the post. A blank comment
/// re-renders the post page with an inline message.
pub async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    PostId(post_id): PostId,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    match posts::add_comment(state.repo.as_ref(), &user, post_id, &form.text).await {
        Ok(_) => Ok(Redirect::to(&format!("/post/{post_id}")).into_response()),
        Err(err @ AppError::EmptyComment) => {
            let page = post_page(
                &state,
                NavContext::for_user(Some(&user)),
                post_id,
                Some(err.user_message()),
                form.text,
            )
            .await?;
            Ok((err.status(), page).into_response())
        }
        Err(err) => Err(err),
    }
}

/// new_post_page
///
/// [Admin Route] Empty post editor.
pub async fn new_post_page(admin: AdminUser) -> PostFormPage {
    PostFormPage {
        nav: NavContext::for_user(Some(admin.user())),
        is_edit: false,
        action: "/new-post".to_string(),
        draft: PostDraft::default(),
        error: None,
    }
}

/// create_post
///
/// [Admin Route] Publishes a post and returns to the listing. Invalid input or a
/// taken title re-renders the editor with the submitted values.
pub async fn create_post(
    admin: AdminUser,
    State(state): State<AppState>,
    Form(draft): Form<PostDraft>,
) -> Result<Response> {
    match posts::create_post(state.repo.as_ref(), &admin, draft.clone()).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(err @ (AppError::Validation(_) | AppError::DuplicateTitle)) => {
            let page = PostFormPage {
                nav: NavContext::for_user(Some(admin.user())),
                is_edit: false,
                action: "/new-post".to_string(),
                draft,
                error: Some(err.user_message()),
            };
            Ok((err.status(), page).into_response())
        }
        Err(err) => Err(err),
    }
}

/// edit_post_page
///
/// [Admin Route] Post editor pre-filled with the stored post.
pub async fn edit_post_page(
    admin: AdminUser,
    State(state): State<AppState>,
    PostId(id): PostId,
) -> Result<PostFormPage> {
    let detail = posts::view_post(state.repo.as_ref(), id).await?;
    Ok(PostFormPage {
        nav: NavContext::for_user(Some(admin.user())),
        is_edit: true,
        action: format!("/edit-post/{id}"),
        draft: PostDraft::from(&detail.post.post),
        error: None,
    })
}

/// edit_post
///
/// [Admin Route] Saves the edited fields and shows the post.
pub async fn edit_post(
    admin: AdminUser,
    State(state): State<AppState>,
    PostId(id): PostId,
    Form(draft): Form<PostDraft>,
) -> Result<Response> {
    match posts::edit_post(state.repo.as_ref(), &admin, id, draft.clone()).await {
        Ok(post) => Ok(Redirect::to(&format!("/post/{}", post.id)).into_response()),
        Err(err @ (AppError::Validation(_) | AppError::DuplicateTitle)) => {
            let page = PostFormPage {
                nav: NavContext::for_user(Some(admin.user())),
                is_edit: true,
                action: format!("/edit-post/{id}"),
                draft,
                error: Some(err.user_message()),
            };
            Ok((err.status(), page).into_response())
        }
        Err(err) => Err(err),
    }
}

/// delete_post
///
/// [Admin Route] Deletes a post (and its comments) and returns to the listing.
pub async fn delete_post(
    admin: AdminUser,
    State(state): State<AppState>,
    PostId(id): PostId,
) -> Result<Redirect> {
    posts::delete_post(state.repo.as_ref(), &admin, id).await?;
    Ok(Redirect::to("/?notice=post_deleted"))
}

// --- Accounts ---

/// register_page
///
/// [Public Route] Registration form.
pub async fn register_page(MaybeUser(user): MaybeUser) -> RegisterPage {
    RegisterPage {
        nav: NavContext::for_user(user.as_ref()),
        email: String::new(),
        name: String::new(),
        error: None,
    }
}

/// register
///
/// [Public Route] Creates the account and logs it in. A duplicate email is sent to
/// the login page with a notice; invalid input re-renders the form.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    match accounts::register(state.repo.as_ref(), form.clone()).await {
        Ok(user) => {
            auth::log_in(&session, &user).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(AppError::DuplicateEmail) => {
            Ok(Redirect::to("/login?notice=existing_account").into_response())
        }
        Err(err @ AppError::Validation(_)) => {
            let page = RegisterPage {
                nav: NavContext::default(),
                email: form.email,
                name: form.name,
                error: Some(err.user_message()),
            };
            Ok((err.status(), page).into_response())
        }
        Err(err) => Err(err),
    }
}

/// login_page
///
/// [Public Route] Login form, with an optional notice from a redirect.
pub async fn login_page(
    MaybeUser(user): MaybeUser,
    query: NoticeParam,
) -> LoginPage {
    LoginPage {
        nav: NavContext::for_user(user.as_ref()),
        email: String::new(),
        error: None,
        notice: notice_from(query),
    }
}

/// login
///
/// [Public Route] Logs the user in. Both an unknown email and a wrong password
/// re-render the form with the same message.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match accounts::login(state.repo.as_ref(), form.clone()).await {
        Ok(user) => {
            auth::log_in(&session, &user).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(err @ (AppError::UnknownUser | AppError::InvalidCredentials)) => {
            let page = LoginPage {
                nav: NavContext::default(),
                email: form.email,
                error: Some(err.user_message()),
                notice: None,
            };
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
        Err(err) => Err(err),
    }
}

/// logout
///
/// [Authenticated Route] Clears the session.
pub async fn logout(session: Session) -> Result<Redirect> {
    auth::log_out(&session).await?;
    tracing::info!("user logged out");
    Ok(Redirect::to("/?notice=logged_out"))
}

// --- Static pages ---

pub async fn about(MaybeUser(user): MaybeUser) -> AboutPage {
    AboutPage {
        nav: NavContext::for_user(user.as_ref()),
    }
}

pub async fn contact(MaybeUser(user): MaybeUser) -> ContactPage {
    ContactPage {
        nav: NavContext::for_user(user.as_ref()),
    }
}
