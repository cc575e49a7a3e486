use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    error::AppError,
    models::{Role, User},
    repository::RepositoryState,
};

/// Session key holding the logged-in user's id. Nothing else about the user is
/// kept in the session; the record is re-read on every request.
pub const SESSION_USER_KEY: &str = "user_id";

/// Where unauthenticated visitors are sent by `AuthUser`.
pub const LOGIN_REDIRECT: &str = "/login?notice=login_required";

/// CurrentUser
///
/// The identity resolved for one request. Handlers pass it explicitly to the
/// services that need to know who is acting.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// AdminUser
///
/// Proof that the acting user is an administrator. The only way to build one is
/// `AdminUser::try_from`, so services taking `&AdminUser` cannot be reached by readers.
#[derive(Debug, Clone)]
pub struct AdminUser(CurrentUser);

impl AdminUser {
    pub fn user(&self) -> &CurrentUser {
        &self.0
    }

    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl TryFrom<CurrentUser> for AdminUser {
    type Error = AppError;

    fn try_from(user: CurrentUser) -> Result<Self, Self::Error> {
        if user.is_admin() {
            Ok(Self(user))
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Loads the session's user, if any.
///
/// A session whose user no longer exists counts as anonymous. A request that did not
/// pass through the session layer also counts as anonymous.
async fn resolve_user(
    parts: &Parts,
    repo: &RepositoryState,
) -> Result<Option<CurrentUser>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        tracing::warn!("session layer missing; treating request as anonymous");
        return Ok(None);
    };

    let Some(user_id) = session.get::<i64>(SESSION_USER_KEY).await? else {
        return Ok(None);
    };

    let user = repo.get_user(user_id).await?;
    if user.is_none() {
        tracing::info!(user_id, "session refers to a deleted user");
    }
    Ok(user.map(CurrentUser::from))
}

/// MaybeUser
///
/// Extractor for pages that everybody can see but that render differently for
/// logged-in users (navigation, comment form).
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        Ok(Self(resolve_user(parts, &repo).await?))
    }
}

/// AuthUser
///
/// Extractor for login-only actions. Anonymous requests are redirected to the
/// login page before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

/// Rejection of `AuthUser`.
#[derive(Debug)]
pub enum AuthRejection {
    RedirectToLogin,
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_REDIRECT).into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        match resolve_user(parts, &repo).await {
            Ok(Some(user)) => Ok(Self(user)),
            Ok(None) => Err(AuthRejection::RedirectToLogin),
            Err(err) => Err(AuthRejection::Failed(err)),
        }
    }
}

/// Admin-only actions answer 403 to anonymous visitors and readers alike.
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let user = resolve_user(parts, &repo)
            .await?
            .ok_or(AppError::Unauthorized)?;
        AdminUser::try_from(user)
    }
}

// --- Session helpers ---

/// Marks `user` as logged in. The session id is rotated first so a session id
/// issued before login cannot be reused afterwards.
pub async fn log_in(session: &Session, user: &User) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_KEY, user.id).await?;
    Ok(())
}

/// Drops everything in the session. Safe to call when nobody is logged in.
pub async fn log_out(session: &Session) -> Result<(), AppError> {
    session.flush().await?;
    Ok(())
}

// --- Password hashing ---

/// Hashes a password with argon2id and a fresh random salt (PHC string format).
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Checks `password` against a stored PHC string.
///
/// Returns `InvalidCredentials` on mismatch and `PasswordHash` if the stored
/// hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AppError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AppError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(password_hash::Error::Password) => Err(AppError::InvalidCredentials),
        Err(e) => Err(AppError::PasswordHash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> CurrentUser {
        CurrentUser {
            id: 2,
            name: "Reader".to_string(),
            email: "reader@example.com".to_string(),
            role: Role::Reader,
        }
    }

    #[test]
    fn hashes_are_salted_and_verify() {
        let first = hash_password("pw1").unwrap();
        let second = hash_password("pw1").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("pw1", &first).is_ok());
        assert!(verify_password("pw1", &second).is_ok());
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let hash = hash_password("pw1").unwrap();
        assert!(matches!(
            verify_password("pw2", &hash),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn corrupt_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("pw1", "not-a-phc-string"),
            Err(AppError::PasswordHash(_))
        ));
    }

    #[test]
    fn readers_cannot_become_admin_users() {
        assert!(matches!(
            AdminUser::try_from(reader()),
            Err(AppError::Unauthorized)
        ));

        let admin = CurrentUser {
            role: Role::Admin,
            ..reader()
        };
        assert_eq!(AdminUser::try_from(admin).unwrap().id(), 2);
    }
}
