//! Registration and login.

use crate::{
    auth::{hash_password, verify_password},
    error::{AppError, Result},
    models::{LoginForm, NewUser, RegisterForm, User},
    repository::{Repository, RepositoryError},
};

use super::required;

/// Emails are compared and stored trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation("Please enter a valid email address.".to_string()))
    }
}

/// register
///
/// Creates a new account. The first account ever created is the administrator.
/// The caller is responsible for logging the returned user in.
pub async fn register(repo: &dyn Repository, form: RegisterForm) -> Result<User> {
    let email = normalize_email(&required(&form.email, "Email")?);
    validate_email(&email)?;
    let name = required(&form.name, "Name")?;
    if form.password.trim().is_empty() {
        return Err(AppError::Validation("Password is required.".to_string()));
    }

    if repo.find_user_by_email(&email).await?.is_some() {
        tracing::info!(email = %email, "registration rejected: duplicate email");
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password(&form.password)?;

    let user = repo
        .create_user(NewUser {
            email,
            password_hash,
            name,
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration of the same email.
            RepositoryError::Conflict(_) => AppError::DuplicateEmail,
            other => AppError::Repository(other),
        })?;

    tracing::info!(user_id = user.id, role = user.role.as_str(), "registered new user");
    Ok(user)
}

/// login
///
/// Checks credentials and returns the matching user.
pub async fn login(repo: &dyn Repository, form: LoginForm) -> Result<User> {
    let email = normalize_email(&form.email);

    let Some(user) = repo.find_user_by_email(&email).await? else {
        tracing::warn!(email = %email, "login failed: unknown user");
        return Err(AppError::UnknownUser);
    };

    if let Err(err) = verify_password(&form.password, &user.password_hash) {
        tracing::warn!(user_id = user.id, "login failed: {err}");
        return Err(err);
    }

    tracing::info!(user_id = user.id, "user logged in");
    Ok(user)
}
