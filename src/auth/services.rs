use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::dto::SignUpRequest;
use crate::auth::password::{
    check_password_policy, hash_password, is_password_hash, verify_stored,
};
use crate::auth::repo_types::User;
use crate::error::{require, AppError};
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password.".into())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Register a new user. Email must be unused; password must satisfy the policy.
pub async fn sign_up(st: &AppState, req: SignUpRequest) -> Result<User, AppError> {
    require(&req.name, "name")?;
    require(&req.email, "email")?;
    require(&req.password, "password")?;

    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        return Err(AppError::validation("Invalid email."));
    }
    check_password_policy(&req.password)?;

    // Repeated under the collection lock by `insert`.
    if st.users.find_by_email(&req.email).await.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(duplicate_email());
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        email: req.email,
        password: hash_password(&req.password)?,
        security_question: non_empty(req.security_question),
        security_answer: non_empty(req.security_answer),
        created_at: st.clock.now(),
        last_login: None,
        updated_at: None,
    };

    if !st.users.insert(user.clone()).await? {
        warn!(email = %user.email, "email registered concurrently");
        return Err(duplicate_email());
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

fn duplicate_email() -> AppError {
    AppError::Conflict("User with that email already exists.".into())
}

/// Check credentials and stamp `lastLogin`.
pub async fn sign_in(st: &AppState, email: &str, password: &str) -> Result<User, AppError> {
    require(email, "email")?;
    require(password, "password")?;

    let Some(user) = st.users.find_by_email(email).await else {
        warn!(email, "sign-in unknown email");
        return Err(invalid_credentials());
    };

    if !verify_stored(password, &user.password)? {
        warn!(email, user_id = %user.id, "sign-in invalid password");
        return Err(invalid_credentials());
    }

    let upgraded = if is_password_hash(&user.password) {
        None
    } else {
        Some(hash_password(password)?)
    };

    let now = st.clock.now();
    let user = st
        .users
        .update_by_email(email, |u| {
            u.last_login = Some(now);
            if let Some(hash) = upgraded {
                info!(user_id = %u.id, "legacy password re-hashed");
                u.password = hash;
            }
        })
        .await?
        .ok_or_else(invalid_credentials)?;

    info!(user_id = %user.id, email = %user.email, "user signed in");
    Ok(user)
}

pub async fn update_security_question(
    st: &AppState,
    email: &str,
    question: &str,
    answer: &str,
) -> Result<User, AppError> {
    require(email, "email")?;
    require(question, "question")?;
    require(answer, "answer")?;

    let now = st.clock.now();
    let user = st
        .users
        .update_by_email(email, |u| {
            u.security_question = Some(question.to_string());
            u.security_answer = Some(answer.to_string());
            u.updated_at = Some(now);
        })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    info!(user_id = %user.id, "security question updated");
    Ok(user)
}

/// Case-insensitive comparison against the stored security answer.
pub async fn verify_security_answer(st: &AppState, email: &str, answer: &str) -> bool {
    let Some(user) = st.users.find_by_email(email).await else {
        return false;
    };
    match user.security_answer {
        Some(expected) => expected.to_lowercase() == answer.to_lowercase(),
        None => false,
    }
}
