use chrono::Utc;
use dashmap::mapref::entry::Entry;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::models::user::{Role, User};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

pub async fn register(state: &AppState, input: Registration) -> Result<User, AppError> {
    let result = create_user(state, input).await;
    let outcome = if result.is_ok() { "register_ok" } else { "register_rejected" };
    state
        .metrics
        .auth_attempts_total
        .with_label_values(&[outcome])
        .inc();
    result
}

async fn create_user(state: &AppState, input: Registration) -> Result<User, AppError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let email = normalize_email(&input.email);
    validate_email(&email)?;

    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let role = match input.role.as_deref().map(str::trim) {
        None | Some("") => Role::default(),
        Some(raw) => raw.parse::<Role>().map_err(AppError::BadRequest)?,
    };

    if role == Role::Admin && !state.allow_admin_registration {
        return Err(AppError::Forbidden(
            "admin registration is disabled".to_string(),
        ));
    }

    let password_hash = hash_password(input.password, state.bcrypt_cost).await?;

    let user = User {
        id: Uuid::new_v4(),
        name,
        email: email.clone(),
        password_hash,
        role,
        created_at: Utc::now(),
    };

    match state.user_emails.entry(email) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        Entry::Vacant(slot) => {
            slot.insert(user.id);
        }
    }
    state.users.insert(user.id, user.clone());

    info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(user)
}

/// Returns a signed token and the matching user.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(String, User), AppError> {
    let email = normalize_email(email);

    let user = state
        .user_emails
        .get(&email)
        .map(|entry| *entry.value())
        .and_then(|id| state.users.get(&id).map(|entry| entry.value().clone()));

    let verified = match &user {
        Some(user) => verify_password(password.to_string(), user.password_hash.clone()).await?,
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            warn!(email = %email, "login rejected");
            state
                .metrics
                .auth_attempts_total
                .with_label_values(&["login_failed"])
                .inc();
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    let token = state.tokens.issue(&user)?;
    state
        .metrics
        .auth_attempts_total
        .with_label_values(&["login_ok"])
        .inc();

    info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok((token, user))
}

pub fn list_agents(state: &AppState) -> Vec<User> {
    let mut agents: Vec<User> = state
        .users
        .iter()
        .filter(|entry| entry.value().role == Role::Agent)
        .map(|entry| entry.value().clone())
        .collect();

    agents.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
    agents
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::BadRequest(format!("invalid email: {email}"));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}
