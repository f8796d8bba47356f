// ABOUTME: Account registration and login handlers
// ABOUTME: Registration enforces case-insensitive username uniqueness

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, Result};
use crate::password;
use crate::types::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SessionUserView, User,
    UserView,
};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        return Err(AppError::MissingFields("Username and password are required"));
    }

    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::UsernameTooShort);
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::PasswordTooShort);
    }

    // Hold the key's write lock across the uniqueness check and the insert,
    // otherwise two concurrent registrations can both pass the check.
    let _guard = state.users.write_lock(&username).lock_owned().await;

    if state.users.get(&username).await?.is_some() {
        return Err(AppError::UsernameTaken);
    }

    let user = User {
        id: Uuid::new_v4(),
        username: username.clone(),
        password_hash: password::hash_password(&password)?,
        created_at: Utc::now(),
        games: Vec::new(),
    };

    state.users.put(&username, &user).await?;

    tracing::info!(username = %user.username, "Registered new user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user: UserView {
                id: user.id,
                username: user.username,
            },
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        return Err(AppError::MissingFields("Username and password are required"));
    }

    // Unknown user and wrong password collapse into one error so responses
    // don't reveal which usernames exist.
    let user = state
        .users
        .get(&username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !password::verify_password(&password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    // The token is a bearer of nothing: it is handed to the client but never
    // stored, so no later request can be validated against it.
    let token = password::generate_token();

    tracing::info!(username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: SessionUserView {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
            total_games: user.games.len(),
        },
    }))
}
