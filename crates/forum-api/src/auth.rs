use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;

use forum_db::is_unique_violation;
use forum_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use forum_types::models::Role;

use crate::error::{ApiError, Result};
use crate::state::{AppState, blocking};

const TOKEN_TTL_DAYS: i64 = 30;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    // Validate input
    let username = req.username.trim().to_string();
    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::BadRequest(
            "Username must be between 3 and 32 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::BadRequest(
            "Username may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let role = if state.settings.is_admin_username(&username) {
        Role::Admin
    } else {
        Role::User
    };

    let password = req.password;
    let name = username.clone();
    let user_id = blocking(&state, move |s| {
        // Check if username is taken
        if s.db.get_user_by_username(&name)?.is_some() {
            return Err(ApiError::Conflict("Username is already taken".to_string()));
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        // The check above can race another registration of the same name.
        s.db.create_user(&name, &password_hash, role.as_str())
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Conflict("Username is already taken".to_string())
                } else {
                    ApiError::Internal(e)
                }
            })
    })
    .await?;

    let token = create_token(&state.jwt_secret, user_id, &username, role)?;
    info!("Registered user {} ({}) as {}", username, user_id, role.as_str());

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            role,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = blocking(&state, move |s| {
        let user = s
            .db
            .get_user_by_username(req.username.trim())?
            .ok_or(ApiError::Unauthorized)?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored password hash is invalid: {}", e))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(user)
    })
    .await?;

    let role: Role = user.role.parse()?;
    let token = create_token(&state.jwt_secret, user.id, &user.username, role)?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        role,
        token,
    }))
}

pub fn create_token(
    secret: &str,
    user_id: i64,
    username: &str,
    role: Role,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
