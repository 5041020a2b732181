use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiJson;
use crate::api::middleware::{auth::AuthUser, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::services::registration::{self, RegisterRequest};

#[derive(Debug, Deserialize)]
struct RegisterBody {
    access_key: String,
    email: String,
    password: String,
    display_name: String,
    referral_code: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthData {
    user: User,
    token: String,
}

fn validate_register(body: &RegisterBody) -> Result<()> {
    if !body.email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if body.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if body.display_name.trim().is_empty() {
        return Err(AppError::Validation("Display name is required".to_string()));
    }
    Ok(())
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> Result<Json<ApiResponse<AuthData>>> {
    validate_register(&body)?;

    let result = registration::register(
        &state.pool,
        RegisterRequest {
            access_key: body.access_key,
            email: body.email,
            password: body.password,
            display_name: body.display_name,
            referral_code: body.referral_code,
        },
    )
    .await?;

    Ok(ok_with_message(
        "Registration successful",
        AuthData {
            user: result.user,
            token: result.api_token,
        },
    ))
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<ApiResponse<AuthData>>> {
    let result = registration::login(&state.pool, &body.email, &body.password).await?;

    Ok(ok_with_message(
        "Login successful",
        AuthData {
            user: result.user,
            token: result.api_token,
        },
    ))
}

async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<User>> {
    ok(user)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> RegisterBody {
        RegisterBody {
            access_key: "EH-AAAA-BBBB-CCCC-DDDD".to_string(),
            email: "user@example.com".to_string(),
            password: "long-enough".to_string(),
            display_name: "User".to_string(),
            referral_code: None,
        }
    }

    #[test]
    fn test_valid_body_passes() {
        assert!(validate_register(&body()).is_ok());
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut b = body();
        b.email = "nope".to_string();
        assert!(validate_register(&b).is_err());
    }

    #[test]
    fn test_short_password_rejected() {
        let mut b = body();
        b.password = "short".to_string();
        assert!(validate_register(&b).is_err());
    }

    #[test]
    fn test_blank_display_name_rejected() {
        let mut b = body();
        b.display_name = "   ".to_string();
        assert!(validate_register(&b).is_err());
    }
}
