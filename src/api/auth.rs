//! Registration and login.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::auth::{hash_password, issue_token, verify_password};
use crate::error::ApiError;
use crate::models::user::{Role, User};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub display_name: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    if state.db.get_user_by_username(&body.username).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "username {} is taken",
            body.username
        )));
    }

    // The first account bootstraps the installation as admin.
    let role = if state.db.count_users().await? == 0 {
        Role::Admin
    } else {
        Role::Caregiver
    };

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: body.username.clone(),
        display_name: body.display_name.clone(),
        password_hash: hash_password(&body.password)?,
        role,
        active: true,
        created_at: Utc::now(),
    };
    state.db.create_user(&user).await?;

    Ok(HttpResponse::Created().json(user))
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .db
        .get_user_by_username(&body.username)
        .await?
        .filter(|u| u.active)
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = issue_token(
        &user,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
        Utc::now(),
    )?;

    Ok(HttpResponse::Ok().json(json!({ "token": token, "user": user })))
}
