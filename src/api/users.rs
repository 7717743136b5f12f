//! User administration. Admin only.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::models::user::Role;

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

pub async fn list(state: web::Data<AppState>, user: AuthedUser) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let users = state.db.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn set_role(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: AuthedUser,
    body: web::Json<SetRoleRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let id = path.into_inner();
    let target = state.db.get_user(&id).await?.ok_or(ApiError::NotFound("user"))?;

    state.db.set_user_role(&target.id, body.role).await?;
    let updated = state.db.get_user(&target.id).await?.ok_or(ApiError::NotFound("user"))?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn set_active(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: AuthedUser,
    body: web::Json<SetActiveRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let id = path.into_inner();
    if id == user.id && !body.active {
        return Err(ApiError::BadRequest("cannot deactivate yourself".into()));
    }
    let target = state.db.get_user(&id).await?.ok_or(ApiError::NotFound("user"))?;

    state.db.set_user_active(&target.id, body.active).await?;
    let updated = state.db.get_user(&target.id).await?.ok_or(ApiError::NotFound("user"))?;
    Ok(HttpResponse::Ok().json(updated))
}
