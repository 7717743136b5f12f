//! Care-service handlers.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::live::Publish;
use crate::models::service::{CareService, ServiceStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct ServiceRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    pub details: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 0, max = 1440))]
    pub remind_minutes_before: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ServiceStatus,
}

fn service_event(kind: &str, service: &CareService, by: &str) -> Publish {
    Publish {
        patient_id: service.patient_id.clone(),
        payload: json!({
            "event": kind,
            "service_id": service.id,
            "patient_id": service.patient_id,
            "title": service.title,
            "scheduled_at": service.scheduled_at,
            "status": service.status,
            "by": by,
        }),
    }
}

pub async fn create(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: AuthedUser,
    body: web::Json<ServiceRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let patient_id = path.into_inner();
    state
        .db
        .get_patient(&patient_id)
        .await?
        .ok_or(ApiError::NotFound("patient"))?;

    let now = Utc::now();
    let service = CareService {
        id: Uuid::new_v4().to_string(),
        patient_id,
        title: body.title.clone(),
        details: body.details.clone(),
        scheduled_at: body.scheduled_at,
        remind_minutes_before: body.remind_minutes_before,
        status: ServiceStatus::Scheduled,
        created_by: user.name.clone(),
        created_at: now,
        updated_at: now,
    };
    state.db.create_service(&service).await?;

    state.live.do_send(service_event("service_updated", &service, &user.name));
    Ok(HttpResponse::Created().json(service))
}

pub async fn list(
    state: web::Data<AppState>,
    path: web::Path<String>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let patient_id = path.into_inner();
    state
        .db
        .get_patient(&patient_id)
        .await?
        .ok_or(ApiError::NotFound("patient"))?;

    let services = state.db.list_services(&patient_id).await?;
    Ok(HttpResponse::Ok().json(services))
}

/// Services whose reminder window has opened, across all patients.
pub async fn due(state: web::Data<AppState>, _user: AuthedUser) -> Result<HttpResponse, ApiError> {
    let due = state.db.due_services(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(due))
}

pub async fn set_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: AuthedUser,
    body: web::Json<StatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let service = state
        .db
        .get_service(&id)
        .await?
        .ok_or(ApiError::NotFound("service"))?;

    if service.status != ServiceStatus::Scheduled && body.status != service.status {
        return Err(ApiError::Conflict(format!(
            "service is already {}",
            service.status.as_str()
        )));
    }

    state
        .db
        .set_service_status(&service.id, body.status, Utc::now())
        .await?;
    let updated = state
        .db
        .get_service(&service.id)
        .await?
        .ok_or(ApiError::NotFound("service"))?;

    state.live.do_send(service_event("service_updated", &updated, &user.name));
    Ok(HttpResponse::Ok().json(updated))
}
