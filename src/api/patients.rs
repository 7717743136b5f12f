//! Patient handlers.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::auth::AuthedUser;
use crate::core::schedule::CareLevel;
use crate::error::ApiError;
use crate::live::Publish;
use crate::models::patient::Patient;

#[derive(Debug, Deserialize, Validate)]
pub struct PatientRequest {
    #[validate(length(min = 1, max = 128))]
    pub first_name: String,
    #[validate(length(min = 1, max = 128))]
    pub last_name: String,
    pub national_id: Option<String>,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, max = 32))]
    pub sex: String,
    pub room: Option<String>,
    pub admission_date: DateTime<Utc>,
    pub primary_diagnosis: Option<String>,
    pub notes: Option<String>,
    pub care_level: u8,
}

#[derive(Debug, Deserialize)]
pub struct CareLevelRequest {
    pub care_level: u8,
}

fn parse_care_level(raw: u8) -> Result<CareLevel, ApiError> {
    CareLevel::try_from(raw).map_err(ApiError::BadRequest)
}

pub async fn create(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<PatientRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let care_level = parse_care_level(body.care_level)?;

    let now = Utc::now();
    let patient = Patient {
        id: Uuid::new_v4().to_string(),
        first_name: body.first_name.clone(),
        last_name: body.last_name.clone(),
        national_id: body.national_id.clone(),
        date_of_birth: body.date_of_birth,
        sex: body.sex.clone(),
        room: body.room.clone(),
        admission_date: body.admission_date,
        primary_diagnosis: body.primary_diagnosis.clone(),
        notes: body.notes.clone(),
        care_level,
        care_level_changed_at: None,
        created_at: now,
        updated_at: now,
    };
    state.db.create_patient(&patient).await?;

    tracing::info!(patient_id = %patient.id, by = %user.name, "patient admitted");
    Ok(HttpResponse::Created().json(patient))
}

pub async fn list(state: web::Data<AppState>, _user: AuthedUser) -> Result<HttpResponse, ApiError> {
    let patients = state.db.list_patients().await?;
    Ok(HttpResponse::Ok().json(patients))
}

pub async fn get(
    state: web::Data<AppState>,
    path: web::Path<String>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let patient = state
        .db
        .get_patient(&path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("patient"))?;
    Ok(HttpResponse::Ok().json(patient))
}

pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<String>,
    _user: AuthedUser,
    body: web::Json<PatientRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let id = path.into_inner();
    let existing = state
        .db
        .get_patient(&id)
        .await?
        .ok_or(ApiError::NotFound("patient"))?;

    // Care level has its own endpoint; this one leaves it untouched.
    let patient = Patient {
        first_name: body.first_name.clone(),
        last_name: body.last_name.clone(),
        national_id: body.national_id.clone(),
        date_of_birth: body.date_of_birth,
        sex: body.sex.clone(),
        room: body.room.clone(),
        admission_date: body.admission_date,
        primary_diagnosis: body.primary_diagnosis.clone(),
        notes: body.notes.clone(),
        updated_at: Utc::now(),
        ..existing
    };
    state.db.update_patient(&patient).await?;

    Ok(HttpResponse::Ok().json(patient))
}

/// Changes the care level. The change timestamp becomes the new manual
/// anchor for the measurement grid, discarding the old one.
pub async fn set_care_level(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: AuthedUser,
    body: web::Json<CareLevelRequest>,
) -> Result<HttpResponse, ApiError> {
    let care_level = parse_care_level(body.care_level)?;
    let id = path.into_inner();
    state
        .db
        .get_patient(&id)
        .await?
        .ok_or(ApiError::NotFound("patient"))?;

    let changed_at = Utc::now();
    state.db.set_care_level(&id, care_level, changed_at).await?;

    state.live.do_send(Publish {
        patient_id: id.clone(),
        payload: json!({
            "event": "care_level_changed",
            "patient_id": id,
            "care_level": body.care_level,
            "changed_at": changed_at,
            "changed_by": user.name,
        }),
    });

    let patient = state
        .db
        .get_patient(&id)
        .await?
        .ok_or(ApiError::NotFound("patient"))?;
    Ok(HttpResponse::Ok().json(patient))
}
