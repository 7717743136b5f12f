//! Medication handlers.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::models::medication::{Medication, MedicationAdministration, MedicationStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct MedicationRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub dose: String,
    #[validate(length(min = 1, max = 64))]
    pub route: String,
    #[validate(length(min = 1, max = 16))]
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdministrationRequest {
    pub administered_at: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 64))]
    pub dose_given: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: MedicationStatus,
}

pub async fn create(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: AuthedUser,
    body: web::Json<MedicationRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let patient_id = path.into_inner();
    state
        .db
        .get_patient(&patient_id)
        .await?
        .ok_or(ApiError::NotFound("patient"))?;

    if body.end_date.is_some_and(|end| end <= body.start_date) {
        return Err(ApiError::BadRequest("end date must be after start date".into()));
    }

    let medication = Medication {
        id: Uuid::new_v4().to_string(),
        patient_id,
        name: body.name.clone(),
        dose: body.dose.clone(),
        route: body.route.clone(),
        frequency: body.frequency.clone(),
        start_date: body.start_date,
        end_date: body.end_date,
        prescribed_by: user.name.clone(),
        status: MedicationStatus::Active,
        instructions: body.instructions.clone(),
        created_at: Utc::now(),
    };
    state.db.add_medication(&medication).await?;

    Ok(HttpResponse::Created().json(medication))
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

    let medications = state.db.get_medications(&patient_id).await?;
    Ok(HttpResponse::Ok().json(medications))
}

/// Doses that have come due for this patient's active orders.
pub async fn due(
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

    let due = state.db.get_due_medications(&patient_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(due))
}

pub async fn administer(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    user: AuthedUser,
    body: web::Json<AdministrationRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let (patient_id, medication_id) = path.into_inner();
    let medication = state
        .db
        .get_medication(&patient_id, &medication_id)
        .await?
        .ok_or(ApiError::NotFound("medication"))?;

    if medication.status != MedicationStatus::Active {
        return Err(ApiError::Conflict(format!(
            "medication {} is not active",
            medication.name
        )));
    }

    let admin = MedicationAdministration {
        id: Uuid::new_v4().to_string(),
        medication_id: medication.id.clone(),
        patient_id,
        administered_at: body.administered_at.unwrap_or_else(Utc::now),
        administered_by: user.name.clone(),
        dose_given: body.dose_given.clone(),
        notes: body.notes.clone(),
    };
    state.db.record_administration(&admin).await?;

    Ok(HttpResponse::Created().json(admin))
}

pub async fn administrations(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (patient_id, medication_id) = path.into_inner();
    state
        .db
        .get_medication(&patient_id, &medication_id)
        .await?
        .ok_or(ApiError::NotFound("medication"))?;

    let history = state.db.get_administrations(&medication_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

pub async fn set_status(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    _user: AuthedUser,
    body: web::Json<StatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let (patient_id, medication_id) = path.into_inner();
    let medication = state
        .db
        .get_medication(&patient_id, &medication_id)
        .await?
        .ok_or(ApiError::NotFound("medication"))?;

    state.db.set_medication_status(&medication.id, body.status).await?;
    let updated = state
        .db
        .get_medication(&patient_id, &medication.id)
        .await?
        .ok_or(ApiError::NotFound("medication"))?;
    Ok(HttpResponse::Ok().json(updated))
}
