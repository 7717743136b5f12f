//! Vital-sign handlers, including the schedule/compliance view.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::auth::AuthedUser;
use crate::core::schedule::schedule_status;
use crate::error::ApiError;
use crate::models::vitals::VitalSign;

#[derive(Debug, Deserialize, Validate)]
pub struct RecordVitalsRequest {
    pub measured_at: DateTime<Utc>,
    #[validate(range(min = 40.0, max = 300.0))]
    pub systolic: f32,
    #[validate(range(min = 20.0, max = 200.0))]
    pub diastolic: f32,
    pub mean_arterial_pressure: Option<f32>,
    #[validate(range(min = 10.0, max = 250.0))]
    pub pulse: f32,
    #[validate(range(min = 2.0, max = 60.0))]
    pub respiratory_rate: f32,
    #[validate(range(min = 30.0, max = 43.0))]
    pub temperature_celsius: f32,
    #[validate(range(min = 40.0, max = 100.0))]
    pub oxygen_saturation: f32,
    #[validate(range(min = 3, max = 15))]
    pub glasgow_coma_scale: Option<i32>,
    pub delay_reason: Option<String>,
}

pub async fn record(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: AuthedUser,
    body: web::Json<RecordVitalsRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let patient_id = path.into_inner();
    state
        .db
        .get_patient(&patient_id)
        .await?
        .ok_or(ApiError::NotFound("patient"))?;

    let recorded_at = Utc::now();
    if body.measured_at > recorded_at {
        return Err(ApiError::BadRequest(
            "measurement time cannot be in the future".into(),
        ));
    }

    let is_late_entry = VitalSign::is_late(body.measured_at, recorded_at);
    let delay_reason = body.delay_reason.clone().filter(|r| !r.trim().is_empty());
    if is_late_entry && delay_reason.is_none() {
        return Err(ApiError::BadRequest(
            "entries recorded more than an hour after measurement require a delay reason".into(),
        ));
    }

    let vitals = VitalSign {
        id: Uuid::new_v4().to_string(),
        patient_id,
        recorded_by: user.name.clone(),
        measured_at: body.measured_at,
        recorded_at,
        systolic: body.systolic,
        diastolic: body.diastolic,
        mean_arterial_pressure: body
            .mean_arterial_pressure
            .unwrap_or_else(|| VitalSign::derived_map(body.systolic, body.diastolic)),
        pulse: body.pulse,
        respiratory_rate: body.respiratory_rate,
        temperature_celsius: body.temperature_celsius,
        oxygen_saturation: body.oxygen_saturation,
        glasgow_coma_scale: body.glasgow_coma_scale,
        is_late_entry,
        delay_reason,
    };
    state.db.record_vital_signs(&vitals).await?;

    Ok(HttpResponse::Created().json(vitals))
}

pub async fn history(
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

    let vitals = state.db.get_vital_signs(&patient_id).await?;
    Ok(HttpResponse::Ok().json(vitals))
}

pub async fn latest(
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

    let vitals = state.db.get_latest_vital_signs(&patient_id).await?;
    Ok(HttpResponse::Ok().json(vitals))
}

/// Next required measurement time and the compliance label of every
/// entry, derived on demand from the stored history.
pub async fn schedule(
    state: web::Data<AppState>,
    path: web::Path<String>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let patient_id = path.into_inner();
    let patient = state
        .db
        .get_patient(&patient_id)
        .await?
        .ok_or(ApiError::NotFound("patient"))?;

    let vitals = state.db.get_vital_signs(&patient_id).await?;
    let status = schedule_status(
        patient.care_level,
        &vitals,
        patient.care_level_changed_at,
        Utc::now(),
    );
    Ok(HttpResponse::Ok().json(status))
}
