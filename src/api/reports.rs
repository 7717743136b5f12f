//! Report taxonomy and nursing-report handlers.

use std::collections::HashSet;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::auth::AuthedUser;
use crate::core::report::compose_report;
use crate::error::ApiError;
use crate::models::report::{ChecklistItem, NursingReport, ReportCategory};

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub parent_id: Option<String>,
    pub position: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ItemRequest {
    #[validate(length(min = 1, max = 256))]
    pub phrase: String,
    pub position: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub checked_item_ids: Vec<String>,
    pub note: Option<String>,
}

pub async fn create_category(
    state: web::Data<AppState>,
    _user: AuthedUser,
    body: web::Json<CategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    if let Some(parent_id) = &body.parent_id {
        let categories = state.db.list_report_categories().await?;
        if !categories.iter().any(|c| &c.id == parent_id) {
            return Err(ApiError::NotFound("parent category"));
        }
    }

    let category = ReportCategory {
        id: Uuid::new_v4().to_string(),
        parent_id: body.parent_id.clone(),
        name: body.name.clone(),
        position: body.position,
    };
    state.db.create_report_category(&category).await?;

    Ok(HttpResponse::Created().json(category))
}

pub async fn list_categories(
    state: web::Data<AppState>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let categories = state.db.list_report_categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn create_item(
    state: web::Data<AppState>,
    path: web::Path<String>,
    _user: AuthedUser,
    body: web::Json<ItemRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let category_id = path.into_inner();
    let categories = state.db.list_report_categories().await?;
    if !categories.iter().any(|c| c.id == category_id) {
        return Err(ApiError::NotFound("category"));
    }

    let item = ChecklistItem {
        id: Uuid::new_v4().to_string(),
        category_id,
        phrase: body.phrase.clone(),
        position: body.position,
    };
    state.db.create_checklist_item(&item).await?;

    Ok(HttpResponse::Created().json(item))
}

pub async fn taxonomy(
    state: web::Data<AppState>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let tree = state.db.get_report_taxonomy().await?;
    Ok(HttpResponse::Ok().json(tree))
}

/// Composes and stores a report from the checked items plus an optional
/// free-text note.
pub async fn create_report(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: AuthedUser,
    body: web::Json<ReportRequest>,
) -> Result<HttpResponse, ApiError> {
    let patient_id = path.into_inner();
    state
        .db
        .get_patient(&patient_id)
        .await?
        .ok_or(ApiError::NotFound("patient"))?;

    let note = body.note.clone().filter(|n| !n.trim().is_empty());
    if body.checked_item_ids.is_empty() && note.is_none() {
        return Err(ApiError::BadRequest(
            "a report needs at least one checked item or a note".into(),
        ));
    }

    let items = state.db.list_checklist_items().await?;
    let known: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
    for item_id in &body.checked_item_ids {
        if !known.contains(item_id.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "unknown checklist item: {}",
                item_id
            )));
        }
    }

    let categories = state.db.list_report_categories().await?;
    let checked: HashSet<String> = body.checked_item_ids.iter().cloned().collect();
    let content = compose_report(&categories, &items, &checked, note.as_deref());

    let report = NursingReport {
        id: Uuid::new_v4().to_string(),
        patient_id,
        content,
        note,
        written_by: user.name.clone(),
        created_at: Utc::now(),
    };
    state
        .db
        .create_nursing_report(&report, &body.checked_item_ids)
        .await?;

    Ok(HttpResponse::Created().json(report))
}

pub async fn list_reports(
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

    let reports = state.db.list_nursing_reports(&patient_id).await?;
    Ok(HttpResponse::Ok().json(reports))
}
