//! Assessment-form handlers.

use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::auth::AuthedUser;
use crate::core::scoring::score_submission;
use crate::error::ApiError;
use crate::models::assessment::{
    AssessmentForm, AssessmentSubmission, Question, QuestionOption, SubmissionAnswer,
};

#[derive(Debug, Deserialize, Validate)]
pub struct FormRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub questions: Vec<QuestionRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QuestionRequest {
    pub text: String,
    pub options: Vec<OptionRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OptionRequest {
    pub text: String,
    pub points: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub subject: String,
    pub answers: Vec<AnswerRequest>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: String,
    pub option_id: String,
}

pub async fn create_form(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<FormRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    for question in &body.questions {
        if question.text.trim().is_empty() {
            return Err(ApiError::BadRequest("question text cannot be empty".into()));
        }
        if question.options.len() < 2 {
            return Err(ApiError::BadRequest(format!(
                "question '{}' needs at least two options",
                question.text
            )));
        }
        if question.options.iter().any(|o| o.points < 0) {
            return Err(ApiError::BadRequest("option points cannot be negative".into()));
        }
    }

    let form = AssessmentForm {
        id: Uuid::new_v4().to_string(),
        title: body.title.clone(),
        description: body.description.clone(),
        created_by: user.name.clone(),
        created_at: Utc::now(),
    };

    let mut questions = Vec::new();
    let mut options = Vec::new();
    for (qi, question) in body.questions.iter().enumerate() {
        let question_id = Uuid::new_v4().to_string();
        questions.push(Question {
            id: question_id.clone(),
            form_id: form.id.clone(),
            text: question.text.clone(),
            position: qi as i64,
        });
        for (oi, option) in question.options.iter().enumerate() {
            options.push(QuestionOption {
                id: Uuid::new_v4().to_string(),
                question_id: question_id.clone(),
                text: option.text.clone(),
                points: option.points,
                position: oi as i64,
            });
        }
    }

    state
        .db
        .create_assessment_form(&form, &questions, &options)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "form": form,
        "questions": questions,
        "options": options,
    })))
}

pub async fn list_forms(
    state: web::Data<AppState>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let forms = state.db.list_assessment_forms().await?;
    Ok(HttpResponse::Ok().json(forms))
}

pub async fn get_form(
    state: web::Data<AppState>,
    path: web::Path<String>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (form, questions, options) = state
        .db
        .get_assessment_form(&path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("assessment form"))?;

    Ok(HttpResponse::Ok().json(json!({
        "form": form,
        "questions": questions,
        "options": options,
    })))
}

/// Grades and stores one submission.
pub async fn submit(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: AuthedUser,
    body: web::Json<SubmissionRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.subject.trim().is_empty() {
        return Err(ApiError::BadRequest("subject cannot be empty".into()));
    }

    let form_id = path.into_inner();
    let (form, questions, options) = state
        .db
        .get_assessment_form(&form_id)
        .await?
        .ok_or(ApiError::NotFound("assessment form"))?;

    let answer_map: HashMap<String, String> = body
        .answers
        .iter()
        .map(|a| (a.question_id.clone(), a.option_id.clone()))
        .collect();
    let outcome = score_submission(&questions, &options, &answer_map)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let submission = AssessmentSubmission {
        id: Uuid::new_v4().to_string(),
        form_id: form.id.clone(),
        subject: body.subject.clone(),
        submitted_by: user.name.clone(),
        score: outcome.score,
        max_score: outcome.max_score,
        percent: outcome.percent,
        submitted_at: Utc::now(),
    };
    let answers: Vec<SubmissionAnswer> = body
        .answers
        .iter()
        .map(|a| SubmissionAnswer {
            submission_id: submission.id.clone(),
            question_id: a.question_id.clone(),
            option_id: a.option_id.clone(),
        })
        .collect();

    state.db.create_submission(&submission, &answers).await?;

    Ok(HttpResponse::Created().json(submission))
}

pub async fn submissions(
    state: web::Data<AppState>,
    path: web::Path<String>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let form_id = path.into_inner();
    state
        .db
        .get_assessment_form(&form_id)
        .await?
        .ok_or(ApiError::NotFound("assessment form"))?;

    let submissions = state.db.list_submissions(&form_id).await?;
    Ok(HttpResponse::Ok().json(submissions))
}
