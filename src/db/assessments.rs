//! Assessment form and submission queries.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, instrument};

use super::{from_millis, to_millis, Database};
use crate::models::assessment::{
    AssessmentForm, AssessmentSubmission, Question, QuestionOption, SubmissionAnswer,
};

fn form_from_row(row: &SqliteRow) -> Result<AssessmentForm> {
    Ok(AssessmentForm {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_by: row.try_get("created_by")?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}

fn question_from_row(row: &SqliteRow) -> Result<Question> {
    Ok(Question {
        id: row.try_get("id")?,
        form_id: row.try_get("form_id")?,
        text: row.try_get("text")?,
        position: row.try_get("position")?,
    })
}

fn option_from_row(row: &SqliteRow) -> Result<QuestionOption> {
    Ok(QuestionOption {
        id: row.try_get("id")?,
        question_id: row.try_get("question_id")?,
        text: row.try_get("text")?,
        points: row.try_get("points")?,
        position: row.try_get("position")?,
    })
}

fn submission_from_row(row: &SqliteRow) -> Result<AssessmentSubmission> {
    Ok(AssessmentSubmission {
        id: row.try_get("id")?,
        form_id: row.try_get("form_id")?,
        subject: row.try_get("subject")?,
        submitted_by: row.try_get("submitted_by")?,
        score: row.try_get("score")?,
        max_score: row.try_get("max_score")?,
        percent: row.try_get("percent")?,
        submitted_at: from_millis(row.try_get("submitted_at")?)?,
    })
}

impl Database {
    #[instrument(skip_all, fields(form_id = %form.id))]
    pub async fn create_assessment_form(
        &self,
        form: &AssessmentForm,
        questions: &[Question],
        options: &[QuestionOption],
    ) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "INSERT INTO assessment_forms (id, title, description, created_by, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&form.id)
        .bind(&form.title)
        .bind(&form.description)
        .bind(&form.created_by)
        .bind(to_millis(form.created_at))
        .execute(&mut *tx)
        .await?;

        for question in questions {
            sqlx::query(
                "INSERT INTO questions (id, form_id, text, position) VALUES (?, ?, ?, ?)",
            )
            .bind(&question.id)
            .bind(&question.form_id)
            .bind(&question.text)
            .bind(question.position)
            .execute(&mut *tx)
            .await?;
        }

        for option in options {
            sqlx::query(
                "INSERT INTO question_options (id, question_id, text, points, position)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&option.id)
            .bind(&option.question_id)
            .bind(&option.text)
            .bind(option.points)
            .bind(option.position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!("Assessment form created: {}", form.title);
        Ok(())
    }

    pub async fn list_assessment_forms(&self) -> Result<Vec<AssessmentForm>> {
        let rows = sqlx::query("SELECT * FROM assessment_forms ORDER BY created_at DESC")
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(form_from_row).collect()
    }

    /// The form with its questions and options, or `None` if it does
    /// not exist.
    pub async fn get_assessment_form(
        &self,
        form_id: &str,
    ) -> Result<Option<(AssessmentForm, Vec<Question>, Vec<QuestionOption>)>> {
        let row = sqlx::query("SELECT * FROM assessment_forms WHERE id = ?")
            .bind(form_id)
            .fetch_optional(self.pool())
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let form = form_from_row(&row)?;

        let questions: Vec<Question> =
            sqlx::query("SELECT * FROM questions WHERE form_id = ? ORDER BY position")
                .bind(form_id)
                .fetch_all(self.pool())
                .await?
                .iter()
                .map(question_from_row)
                .collect::<Result<_>>()?;

        let options: Vec<QuestionOption> = sqlx::query(
            "SELECT question_options.* FROM question_options
             JOIN questions ON questions.id = question_options.question_id
             WHERE questions.form_id = ?
             ORDER BY question_options.position",
        )
        .bind(form_id)
        .fetch_all(self.pool())
        .await?
        .iter()
        .map(option_from_row)
        .collect::<Result<_>>()?;

        Ok(Some((form, questions, options)))
    }

    #[instrument(skip_all, fields(form_id = %submission.form_id))]
    pub async fn create_submission(
        &self,
        submission: &AssessmentSubmission,
        answers: &[SubmissionAnswer],
    ) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "INSERT INTO assessment_submissions (
                id, form_id, subject, submitted_by, score, max_score, percent, submitted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&submission.id)
        .bind(&submission.form_id)
        .bind(&submission.subject)
        .bind(&submission.submitted_by)
        .bind(submission.score)
        .bind(submission.max_score)
        .bind(submission.percent)
        .bind(to_millis(submission.submitted_at))
        .execute(&mut *tx)
        .await?;

        for answer in answers {
            sqlx::query(
                "INSERT INTO submission_answers (submission_id, question_id, option_id)
                 VALUES (?, ?, ?)",
            )
            .bind(&answer.submission_id)
            .bind(&answer.question_id)
            .bind(&answer.option_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "Submission stored for form {}: {}/{}",
            submission.form_id, submission.score, submission.max_score
        );
        Ok(())
    }

    pub async fn list_submissions(&self, form_id: &str) -> Result<Vec<AssessmentSubmission>> {
        let rows = sqlx::query(
            "SELECT * FROM assessment_submissions WHERE form_id = ? ORDER BY submitted_at DESC",
        )
        .bind(form_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(submission_from_row).collect()
    }
}
