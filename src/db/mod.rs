//! Storage layer for the care platform.
//!
//! One SQLite pool behind a `Database` handle; the schema is created at
//! startup and all timestamps are stored as integer Unix milliseconds.
//! Patient rows are cached in-process since every schedule computation
//! re-reads them.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::models::patient::Patient;

pub mod assessments;
pub mod medications;
pub mod patients;
pub mod reports;
pub mod services;
pub mod users;
pub mod vitals;

pub(crate) fn to_millis(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp out of range: {}", ms))
}

pub struct Database {
    pool: SqlitePool,
    patient_cache: DashMap<String, Patient>,
}

impl Database {
    pub async fn connect(url: &str) -> Result<Self> {
        // A shared in-memory database only exists on one connection.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Self::initialize_schema(&pool).await?;

        Ok(Self {
            pool,
            patient_cache: DashMap::new(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn cache(&self) -> &DashMap<String, Patient> {
        &self.patient_cache
    }

    async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
        // Users table
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                active BOOLEAN NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        // Patients table
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS patients (
                id TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                national_id TEXT,
                date_of_birth TEXT NOT NULL,
                sex TEXT NOT NULL,
                room TEXT,
                admission_date INTEGER NOT NULL,
                primary_diagnosis TEXT,
                notes TEXT,
                care_level INTEGER NOT NULL,
                care_level_changed_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        // Vital signs table
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS vital_signs (
                id TEXT PRIMARY KEY,
                patient_id TEXT NOT NULL,
                recorded_by TEXT NOT NULL,
                measured_at INTEGER NOT NULL,
                recorded_at INTEGER NOT NULL,
                systolic REAL NOT NULL,
                diastolic REAL NOT NULL,
                mean_arterial_pressure REAL NOT NULL,
                pulse REAL NOT NULL,
                respiratory_rate REAL NOT NULL,
                temperature_celsius REAL NOT NULL,
                oxygen_saturation REAL NOT NULL,
                glasgow_coma_scale INTEGER,
                is_late_entry BOOLEAN NOT NULL,
                delay_reason TEXT,
                FOREIGN KEY (patient_id) REFERENCES patients(id)
            )",
        )
        .execute(pool)
        .await?;

        // Medications table
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS medications (
                id TEXT PRIMARY KEY,
                patient_id TEXT NOT NULL,
                name TEXT NOT NULL,
                dose TEXT NOT NULL,
                route TEXT NOT NULL,
                frequency TEXT NOT NULL,
                start_date INTEGER NOT NULL,
                end_date INTEGER,
                prescribed_by TEXT NOT NULL,
                status TEXT NOT NULL,
                instructions TEXT,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (patient_id) REFERENCES patients(id)
            )",
        )
        .execute(pool)
        .await?;

        // Medication administrations table
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS medication_administrations (
                id TEXT PRIMARY KEY,
                medication_id TEXT NOT NULL,
                patient_id TEXT NOT NULL,
                administered_at INTEGER NOT NULL,
                administered_by TEXT NOT NULL,
                dose_given TEXT NOT NULL,
                notes TEXT,
                FOREIGN KEY (medication_id) REFERENCES medications(id)
            )",
        )
        .execute(pool)
        .await?;

        // Report category tree
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS report_categories (
                id TEXT PRIMARY KEY,
                parent_id TEXT,
                name TEXT NOT NULL,
                position INTEGER NOT NULL,
                FOREIGN KEY (parent_id) REFERENCES report_categories(id)
            )",
        )
        .execute(pool)
        .await?;

        // Checklist items
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS checklist_items (
                id TEXT PRIMARY KEY,
                category_id TEXT NOT NULL,
                phrase TEXT NOT NULL,
                position INTEGER NOT NULL,
                FOREIGN KEY (category_id) REFERENCES report_categories(id)
            )",
        )
        .execute(pool)
        .await?;

        // Nursing reports
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS nursing_reports (
                id TEXT PRIMARY KEY,
                patient_id TEXT NOT NULL,
                content TEXT NOT NULL,
                note TEXT,
                written_by TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (patient_id) REFERENCES patients(id)
            )",
        )
        .execute(pool)
        .await?;

        // Checked items per report
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS report_checked_items (
                report_id TEXT NOT NULL,
                item_id TEXT NOT NULL,
                FOREIGN KEY (report_id) REFERENCES nursing_reports(id),
                FOREIGN KEY (item_id) REFERENCES checklist_items(id)
            )",
        )
        .execute(pool)
        .await?;

        // Assessment forms
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS assessment_forms (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        // Questions
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS questions (
                id TEXT PRIMARY KEY,
                form_id TEXT NOT NULL,
                text TEXT NOT NULL,
                position INTEGER NOT NULL,
                FOREIGN KEY (form_id) REFERENCES assessment_forms(id)
            )",
        )
        .execute(pool)
        .await?;

        // Question options
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS question_options (
                id TEXT PRIMARY KEY,
                question_id TEXT NOT NULL,
                text TEXT NOT NULL,
                points INTEGER NOT NULL,
                position INTEGER NOT NULL,
                FOREIGN KEY (question_id) REFERENCES questions(id)
            )",
        )
        .execute(pool)
        .await?;

        // Assessment submissions
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS assessment_submissions (
                id TEXT PRIMARY KEY,
                form_id TEXT NOT NULL,
                subject TEXT NOT NULL,
                submitted_by TEXT NOT NULL,
                score INTEGER NOT NULL,
                max_score INTEGER NOT NULL,
                percent INTEGER NOT NULL,
                submitted_at INTEGER NOT NULL,
                FOREIGN KEY (form_id) REFERENCES assessment_forms(id)
            )",
        )
        .execute(pool)
        .await?;

        // Chosen options per submission
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS submission_answers (
                submission_id TEXT NOT NULL,
                question_id TEXT NOT NULL,
                option_id TEXT NOT NULL,
                FOREIGN KEY (submission_id) REFERENCES assessment_submissions(id)
            )",
        )
        .execute(pool)
        .await?;

        // Care services table
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS care_services (
                id TEXT PRIMARY KEY,
                patient_id TEXT NOT NULL,
                title TEXT NOT NULL,
                details TEXT,
                scheduled_at INTEGER NOT NULL,
                remind_minutes_before INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (patient_id) REFERENCES patients(id)
            )",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
