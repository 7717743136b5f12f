//! Patient queries.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, instrument};

use super::{from_millis, to_millis, Database};
use crate::core::schedule::CareLevel;
use crate::models::patient::Patient;

fn patient_from_row(row: &SqliteRow) -> Result<Patient> {
    let care_level: i64 = row.try_get("care_level")?;
    let date_of_birth: String = row.try_get("date_of_birth")?;
    let care_level_changed_at: Option<i64> = row.try_get("care_level_changed_at")?;

    Ok(Patient {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        national_id: row.try_get("national_id")?,
        date_of_birth: NaiveDate::parse_from_str(&date_of_birth, "%Y-%m-%d")?,
        sex: row.try_get("sex")?,
        room: row.try_get("room")?,
        admission_date: from_millis(row.try_get("admission_date")?)?,
        primary_diagnosis: row.try_get("primary_diagnosis")?,
        notes: row.try_get("notes")?,
        care_level: CareLevel::try_from(care_level).map_err(anyhow::Error::msg)?,
        care_level_changed_at: care_level_changed_at.map(from_millis).transpose()?,
        created_at: from_millis(row.try_get("created_at")?)?,
        updated_at: from_millis(row.try_get("updated_at")?)?,
    })
}

impl Database {
    #[instrument(skip(self, patient), fields(patient_id = %patient.id))]
    pub async fn create_patient(&self, patient: &Patient) -> Result<()> {
        sqlx::query(
            "INSERT INTO patients (
                id, first_name, last_name, national_id, date_of_birth, sex,
                room, admission_date, primary_diagnosis, notes, care_level,
                care_level_changed_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&patient.id)
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(&patient.national_id)
        .bind(patient.date_of_birth.format("%Y-%m-%d").to_string())
        .bind(&patient.sex)
        .bind(&patient.room)
        .bind(to_millis(patient.admission_date))
        .bind(&patient.primary_diagnosis)
        .bind(&patient.notes)
        .bind(u8::from(patient.care_level) as i64)
        .bind(patient.care_level_changed_at.map(to_millis))
        .bind(to_millis(patient.created_at))
        .bind(to_millis(patient.updated_at))
        .execute(self.pool())
        .await?;

        info!("Patient created: {}", patient.id);
        self.cache().insert(patient.id.clone(), patient.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_patient(&self, id: &str) -> Result<Option<Patient>> {
        if let Some(cached) = self.cache().get(id) {
            return Ok(Some(cached.clone()));
        }

        let row = sqlx::query("SELECT * FROM patients WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => {
                let patient = patient_from_row(&row)?;
                self.cache().insert(patient.id.clone(), patient.clone());
                Ok(Some(patient))
            }
            None => Ok(None),
        }
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>> {
        let rows = sqlx::query("SELECT * FROM patients ORDER BY last_name, first_name")
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(patient_from_row).collect()
    }

    #[instrument(skip(self, patient), fields(patient_id = %patient.id))]
    pub async fn update_patient(&self, patient: &Patient) -> Result<()> {
        sqlx::query(
            "UPDATE patients SET
                first_name = ?, last_name = ?, national_id = ?, date_of_birth = ?,
                sex = ?, room = ?, admission_date = ?, primary_diagnosis = ?,
                notes = ?, updated_at = ?
            WHERE id = ?",
        )
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(&patient.national_id)
        .bind(patient.date_of_birth.format("%Y-%m-%d").to_string())
        .bind(&patient.sex)
        .bind(&patient.room)
        .bind(to_millis(patient.admission_date))
        .bind(&patient.primary_diagnosis)
        .bind(&patient.notes)
        .bind(to_millis(patient.updated_at))
        .bind(&patient.id)
        .execute(self.pool())
        .await?;

        self.cache().remove(&patient.id);
        Ok(())
    }

    /// Changes the care level and stamps the manual-reset anchor in one
    /// step, so future grid projections start from `changed_at`.
    #[instrument(skip(self))]
    pub async fn set_care_level(
        &self,
        id: &str,
        level: CareLevel,
        changed_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE patients SET care_level = ?, care_level_changed_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(u8::from(level) as i64)
        .bind(to_millis(changed_at))
        .bind(to_millis(changed_at))
        .bind(id)
        .execute(self.pool())
        .await?;

        info!("Care level for {} set to {}", id, u8::from(level));
        self.cache().remove(id);
        Ok(())
    }
}
