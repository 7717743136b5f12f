//! Medication order and administration queries.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, instrument};

use super::{from_millis, to_millis, Database};
use crate::core::frequency::dose_interval;
use crate::models::medication::{
    DueMedication, Medication, MedicationAdministration, MedicationStatus,
};

fn medication_from_row(row: &SqliteRow) -> Result<Medication> {
    let status: String = row.try_get("status")?;
    let end_date: Option<i64> = row.try_get("end_date")?;

    Ok(Medication {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        name: row.try_get("name")?,
        dose: row.try_get("dose")?,
        route: row.try_get("route")?,
        frequency: row.try_get("frequency")?,
        start_date: from_millis(row.try_get("start_date")?)?,
        end_date: end_date.map(from_millis).transpose()?,
        prescribed_by: row.try_get("prescribed_by")?,
        status: MedicationStatus::parse(&status)?,
        instructions: row.try_get("instructions")?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}

fn administration_from_row(row: &SqliteRow) -> Result<MedicationAdministration> {
    Ok(MedicationAdministration {
        id: row.try_get("id")?,
        medication_id: row.try_get("medication_id")?,
        patient_id: row.try_get("patient_id")?,
        administered_at: from_millis(row.try_get("administered_at")?)?,
        administered_by: row.try_get("administered_by")?,
        dose_given: row.try_get("dose_given")?,
        notes: row.try_get("notes")?,
    })
}

impl Database {
    #[instrument(skip(self, medication), fields(patient_id = %medication.patient_id))]
    pub async fn add_medication(&self, medication: &Medication) -> Result<()> {
        sqlx::query(
            "INSERT INTO medications (
                id, patient_id, name, dose, route, frequency, start_date,
                end_date, prescribed_by, status, instructions, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&medication.id)
        .bind(&medication.patient_id)
        .bind(&medication.name)
        .bind(&medication.dose)
        .bind(&medication.route)
        .bind(&medication.frequency)
        .bind(to_millis(medication.start_date))
        .bind(medication.end_date.map(to_millis))
        .bind(&medication.prescribed_by)
        .bind(medication.status.as_str())
        .bind(&medication.instructions)
        .bind(to_millis(medication.created_at))
        .execute(self.pool())
        .await?;

        info!("Medication {} added for patient {}", medication.name, medication.patient_id);
        Ok(())
    }

    pub async fn get_medications(&self, patient_id: &str) -> Result<Vec<Medication>> {
        let rows = sqlx::query(
            "SELECT * FROM medications WHERE patient_id = ? ORDER BY created_at ASC",
        )
        .bind(patient_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(medication_from_row).collect()
    }

    pub async fn get_medication(
        &self,
        patient_id: &str,
        medication_id: &str,
    ) -> Result<Option<Medication>> {
        let row = sqlx::query("SELECT * FROM medications WHERE id = ? AND patient_id = ?")
            .bind(medication_id)
            .bind(patient_id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(medication_from_row).transpose()
    }

    #[instrument(skip(self))]
    pub async fn set_medication_status(
        &self,
        medication_id: &str,
        status: MedicationStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE medications SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(medication_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    #[instrument(skip(self, admin), fields(medication_id = %admin.medication_id))]
    pub async fn record_administration(&self, admin: &MedicationAdministration) -> Result<()> {
        sqlx::query(
            "INSERT INTO medication_administrations (
                id, medication_id, patient_id, administered_at,
                administered_by, dose_given, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&admin.id)
        .bind(&admin.medication_id)
        .bind(&admin.patient_id)
        .bind(to_millis(admin.administered_at))
        .bind(&admin.administered_by)
        .bind(&admin.dose_given)
        .bind(&admin.notes)
        .execute(self.pool())
        .await?;

        info!("Dose recorded for medication {}", admin.medication_id);
        Ok(())
    }

    pub async fn get_administrations(
        &self,
        medication_id: &str,
    ) -> Result<Vec<MedicationAdministration>> {
        let rows = sqlx::query(
            "SELECT * FROM medication_administrations
             WHERE medication_id = ? ORDER BY administered_at ASC",
        )
        .bind(medication_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(administration_from_row).collect()
    }

    pub async fn get_last_administration(
        &self,
        medication_id: &str,
    ) -> Result<Option<MedicationAdministration>> {
        let row = sqlx::query(
            "SELECT * FROM medication_administrations
             WHERE medication_id = ? ORDER BY administered_at DESC LIMIT 1",
        )
        .bind(medication_id)
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(administration_from_row).transpose()
    }

    /// Active scheduled orders whose next dose time has passed. PRN
    /// orders never come due.
    pub async fn get_due_medications(
        &self,
        patient_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<DueMedication>> {
        let mut due = Vec::new();
        for medication in self.get_medications(patient_id).await? {
            if medication.status != MedicationStatus::Active {
                continue;
            }
            if medication.end_date.is_some_and(|end| end <= now) {
                continue;
            }
            let Some(interval) = dose_interval(&medication.frequency) else {
                continue;
            };

            let last = self.get_last_administration(&medication.id).await?;
            let last_administered = last.map(|a| a.administered_at);
            let next_dose_at = match last_administered {
                Some(at) => at + interval,
                None => medication.start_date,
            };

            if next_dose_at <= now {
                due.push(DueMedication {
                    medication,
                    last_administered,
                    next_dose_at,
                });
            }
        }
        Ok(due)
    }
}
