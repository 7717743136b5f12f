//! Vital-sign queries. Measurements are append-only.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, instrument};

use super::{from_millis, to_millis, Database};
use crate::models::vitals::VitalSign;

fn vital_from_row(row: &SqliteRow) -> Result<VitalSign> {
    Ok(VitalSign {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        recorded_by: row.try_get("recorded_by")?,
        measured_at: from_millis(row.try_get("measured_at")?)?,
        recorded_at: from_millis(row.try_get("recorded_at")?)?,
        systolic: row.try_get("systolic")?,
        diastolic: row.try_get("diastolic")?,
        mean_arterial_pressure: row.try_get("mean_arterial_pressure")?,
        pulse: row.try_get("pulse")?,
        respiratory_rate: row.try_get("respiratory_rate")?,
        temperature_celsius: row.try_get("temperature_celsius")?,
        oxygen_saturation: row.try_get("oxygen_saturation")?,
        glasgow_coma_scale: row.try_get("glasgow_coma_scale")?,
        is_late_entry: row.try_get("is_late_entry")?,
        delay_reason: row.try_get("delay_reason")?,
    })
}

impl Database {
    #[instrument(skip(self, vitals), fields(patient_id = %vitals.patient_id))]
    pub async fn record_vital_signs(&self, vitals: &VitalSign) -> Result<()> {
        sqlx::query(
            "INSERT INTO vital_signs (
                id, patient_id, recorded_by, measured_at, recorded_at,
                systolic, diastolic, mean_arterial_pressure, pulse,
                respiratory_rate, temperature_celsius, oxygen_saturation,
                glasgow_coma_scale, is_late_entry, delay_reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&vitals.id)
        .bind(&vitals.patient_id)
        .bind(&vitals.recorded_by)
        .bind(to_millis(vitals.measured_at))
        .bind(to_millis(vitals.recorded_at))
        .bind(vitals.systolic)
        .bind(vitals.diastolic)
        .bind(vitals.mean_arterial_pressure)
        .bind(vitals.pulse)
        .bind(vitals.respiratory_rate)
        .bind(vitals.temperature_celsius)
        .bind(vitals.oxygen_saturation)
        .bind(vitals.glasgow_coma_scale)
        .bind(vitals.is_late_entry)
        .bind(&vitals.delay_reason)
        .execute(self.pool())
        .await?;

        info!("Vital signs recorded for patient {}", vitals.patient_id);
        Ok(())
    }

    /// Full history, oldest first — the order the scheduling functions
    /// expect.
    pub async fn get_vital_signs(&self, patient_id: &str) -> Result<Vec<VitalSign>> {
        let rows = sqlx::query(
            "SELECT * FROM vital_signs WHERE patient_id = ? ORDER BY measured_at ASC",
        )
        .bind(patient_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(vital_from_row).collect()
    }

    pub async fn get_latest_vital_signs(&self, patient_id: &str) -> Result<Option<VitalSign>> {
        let row = sqlx::query(
            "SELECT * FROM vital_signs WHERE patient_id = ? ORDER BY measured_at DESC LIMIT 1",
        )
        .bind(patient_id)
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(vital_from_row).transpose()
    }
}
