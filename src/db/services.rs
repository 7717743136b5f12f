//! Care-service queries.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, instrument};

use super::{from_millis, to_millis, Database};
use crate::models::service::{CareService, ServiceStatus};

fn service_from_row(row: &SqliteRow) -> Result<CareService> {
    let status: String = row.try_get("status")?;
    Ok(CareService {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        title: row.try_get("title")?,
        details: row.try_get("details")?,
        scheduled_at: from_millis(row.try_get("scheduled_at")?)?,
        remind_minutes_before: row.try_get("remind_minutes_before")?,
        status: ServiceStatus::parse(&status)?,
        created_by: row.try_get("created_by")?,
        created_at: from_millis(row.try_get("created_at")?)?,
        updated_at: from_millis(row.try_get("updated_at")?)?,
    })
}

impl Database {
    #[instrument(skip(self, service), fields(patient_id = %service.patient_id))]
    pub async fn create_service(&self, service: &CareService) -> Result<()> {
        sqlx::query(
            "INSERT INTO care_services (
                id, patient_id, title, details, scheduled_at,
                remind_minutes_before, status, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&service.id)
        .bind(&service.patient_id)
        .bind(&service.title)
        .bind(&service.details)
        .bind(to_millis(service.scheduled_at))
        .bind(service.remind_minutes_before)
        .bind(service.status.as_str())
        .bind(&service.created_by)
        .bind(to_millis(service.created_at))
        .bind(to_millis(service.updated_at))
        .execute(self.pool())
        .await?;

        info!("Service '{}' scheduled for patient {}", service.title, service.patient_id);
        Ok(())
    }

    pub async fn list_services(&self, patient_id: &str) -> Result<Vec<CareService>> {
        let rows = sqlx::query(
            "SELECT * FROM care_services WHERE patient_id = ? ORDER BY scheduled_at ASC",
        )
        .bind(patient_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(service_from_row).collect()
    }

    pub async fn get_service(&self, id: &str) -> Result<Option<CareService>> {
        let row = sqlx::query("SELECT * FROM care_services WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(service_from_row).transpose()
    }

    #[instrument(skip(self))]
    pub async fn set_service_status(
        &self,
        id: &str,
        status: ServiceStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE care_services SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(to_millis(updated_at))
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Scheduled services whose reminder window has opened, across all
    /// patients. Past-due services stay included until resolved.
    pub async fn due_services(&self, now: DateTime<Utc>) -> Result<Vec<CareService>> {
        let rows = sqlx::query(
            "SELECT * FROM care_services
             WHERE status = 'scheduled'
               AND scheduled_at - remind_minutes_before * 60000 <= ?
             ORDER BY scheduled_at ASC",
        )
        .bind(to_millis(now))
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(service_from_row).collect()
    }
}
