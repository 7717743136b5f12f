//! Scheduled care services and their reminder windows.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Scheduled => "scheduled",
            ServiceStatus::Completed => "completed",
            ServiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "scheduled" => Ok(ServiceStatus::Scheduled),
            "completed" => Ok(ServiceStatus::Completed),
            "cancelled" => Ok(ServiceStatus::Cancelled),
            other => Err(anyhow!("unknown service status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareService {
    pub id: String,
    pub patient_id: String,
    pub title: String,
    pub details: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub remind_minutes_before: i64,
    pub status: ServiceStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CareService {
    /// A service needs a reminder once its window opens and until it is
    /// completed or cancelled. Past-due services stay flagged.
    pub fn needs_reminder(&self, now: DateTime<Utc>) -> bool {
        self.status == ServiceStatus::Scheduled
            && now >= self.scheduled_at - Duration::minutes(self.remind_minutes_before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(scheduled_at: DateTime<Utc>, remind: i64, status: ServiceStatus) -> CareService {
        CareService {
            id: "svc-1".into(),
            patient_id: "p-1".into(),
            title: "physiotherapy".into(),
            details: None,
            scheduled_at,
            remind_minutes_before: remind,
            status,
            created_by: "nurse".into(),
            created_at: scheduled_at,
            updated_at: scheduled_at,
        }
    }

    #[test]
    fn reminder_opens_at_window_start() {
        let at = Utc::now();
        let svc = service(at + Duration::minutes(30), 30, ServiceStatus::Scheduled);
        assert!(svc.needs_reminder(at));
        assert!(!svc.needs_reminder(at - Duration::minutes(1)));
    }

    #[test]
    fn overdue_services_stay_flagged() {
        let at = Utc::now();
        let svc = service(at - Duration::hours(2), 15, ServiceStatus::Scheduled);
        assert!(svc.needs_reminder(at));
    }

    #[test]
    fn finished_services_never_remind() {
        let at = Utc::now();
        let svc = service(at, 30, ServiceStatus::Completed);
        assert!(!svc.needs_reminder(at));
    }
}
