//! Medication orders and administration events.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationStatus {
    Active,
    Discontinued,
    Completed,
}

impl MedicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MedicationStatus::Active => "active",
            MedicationStatus::Discontinued => "discontinued",
            MedicationStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "active" => Ok(MedicationStatus::Active),
            "discontinued" => Ok(MedicationStatus::Discontinued),
            "completed" => Ok(MedicationStatus::Completed),
            other => Err(anyhow!("unknown medication status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub patient_id: String,
    pub name: String,
    pub dose: String,
    pub route: String,
    /// Frequency code, e.g. "q6h", "bid", "prn".
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub prescribed_by: String,
    pub status: MedicationStatus,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationAdministration {
    pub id: String,
    pub medication_id: String,
    pub patient_id: String,
    pub administered_at: DateTime<Utc>,
    pub administered_by: String,
    pub dose_given: String,
    pub notes: Option<String>,
}

/// A scheduled dose that has come due.
#[derive(Debug, Clone, Serialize)]
pub struct DueMedication {
    pub medication: Medication,
    pub last_administered: Option<DateTime<Utc>>,
    pub next_dose_at: DateTime<Utc>,
}
