//! Patient records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::schedule::CareLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub national_id: Option<String>,
    pub date_of_birth: NaiveDate,
    pub sex: String,
    pub room: Option<String>,
    pub admission_date: DateTime<Utc>,
    pub primary_diagnosis: Option<String>,
    pub notes: Option<String>,
    pub care_level: CareLevel,
    /// Set when staff change the care level; acts as the manual reset
    /// anchor for the measurement grid.
    pub care_level_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
