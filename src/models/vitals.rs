//! Vital-sign measurement records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Entries written more than this long after the clinical measurement
/// are flagged as late and must carry a reason.
pub const LATE_ENTRY_THRESHOLD_MINUTES: i64 = 60;

/// One measurement event. Immutable once stored; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalSign {
    pub id: String,
    pub patient_id: String,
    pub recorded_by: String,
    /// When the vitals were clinically taken.
    pub measured_at: DateTime<Utc>,
    /// When the entry was written into the system.
    pub recorded_at: DateTime<Utc>,
    pub systolic: f32,
    pub diastolic: f32,
    pub mean_arterial_pressure: f32,
    pub pulse: f32,
    pub respiratory_rate: f32,
    pub temperature_celsius: f32,
    pub oxygen_saturation: f32,
    pub glasgow_coma_scale: Option<i32>,
    pub is_late_entry: bool,
    pub delay_reason: Option<String>,
}

impl VitalSign {
    /// Mean arterial pressure derived from systolic/diastolic when the
    /// monitor did not report one.
    pub fn derived_map(systolic: f32, diastolic: f32) -> f32 {
        (systolic + 2.0 * diastolic) / 3.0
    }

    /// Whether the gap between clinical time and entry time makes this
    /// a late entry.
    pub fn is_late(measured_at: DateTime<Utc>, recorded_at: DateTime<Utc>) -> bool {
        recorded_at - measured_at > Duration::minutes(LATE_ENTRY_THRESHOLD_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_derivation() {
        let map = VitalSign::derived_map(120.0, 80.0);
        assert!((map - 93.333_336).abs() < 0.001);
    }

    #[test]
    fn late_entry_threshold_is_exclusive() {
        let measured = Utc::now();
        assert!(!VitalSign::is_late(measured, measured + Duration::minutes(60)));
        assert!(VitalSign::is_late(measured, measured + Duration::minutes(61)));
    }
}
