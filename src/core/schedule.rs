//! Vital-sign measurement scheduling and compliance evaluation.
//!
//! A patient's care level dictates how often their vitals must be taken.
//! The required measurement times form a fixed grid projected forward
//! from an anchor: the oldest recorded measurement, or the moment staff
//! last changed the care level. Each recorded measurement is classified
//! against its predecessor as on time, late, or early.
//!
//! All functions take `now` explicitly so callers (and tests) control
//! the clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::vitals::VitalSign;

/// Tolerance, in minutes, applied when comparing a measurement gap
/// against the required interval.
pub const TOLERANCE_MINUTES: i64 = 30;

const MS_PER_MINUTE: i64 = 60_000;

/// How frequently a patient's vitals must be measured. Higher levels
/// mean shorter intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CareLevel {
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
}

impl From<CareLevel> for u8 {
    fn from(level: CareLevel) -> u8 {
        level as u8
    }
}

impl TryFrom<u8> for CareLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CareLevel::Level1),
            2 => Ok(CareLevel::Level2),
            3 => Ok(CareLevel::Level3),
            4 => Ok(CareLevel::Level4),
            5 => Ok(CareLevel::Level5),
            other => Err(format!("care level out of range: {}", other)),
        }
    }
}

impl TryFrom<i64> for CareLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| format!("care level out of range: {}", value))?
            .try_into()
    }
}

/// Required interval between measurements for a care level.
pub fn measurement_interval(level: CareLevel) -> Duration {
    match level {
        CareLevel::Level1 => Duration::hours(12),
        CareLevel::Level2 => Duration::hours(6),
        CareLevel::Level3 => Duration::hours(4),
        CareLevel::Level4 => Duration::hours(2),
        CareLevel::Level5 => Duration::hours(1),
    }
}

/// Reference timestamp the measurement grid is projected from.
///
/// A manual reset (recorded when staff change the care level) always
/// wins; otherwise the grid stays pinned to the oldest measurement so
/// new readings never shift it. Returns `None` when neither exists, in
/// which case the caller projects from `now`.
pub fn resolve_anchor(
    measurements: &[VitalSign],
    manual_reset: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    manual_reset.or_else(|| measurements.iter().map(|v| v.measured_at).min())
}

/// Next grid-aligned due time, strictly after the latest recorded
/// measurement (or after `now` when no measurement exists).
///
/// Slot arithmetic is integer-floor division on millisecond durations,
/// so the result always differs from the anchor by a whole number of
/// intervals.
pub fn next_due(
    anchor: DateTime<Utc>,
    interval: Duration,
    last_measured_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let step = interval.num_milliseconds();
    debug_assert!(step > 0, "measurement interval must be positive");

    let reference = match last_measured_at {
        Some(last) => last,
        // No history and a future anchor: the anchor itself is the first
        // grid point past `now`.
        None if anchor > now => return anchor,
        None => now,
    };

    let elapsed = (reference - anchor).num_milliseconds();
    let slots_passed = elapsed.div_euclid(step);
    anchor + Duration::milliseconds((slots_passed + 1) * step)
}

/// Compliance label for one measurement relative to its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "label", rename_all = "snake_case")]
pub enum Compliance {
    FirstEntry,
    OnTime,
    Late { delay_minutes: i64 },
    Early,
}

/// Classifies the gap between two consecutive measurements against the
/// required interval, within a +/- [`TOLERANCE_MINUTES`] tolerance.
///
/// The care level is assumed constant across the compared pair; a level
/// change between the two measurements is not compensated for.
pub fn classify(
    current: &VitalSign,
    previous: Option<&VitalSign>,
    interval: Duration,
) -> Compliance {
    let Some(previous) = previous else {
        return Compliance::FirstEntry;
    };

    let gap = current.measured_at - previous.measured_at;
    let deviation_ms = (gap - interval).num_milliseconds();
    let tolerance_ms = TOLERANCE_MINUTES * MS_PER_MINUTE;

    if deviation_ms.abs() <= tolerance_ms {
        Compliance::OnTime
    } else if deviation_ms > tolerance_ms {
        Compliance::Late {
            delay_minutes: (deviation_ms + MS_PER_MINUTE / 2).div_euclid(MS_PER_MINUTE),
        }
    } else {
        Compliance::Early
    }
}

/// One history entry with its compliance label.
#[derive(Debug, Clone, Serialize)]
pub struct EntryCompliance {
    pub vital_sign_id: String,
    pub measured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub compliance: Compliance,
}

/// Full schedule picture for one patient, derived from their history.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStatus {
    pub care_level: CareLevel,
    pub interval_minutes: i64,
    pub anchor: Option<DateTime<Utc>>,
    pub next_due: DateTime<Utc>,
    pub entries: Vec<EntryCompliance>,
}

/// Derives the complete schedule view from a patient's measurement
/// history. `measurements` must be sorted by `measured_at` ascending.
pub fn schedule_status(
    care_level: CareLevel,
    measurements: &[VitalSign],
    manual_reset: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ScheduleStatus {
    let interval = measurement_interval(care_level);
    let anchor = resolve_anchor(measurements, manual_reset);
    let last = measurements.last().map(|v| v.measured_at);

    let entries = measurements
        .iter()
        .enumerate()
        .map(|(i, current)| EntryCompliance {
            vital_sign_id: current.id.clone(),
            measured_at: current.measured_at,
            compliance: classify(
                current,
                if i == 0 { None } else { Some(&measurements[i - 1]) },
                interval,
            ),
        })
        .collect();

    ScheduleStatus {
        care_level,
        interval_minutes: interval.num_minutes(),
        anchor,
        next_due: next_due(anchor.unwrap_or(now), interval, last, now),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use test_case::test_case;

    fn at(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
            .unwrap()
            .and_utc()
    }

    fn vital(measured_at: DateTime<Utc>) -> VitalSign {
        VitalSign {
            id: format!("vs-{}", measured_at.timestamp()),
            patient_id: "p-1".into(),
            recorded_by: "nurse".into(),
            measured_at,
            recorded_at: measured_at,
            systolic: 120.0,
            diastolic: 80.0,
            mean_arterial_pressure: VitalSign::derived_map(120.0, 80.0),
            pulse: 70.0,
            respiratory_rate: 16.0,
            temperature_celsius: 36.8,
            oxygen_saturation: 97.0,
            glasgow_coma_scale: None,
            is_late_entry: false,
            delay_reason: None,
        }
    }

    #[test_case(CareLevel::Level1, 12; "level 1 every 12 hours")]
    #[test_case(CareLevel::Level2, 6; "level 2 every 6 hours")]
    #[test_case(CareLevel::Level3, 4; "level 3 every 4 hours")]
    #[test_case(CareLevel::Level4, 2; "level 4 every 2 hours")]
    #[test_case(CareLevel::Level5, 1; "level 5 hourly")]
    fn interval_table(level: CareLevel, hours: i64) {
        assert_eq!(measurement_interval(level), Duration::hours(hours));
    }

    #[test]
    fn care_level_round_trips_through_u8() {
        for n in 1u8..=5 {
            assert_eq!(u8::from(CareLevel::try_from(n).unwrap()), n);
        }
        assert!(CareLevel::try_from(0u8).is_err());
        assert!(CareLevel::try_from(6u8).is_err());
    }

    #[test]
    fn anchor_prefers_manual_reset() {
        let reset = at("2024-03-01T09:15");
        let history = vec![vital(at("2024-01-01T00:00")), vital(at("2024-01-01T06:00"))];
        assert_eq!(resolve_anchor(&history, Some(reset)), Some(reset));
    }

    #[test]
    fn anchor_falls_back_to_oldest_measurement() {
        let history = vec![vital(at("2024-01-01T06:00")), vital(at("2024-01-01T00:00"))];
        assert_eq!(resolve_anchor(&history, None), Some(at("2024-01-01T00:00")));
    }

    #[test]
    fn anchor_is_undefined_without_history_or_reset() {
        assert_eq!(resolve_anchor(&[], None), None);
    }

    #[test]
    fn next_due_advances_one_slot_past_the_last_measurement() {
        let anchor = at("2024-01-01T00:00");
        let due = next_due(
            anchor,
            Duration::hours(6),
            Some(at("2024-01-01T00:00")),
            at("2024-01-01T01:00"),
        );
        assert_eq!(due, at("2024-01-01T06:00"));
    }

    #[test]
    fn next_due_stays_on_the_anchor_grid() {
        let anchor = at("2024-01-01T00:00");
        // Last measurement mid-way through the third slot.
        let due = next_due(
            anchor,
            Duration::hours(6),
            Some(at("2024-01-01T13:05")),
            at("2024-01-01T14:00"),
        );
        assert_eq!(due, at("2024-01-01T18:00"));
    }

    #[test]
    fn next_due_without_history_exceeds_now() {
        let anchor = at("2024-01-01T00:00");
        let now = at("2024-01-01T07:30");
        let due = next_due(anchor, Duration::hours(6), None, now);
        assert_eq!(due, at("2024-01-01T12:00"));
        assert!(due > now);
    }

    #[test]
    fn next_due_without_history_at_the_anchor_instant() {
        let anchor = at("2024-01-01T00:00");
        let due = next_due(anchor, Duration::hours(6), None, anchor);
        assert_eq!(due, at("2024-01-01T06:00"));
    }

    #[test]
    fn next_due_after_a_reset_newer_than_the_last_measurement() {
        // Staff reset the grid after the last reading: the reset point
        // itself is the next slot.
        let reset = at("2024-01-02T09:00");
        let due = next_due(
            reset,
            Duration::hours(6),
            Some(at("2024-01-02T08:00")),
            at("2024-01-02T09:05"),
        );
        assert_eq!(due, reset);
    }

    #[test]
    fn next_due_is_always_grid_aligned_and_after_the_last_event() {
        let anchor = at("2024-01-01T00:00");
        let interval = Duration::hours(4);
        for offset_minutes in [0i64, 1, 59, 240, 241, 479, 1000, 5000] {
            let last = anchor + Duration::minutes(offset_minutes);
            let due = next_due(anchor, interval, Some(last), last);
            assert!(due > last);
            let delta = (due - anchor).num_milliseconds();
            assert_eq!(delta.rem_euclid(interval.num_milliseconds()), 0);
        }
    }

    #[test]
    fn classify_first_entry() {
        let current = vital(at("2024-01-01T00:00"));
        assert_eq!(
            classify(&current, None, Duration::hours(6)),
            Compliance::FirstEntry
        );
    }

    #[test]
    fn classify_late_with_rounded_delay() {
        let previous = vital(at("2024-01-01T00:00"));
        let current = vital(at("2024-01-01T06:31"));
        assert_eq!(
            classify(&current, Some(&previous), Duration::hours(6)),
            Compliance::Late { delay_minutes: 31 }
        );
    }

    #[test]
    fn classify_on_time_within_tolerance() {
        let previous = vital(at("2024-01-01T00:00"));
        // 20 minutes short of the interval: inside the 30-minute band.
        let current = vital(at("2024-01-01T05:40"));
        assert_eq!(
            classify(&current, Some(&previous), Duration::hours(6)),
            Compliance::OnTime
        );
    }

    #[test]
    fn classify_on_time_at_the_tolerance_boundary() {
        let previous = vital(at("2024-01-01T00:00"));
        let current = vital(at("2024-01-01T06:30"));
        assert_eq!(
            classify(&current, Some(&previous), Duration::hours(6)),
            Compliance::OnTime
        );
    }

    #[test]
    fn classify_early_past_tolerance() {
        let previous = vital(at("2024-01-01T00:00"));
        let current = vital(at("2024-01-01T05:29"));
        assert_eq!(
            classify(&current, Some(&previous), Duration::hours(6)),
            Compliance::Early
        );
    }

    #[test]
    fn classify_is_idempotent() {
        let previous = vital(at("2024-01-01T00:00"));
        let current = vital(at("2024-01-01T06:31"));
        let first = classify(&current, Some(&previous), Duration::hours(6));
        let second = classify(&current, Some(&previous), Duration::hours(6));
        assert_eq!(first, second);
    }

    #[test]
    fn schedule_status_labels_the_whole_history() {
        let history = vec![
            vital(at("2024-01-01T00:00")),
            vital(at("2024-01-01T06:05")),
            vital(at("2024-01-01T13:10")),
        ];
        let status = schedule_status(CareLevel::Level2, &history, None, at("2024-01-01T14:00"));

        assert_eq!(status.anchor, Some(at("2024-01-01T00:00")));
        assert_eq!(status.interval_minutes, 360);
        // Last reading fell in the third slot, so the fourth is due.
        assert_eq!(status.next_due, at("2024-01-01T18:00"));
        assert_eq!(status.entries[0].compliance, Compliance::FirstEntry);
        assert_eq!(status.entries[1].compliance, Compliance::OnTime);
        assert_eq!(
            status.entries[2].compliance,
            Compliance::Late { delay_minutes: 65 }
        );
    }

    #[test]
    fn schedule_status_with_no_data_projects_from_now() {
        let now = at("2024-01-01T10:00");
        let status = schedule_status(CareLevel::Level4, &[], None, now);
        assert_eq!(status.anchor, None);
        assert_eq!(status.next_due, at("2024-01-01T12:00"));
    }

    #[test]
    fn care_level_change_discards_the_measurement_anchor() {
        let history = vec![vital(at("2024-01-01T00:00"))];
        let reset = at("2024-01-05T08:42");
        let status = schedule_status(CareLevel::Level5, &history, Some(reset), reset);
        assert_eq!(status.anchor, Some(reset));
    }
}
