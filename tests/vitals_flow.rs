//! End-to-end coverage of the measurement schedule over real storage:
//! record vitals, derive the schedule, change the care level, and watch
//! the anchor move.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use salmandyar::core::schedule::{schedule_status, CareLevel, Compliance};
use salmandyar::db::Database;
use salmandyar::models::patient::Patient;
use salmandyar::models::vitals::VitalSign;

fn at(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .unwrap()
        .and_utc()
}

fn patient(care_level: CareLevel) -> Patient {
    let admitted = at("2024-01-01T00:00");
    Patient {
        id: Uuid::new_v4().to_string(),
        first_name: "Parvin".into(),
        last_name: "Ahmadi".into(),
        national_id: None,
        date_of_birth: NaiveDate::from_ymd_opt(1941, 5, 20).unwrap(),
        sex: "female".into(),
        room: Some("12B".into()),
        admission_date: admitted,
        primary_diagnosis: Some("hypertension".into()),
        notes: None,
        care_level,
        care_level_changed_at: None,
        created_at: admitted,
        updated_at: admitted,
    }
}

fn vitals(patient_id: &str, measured_at: DateTime<Utc>) -> VitalSign {
    VitalSign {
        id: Uuid::new_v4().to_string(),
        patient_id: patient_id.into(),
        recorded_by: "nurse-on-shift".into(),
        measured_at,
        recorded_at: measured_at,
        systolic: 135.0,
        diastolic: 85.0,
        mean_arterial_pressure: VitalSign::derived_map(135.0, 85.0),
        pulse: 74.0,
        respiratory_rate: 18.0,
        temperature_celsius: 36.9,
        oxygen_saturation: 96.0,
        glasgow_coma_scale: Some(15),
        is_late_entry: false,
        delay_reason: None,
    }
}

#[tokio::test]
async fn schedule_follows_the_recorded_history() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let p = patient(CareLevel::Level2);
    db.create_patient(&p).await.unwrap();

    db.record_vital_signs(&vitals(&p.id, at("2024-01-01T08:00")))
        .await
        .unwrap();
    db.record_vital_signs(&vitals(&p.id, at("2024-01-01T14:05")))
        .await
        .unwrap();

    let history = db.get_vital_signs(&p.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].measured_at, at("2024-01-01T08:00"));

    let stored = db.get_patient(&p.id).await.unwrap().unwrap();
    let status = schedule_status(
        stored.care_level,
        &history,
        stored.care_level_changed_at,
        at("2024-01-01T15:00"),
    );

    assert_eq!(status.anchor, Some(at("2024-01-01T08:00")));
    assert_eq!(status.next_due, at("2024-01-01T20:00"));
    assert_eq!(status.entries[0].compliance, Compliance::FirstEntry);
    assert_eq!(status.entries[1].compliance, Compliance::OnTime);
}

#[tokio::test]
async fn late_measurements_are_labelled_with_their_delay() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let p = patient(CareLevel::Level4);
    db.create_patient(&p).await.unwrap();

    db.record_vital_signs(&vitals(&p.id, at("2024-02-01T06:00")))
        .await
        .unwrap();
    // 2h interval, measured 45 minutes past the slot.
    db.record_vital_signs(&vitals(&p.id, at("2024-02-01T08:45")))
        .await
        .unwrap();

    let history = db.get_vital_signs(&p.id).await.unwrap();
    let status = schedule_status(CareLevel::Level4, &history, None, at("2024-02-01T09:00"));

    assert_eq!(
        status.entries[1].compliance,
        Compliance::Late { delay_minutes: 45 }
    );
}

#[tokio::test]
async fn care_level_change_resets_the_anchor() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let p = patient(CareLevel::Level1);
    db.create_patient(&p).await.unwrap();

    db.record_vital_signs(&vitals(&p.id, at("2024-03-01T00:00")))
        .await
        .unwrap();
    db.record_vital_signs(&vitals(&p.id, at("2024-03-02T08:00")))
        .await
        .unwrap();

    let reset = at("2024-03-02T09:30");
    db.set_care_level(&p.id, CareLevel::Level3, reset)
        .await
        .unwrap();

    let stored = db.get_patient(&p.id).await.unwrap().unwrap();
    assert_eq!(stored.care_level, CareLevel::Level3);
    assert_eq!(stored.care_level_changed_at, Some(reset));

    let history = db.get_vital_signs(&p.id).await.unwrap();
    let status = schedule_status(
        stored.care_level,
        &history,
        stored.care_level_changed_at,
        at("2024-03-02T10:00"),
    );

    // The reset discards the oldest-measurement anchor entirely.
    assert_eq!(status.anchor, Some(reset));
    assert_eq!(status.interval_minutes, 240);
    assert_eq!(status.next_due, reset);
}

#[tokio::test]
async fn patient_round_trips_through_storage_and_cache() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let p = patient(CareLevel::Level5);
    db.create_patient(&p).await.unwrap();

    // Second read is served from the cache; both must agree.
    let first = db.get_patient(&p.id).await.unwrap().unwrap();
    let second = db.get_patient(&p.id).await.unwrap().unwrap();
    assert_eq!(first.care_level, CareLevel::Level5);
    assert_eq!(first.admission_date, second.admission_date);
    assert_eq!(first.date_of_birth, p.date_of_birth);
}
