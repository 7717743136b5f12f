//! Storage-level coverage of medications, reports, assessments, and
//! care services.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use salmandyar::core::report::compose_report;
use salmandyar::core::schedule::CareLevel;
use salmandyar::core::scoring::score_submission;
use salmandyar::db::Database;
use salmandyar::models::assessment::{
    AssessmentForm, AssessmentSubmission, Question, QuestionOption, SubmissionAnswer,
};
use salmandyar::models::medication::{Medication, MedicationAdministration, MedicationStatus};
use salmandyar::models::patient::Patient;
use salmandyar::models::report::{ChecklistItem, NursingReport, ReportCategory};
use salmandyar::models::service::{CareService, ServiceStatus};

fn at(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .unwrap()
        .and_utc()
}

fn patient() -> Patient {
    let admitted = at("2024-01-01T00:00");
    Patient {
        id: Uuid::new_v4().to_string(),
        first_name: "Hushang".into(),
        last_name: "Karimi".into(),
        national_id: Some("0012345678".into()),
        date_of_birth: NaiveDate::from_ymd_opt(1938, 11, 2).unwrap(),
        sex: "male".into(),
        room: Some("3A".into()),
        admission_date: admitted,
        primary_diagnosis: None,
        notes: None,
        care_level: CareLevel::Level2,
        care_level_changed_at: None,
        created_at: admitted,
        updated_at: admitted,
    }
}

async fn setup() -> (Database, Patient) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let p = patient();
    db.create_patient(&p).await.unwrap();
    (db, p)
}

#[tokio::test]
async fn due_medications_follow_the_frequency_code() {
    let (db, p) = setup().await;
    let start = at("2024-01-02T08:00");

    let medication = Medication {
        id: Uuid::new_v4().to_string(),
        patient_id: p.id.clone(),
        name: "Metformin".into(),
        dose: "500mg".into(),
        route: "oral".into(),
        frequency: "q6h".into(),
        start_date: start,
        end_date: None,
        prescribed_by: "Dr. Rahimi".into(),
        status: MedicationStatus::Active,
        instructions: None,
        created_at: start,
    };
    db.add_medication(&medication).await.unwrap();

    // Never administered: due from the start date onward.
    let due = db.get_due_medications(&p.id, start + Duration::hours(1)).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].next_dose_at, start);
    assert_eq!(due[0].last_administered, None);

    let given = MedicationAdministration {
        id: Uuid::new_v4().to_string(),
        medication_id: medication.id.clone(),
        patient_id: p.id.clone(),
        administered_at: start + Duration::hours(1),
        administered_by: "nurse-on-shift".into(),
        dose_given: "500mg".into(),
        notes: None,
    };
    db.record_administration(&given).await.unwrap();

    // Inside the next 6h window: nothing due.
    let due = db.get_due_medications(&p.id, start + Duration::hours(5)).await.unwrap();
    assert!(due.is_empty());

    // Past it: due again, six hours after the last dose.
    let due = db.get_due_medications(&p.id, start + Duration::hours(8)).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].next_dose_at, given.administered_at + Duration::hours(6));

    // Discontinued orders never come due.
    db.set_medication_status(&medication.id, MedicationStatus::Discontinued)
        .await
        .unwrap();
    let due = db.get_due_medications(&p.id, start + Duration::hours(8)).await.unwrap();
    assert!(due.is_empty());
}

#[tokio::test]
async fn prn_medications_never_come_due() {
    let (db, p) = setup().await;
    let start = at("2024-01-02T08:00");

    let medication = Medication {
        id: Uuid::new_v4().to_string(),
        patient_id: p.id.clone(),
        name: "Acetaminophen".into(),
        dose: "325mg".into(),
        route: "oral".into(),
        frequency: "prn".into(),
        start_date: start,
        end_date: None,
        prescribed_by: "Dr. Rahimi".into(),
        status: MedicationStatus::Active,
        instructions: Some("for pain".into()),
        created_at: start,
    };
    db.add_medication(&medication).await.unwrap();

    let due = db.get_due_medications(&p.id, start + Duration::days(3)).await.unwrap();
    assert!(due.is_empty());
}

#[tokio::test]
async fn nursing_report_is_composed_from_the_taxonomy() {
    let (db, p) = setup().await;

    let hygiene = ReportCategory {
        id: Uuid::new_v4().to_string(),
        parent_id: None,
        name: "Hygiene".into(),
        position: 1,
    };
    db.create_report_category(&hygiene).await.unwrap();

    let bathed = ChecklistItem {
        id: Uuid::new_v4().to_string(),
        category_id: hygiene.id.clone(),
        phrase: "Assisted morning bath".into(),
        position: 1,
    };
    let oral = ChecklistItem {
        id: Uuid::new_v4().to_string(),
        category_id: hygiene.id.clone(),
        phrase: "Oral care done".into(),
        position: 2,
    };
    db.create_checklist_item(&bathed).await.unwrap();
    db.create_checklist_item(&oral).await.unwrap();

    let categories = db.list_report_categories().await.unwrap();
    let items = db.list_checklist_items().await.unwrap();
    let checked: HashSet<String> = [bathed.id.clone(), oral.id.clone()].into_iter().collect();
    let content = compose_report(&categories, &items, &checked, Some("slept well"));

    let report = NursingReport {
        id: Uuid::new_v4().to_string(),
        patient_id: p.id.clone(),
        content: content.clone(),
        note: Some("slept well".into()),
        written_by: "nurse-on-shift".into(),
        created_at: at("2024-01-03T07:00"),
    };
    db.create_nursing_report(&report, &[bathed.id.clone(), oral.id.clone()])
        .await
        .unwrap();

    let stored = db.list_nursing_reports(&p.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].content,
        "Hygiene: Assisted morning bath. Oral care done.\nNote: slept well"
    );

    let taxonomy = db.get_report_taxonomy().await.unwrap();
    assert_eq!(taxonomy.len(), 1);
    assert_eq!(taxonomy[0].items.len(), 2);
}

#[tokio::test]
async fn assessment_submissions_are_graded_and_stored() {
    let (db, _) = setup().await;
    let created = at("2024-01-04T10:00");

    let form = AssessmentForm {
        id: Uuid::new_v4().to_string(),
        title: "Quarterly caregiver evaluation".into(),
        description: None,
        created_by: "head-nurse".into(),
        created_at: created,
    };
    let q1 = Question {
        id: Uuid::new_v4().to_string(),
        form_id: form.id.clone(),
        text: "Responds to call bells promptly".into(),
        position: 0,
    };
    let options = vec![
        QuestionOption {
            id: Uuid::new_v4().to_string(),
            question_id: q1.id.clone(),
            text: "Rarely".into(),
            points: 0,
            position: 0,
        },
        QuestionOption {
            id: Uuid::new_v4().to_string(),
            question_id: q1.id.clone(),
            text: "Always".into(),
            points: 10,
            position: 1,
        },
    ];
    db.create_assessment_form(&form, &[q1.clone()], &options)
        .await
        .unwrap();

    let (_, questions, stored_options) =
        db.get_assessment_form(&form.id).await.unwrap().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(stored_options.len(), 2);

    let answers = HashMap::from([(q1.id.clone(), options[1].id.clone())]);
    let outcome = score_submission(&questions, &stored_options, &answers).unwrap();
    assert_eq!(outcome.score, 10);
    assert_eq!(outcome.percent, 100);

    let submission = AssessmentSubmission {
        id: Uuid::new_v4().to_string(),
        form_id: form.id.clone(),
        subject: "caregiver-7".into(),
        submitted_by: "head-nurse".into(),
        score: outcome.score,
        max_score: outcome.max_score,
        percent: outcome.percent,
        submitted_at: created,
    };
    let answer_rows = vec![SubmissionAnswer {
        submission_id: submission.id.clone(),
        question_id: q1.id.clone(),
        option_id: options[1].id.clone(),
    }];
    db.create_submission(&submission, &answer_rows).await.unwrap();

    let stored = db.list_submissions(&form.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].percent, 100);
}

#[tokio::test]
async fn service_reminders_open_with_their_window() {
    let (db, p) = setup().await;
    let scheduled = at("2024-01-05T15:00");

    let service = CareService {
        id: Uuid::new_v4().to_string(),
        patient_id: p.id.clone(),
        title: "Physiotherapy session".into(),
        details: None,
        scheduled_at: scheduled,
        remind_minutes_before: 30,
        status: ServiceStatus::Scheduled,
        created_by: "head-nurse".into(),
        created_at: at("2024-01-05T08:00"),
        updated_at: at("2024-01-05T08:00"),
    };
    db.create_service(&service).await.unwrap();

    // Before the window opens.
    let due = db.due_services(scheduled - Duration::minutes(31)).await.unwrap();
    assert!(due.is_empty());

    // Window open.
    let due = db.due_services(scheduled - Duration::minutes(30)).await.unwrap();
    assert_eq!(due.len(), 1);
    assert!(due[0].needs_reminder(scheduled - Duration::minutes(30)));

    // Past due but unresolved: still flagged.
    let due = db.due_services(scheduled + Duration::hours(1)).await.unwrap();
    assert_eq!(due.len(), 1);

    // Completed services drop out.
    db.set_service_status(&service.id, ServiceStatus::Completed, scheduled)
        .await
        .unwrap();
    let due = db.due_services(scheduled + Duration::hours(1)).await.unwrap();
    assert!(due.is_empty());
}
