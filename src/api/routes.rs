//! Route table.

use actix_web::web;

use super::{assessments, auth, medications, patients, reports, services, users, vitals};
use crate::live;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Auth
            .route("/auth/register", web::post().to(auth::register))
            .route("/auth/login", web::post().to(auth::login))
            // User administration
            .route("/users", web::get().to(users::list))
            .route("/users/{id}/role", web::put().to(users::set_role))
            .route("/users/{id}/active", web::put().to(users::set_active))
            // Patients
            .route("/patients", web::post().to(patients::create))
            .route("/patients", web::get().to(patients::list))
            .route("/patients/{id}", web::get().to(patients::get))
            .route("/patients/{id}", web::put().to(patients::update))
            .route("/patients/{id}/care-level", web::put().to(patients::set_care_level))
            // Vital signs
            .route("/patients/{id}/vitals", web::post().to(vitals::record))
            .route("/patients/{id}/vitals", web::get().to(vitals::history))
            .route("/patients/{id}/vitals/latest", web::get().to(vitals::latest))
            .route("/patients/{id}/vitals/schedule", web::get().to(vitals::schedule))
            // Medications
            .route("/patients/{id}/medications", web::post().to(medications::create))
            .route("/patients/{id}/medications", web::get().to(medications::list))
            .route("/patients/{id}/medications/due", web::get().to(medications::due))
            .route(
                "/patients/{id}/medications/{mid}/administrations",
                web::post().to(medications::administer),
            )
            .route(
                "/patients/{id}/medications/{mid}/administrations",
                web::get().to(medications::administrations),
            )
            .route(
                "/patients/{id}/medications/{mid}/status",
                web::put().to(medications::set_status),
            )
            // Report taxonomy and nursing reports
            .route("/report-categories", web::post().to(reports::create_category))
            .route("/report-categories", web::get().to(reports::list_categories))
            .route("/report-categories/{id}/items", web::post().to(reports::create_item))
            .route("/report-taxonomy", web::get().to(reports::taxonomy))
            .route("/patients/{id}/reports", web::post().to(reports::create_report))
            .route("/patients/{id}/reports", web::get().to(reports::list_reports))
            // Assessments
            .route("/assessment-forms", web::post().to(assessments::create_form))
            .route("/assessment-forms", web::get().to(assessments::list_forms))
            .route("/assessment-forms/{id}", web::get().to(assessments::get_form))
            .route(
                "/assessment-forms/{id}/submissions",
                web::post().to(assessments::submit),
            )
            .route(
                "/assessment-forms/{id}/submissions",
                web::get().to(assessments::submissions),
            )
            // Care services
            .route("/patients/{id}/services", web::post().to(services::create))
            .route("/patients/{id}/services", web::get().to(services::list))
            .route("/services/due", web::get().to(services::due))
            .route("/services/{id}/status", web::put().to(services::set_status)),
    );

    cfg.route("/ws", web::get().to(live::ws_route));
}
