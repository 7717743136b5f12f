//! Domain logic shared between the API handlers and any future callers.
//!
//! Everything in here is pure: functions take explicit timestamps and
//! return plain values, so the same code backs both the patient-record
//! and nurse-portal views.

pub mod frequency;
pub mod report;
pub mod schedule;
pub mod scoring;
