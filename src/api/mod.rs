//! HTTP API for the care platform.

pub mod assessments;
pub mod auth;
pub mod medications;
pub mod patients;
pub mod reports;
pub mod routes;
pub mod services;
pub mod users;
pub mod vitals;

pub use routes::configure;

use actix::Addr;

use crate::config::Config;
use crate::db::Database;
use crate::live::LiveServer;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub live: Addr<LiveServer>,
}
