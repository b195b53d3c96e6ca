use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::auth::AuthService;
use crate::config::AppConfig;

pub struct AppState {
    /// Single connection; the mutex also serializes the duplicate-check +
    /// insert sequence in booking creation.
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub auth: AuthService,
}
