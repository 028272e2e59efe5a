use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::{TokenError, TokenService};
use crate::config::AppConfig;
use crate::database::models::{Bootcamp, Course, Review, UserRecord};
use crate::database::{Repository, Store, BOOTCAMPS, COURSES, REVIEWS, USERS};
use crate::services::Mailer;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub mailer: Arc<dyn Mailer>,
    /// Serializes the publisher check-and-insert for new bootcamps.
    pub publish_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Fails when no JWT secret is configured.
    pub fn new(config: AppConfig, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Result<Self, TokenError> {
        let tokens = TokenService::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            mailer,
            publish_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn users(&self) -> Repository<UserRecord> {
        Repository::new(&USERS, self.store.clone())
    }

    pub fn bootcamps(&self) -> Repository<Bootcamp> {
        Repository::new(&BOOTCAMPS, self.store.clone())
    }

    pub fn courses(&self) -> Repository<Course> {
        Repository::new(&COURSES, self.store.clone())
    }

    pub fn reviews(&self) -> Repository<Review> {
        Repository::new(&REVIEWS, self.store.clone())
    }
}
