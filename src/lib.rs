pub mod api;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod db;
pub mod engine;
pub mod error;
pub mod notifications;
pub mod utils;

pub use db::DbPool;

use config::Config;
use engine::{AuditSink, LifecycleManager, SqliteAuditSink};
use notifications::{NotificationDispatcher, Notifier};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub audit: Arc<dyn AuditSink>,
    pub notifier: Notifier,
    pub lifecycle: LifecycleManager,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        let audit: Arc<dyn AuditSink> = Arc::new(SqliteAuditSink::new(db.clone()));
        let notifier = Notifier::new(
            dispatcher,
            db.clone(),
            config.notifications.admin_phone.clone(),
            config.notifications.timeout(),
        );
        let lifecycle = LifecycleManager::new(db.clone(), audit.clone(), notifier.clone());

        Self {
            config,
            db,
            audit,
            notifier,
            lifecycle,
        }
    }
}
