use std::sync::Arc;

use sqlx::MySqlPool;
use tracing::warn;

use crate::config::AppConfig;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::mail::{LogMailer, Mailer, SmtpMailer};
use crate::map::KakaoMapClient;
use crate::storage::{MemoryStorage, ObjectStorage, S3Storage};

/// Shared handles passed to every handler through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub pool: MySqlPool,
    pub storage: Arc<dyn ObjectStorage>,
    pub mailer: Arc<dyn Mailer>,
    pub map: KakaoMapClient,
}

impl AppState {
    pub fn new(pool: MySqlPool, storage: Arc<dyn ObjectStorage>, mailer: Arc<dyn Mailer>, map: KakaoMapClient) -> Self {
        Self { pool, storage, mailer, map }
    }

    /// Build the production state. Storage and mail fall back to in-process
    /// implementations when their section is not configured.
    pub async fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::connect_lazy(&config.database)?;

        let storage: Arc<dyn ObjectStorage> = match config.storage.bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() => Arc::new(S3Storage::from_config(&config.storage, bucket).await),
            _ => {
                warn!("S3_BUCKET_NAME not set; uploads are kept in memory");
                Arc::new(MemoryStorage::new())
            }
        };

        let mailer: Arc<dyn Mailer> = match config.mail.smtp_host.as_deref() {
            Some(host) if !host.is_empty() => match SmtpMailer::from_config(&config.mail, host) {
                Ok(mailer) => Arc::new(mailer),
                Err(e) => {
                    warn!("SMTP mailer unavailable ({}); mails will only be logged", e);
                    Arc::new(LogMailer::new())
                }
            },
            _ => {
                warn!("SMTP_HOST not set; mails will only be logged");
                Arc::new(LogMailer::new())
            }
        };

        Ok(Self::new(pool, storage, mailer, KakaoMapClient::new(&config.map)))
    }
}
