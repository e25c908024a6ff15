pub mod app_config;
pub mod catalog;
pub mod clerk;
pub mod config;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, LocalDbConfig};
pub use catalog::{EntityType, ProductSpec};
pub use clerk::{ClerkEmailAddress, ClerkEmailVerification, ClerkUser, ClerkWebhookEvent};
pub use config::{
    load_app_config, load_app_config_from_env, load_local_db_config, require_local_db,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
