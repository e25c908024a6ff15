use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Azure storage account that hosts the public `products` container.
    pub azure_storage_account: Option<String>,
    pub azure_storage_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("azure_storage_account", &self.azure_storage_account)
            .field(
                "azure_storage_key",
                &self.azure_storage_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Connection settings for the optional mirror ("local") database that the
/// image uploader keeps in sync with the primary one.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalDbConfig {
    pub host: Option<String>,
    pub port: String,
    pub user: String,
    pub password: Option<String>,
    pub name: String,
    pub enabled: bool,
}

impl LocalDbConfig {
    /// Redacted `host:port/name` label for logs.
    #[must_use]
    pub fn display_target(&self) -> String {
        format!(
            "{}:{}/{}",
            self.host.as_deref().unwrap_or("<unset>"),
            self.port,
            self.name
        )
    }
}

impl std::fmt::Debug for LocalDbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .finish()
    }
}
