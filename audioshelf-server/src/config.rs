//! Server configuration

use audioshelf_core::StoreConfig;
use std::net::SocketAddr;

/// Default upload limit in megabytes
const DEFAULT_MAX_UPLOAD_MB: usize = 512;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: SocketAddr,

    /// Comma-separated list of allowed origins, or "*" for any.
    /// When unset, only localhost development origins are allowed.
    pub cors_origins: Option<String>,

    /// Maximum request body size for uploads
    pub max_upload_bytes: usize,

    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            store: StoreConfig::new("./audioshelf_data"),
        }
    }
}

impl ServerConfig {
    /// Read configuration from `AUDIOSHELF_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self {
            store: StoreConfig::from_env(),
            ..Self::default()
        };

        if let Ok(bind) = std::env::var("AUDIOSHELF_BIND") {
            config.bind = bind
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid AUDIOSHELF_BIND '{}': {}", bind, e))?;
        }

        config.cors_origins = std::env::var("AUDIOSHELF_CORS_ORIGINS").ok();

        if let Ok(limit) = std::env::var("AUDIOSHELF_MAX_UPLOAD_MB") {
            let mb: usize = limit.parse().map_err(|e| {
                anyhow::anyhow!("Invalid AUDIOSHELF_MAX_UPLOAD_MB '{}': {}", limit, e)
            })?;
            config.max_upload_bytes = mb * 1024 * 1024;
        }

        Ok(config)
    }
}
