use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Top-level path segments owned by the API router.
const RESERVED_PREFIXES: &[&str] = &["_internal", "admin", "gallery", "media", "settings"];

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub storage: StorageConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
    /// Maximum upload request size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Asset root: every servable upload lives under this directory
    pub uploads_dir: String,
    /// Public path prefix stored on media records (e.g. `/uploads`)
    pub uploads_url_prefix: String,
    /// When set, `/media/:id` redirects to `<cdn_url><path>` instead of streaming
    pub cdn_url: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: "./public/uploads".to_string(),
            uploads_url_prefix: "/uploads".to_string(),
            cdn_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let uploads_dir =
            std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "./public/uploads".to_string());

        let uploads_url_prefix =
            std::env::var("UPLOADS_URL_PREFIX").unwrap_or_else(|_| "/uploads".to_string());

        let cdn_url = std::env::var("CDN_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let config = Config {
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            storage: StorageConfig {
                uploads_dir,
                uploads_url_prefix,
                cdn_url,
            },
            test_mode,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.storage.uploads_url_prefix;
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "UPLOADS_URL_PREFIX must start with '/' and must not end with '/', got '{prefix}'"
            )));
        }

        // The prefix doubles as the serving route, so it must be a literal path
        // that stays clear of the API's own top-level segments.
        let segments: Vec<&str> = prefix[1..].split('/').collect();
        let literal = segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });
        if !literal {
            return Err(ConfigError::ValidationError(format!(
                "UPLOADS_URL_PREFIX may only contain non-empty [A-Za-z0-9-_.] segments, got '{prefix}'"
            )));
        }
        if RESERVED_PREFIXES.contains(&segments[0]) {
            return Err(ConfigError::ValidationError(format!(
                "UPLOADS_URL_PREFIX must not start with /{}, it is used by the API",
                segments[0]
            )));
        }

        if let Some(ref cdn) = self.storage.cdn_url {
            if !cdn.starts_with("http://") && !cdn.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "CDN_URL must be an http(s) URL, got '{cdn}'"
                )));
            }
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Rewrite an `/uploads/...` path to an absolute CDN URL when one is configured.
    pub fn public_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        match self.storage.cdn_url {
            Some(ref cdn) if path.starts_with(&format!("{}/", self.storage.uploads_url_prefix)) => {
                format!("{cdn}{path}")
            }
            _ => path.to_string(),
        }
    }
}
