use std::env;
use anyhow::{bail, Context, Result};

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://chenzwnina.github.io";
pub const DEFAULT_TABLE: &str = "annotations";
pub const MAX_LIST_PAGE_LIMIT: usize = 1000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Connection settings for the Cloud Spanner backend
#[derive(Debug, Clone)]
pub struct SpannerConfig {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl SpannerConfig {
    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

/// Which key-value store backs the service
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    Spanner(SpannerConfig),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub table: String,
    pub allowed_origin: String,
    pub list_page_limit: usize,
    /// Largest request body buffered by the annotation routes
    pub max_body_bytes: usize,
    pub service_port: u16,
    pub service_host: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| "spanner".to_string());

        let store = match backend.as_str() {
            "memory" => StoreConfig::Memory,
            "spanner" => StoreConfig::Spanner(SpannerConfig {
                emulator_host: env::var("SPANNER_EMULATOR_HOST").ok(),
                project: env::var("SPANNER_PROJECT")
                    .context("SPANNER_PROJECT environment variable is required")?,
                instance: env::var("SPANNER_INSTANCE")
                    .context("SPANNER_INSTANCE environment variable is required")?,
                database: env::var("SPANNER_DATABASE")
                    .context("SPANNER_DATABASE environment variable is required")?,
            }),
            other => bail!("STORE_BACKEND must be 'spanner' or 'memory', got '{}'", other),
        };

        let table = env::var("KV_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string());
        if !is_valid_table_name(&table) {
            bail!(
                "KV_TABLE must start with a letter and contain only letters, digits and underscores, got '{}'",
                table
            );
        }

        let allowed_origin = env::var("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGIN.to_string());

        let list_page_limit = env::var("LIST_PAGE_LIMIT")
            .unwrap_or_else(|_| MAX_LIST_PAGE_LIMIT.to_string())
            .parse::<usize>()
            .context("LIST_PAGE_LIMIT must be a positive integer")?;
        if list_page_limit == 0 || list_page_limit > MAX_LIST_PAGE_LIMIT {
            bail!("LIST_PAGE_LIMIT must be between 1 and {}", MAX_LIST_PAGE_LIMIT);
        }

        let max_body_bytes = env::var("MAX_BODY_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_BODY_BYTES.to_string())
            .parse::<usize>()
            .context("MAX_BODY_BYTES must be a positive integer")?;
        if max_body_bytes == 0 {
            bail!("MAX_BODY_BYTES must be greater than 0");
        }

        let service_port = env::var("SERVICE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(Config {
            store,
            table,
            allowed_origin,
            list_page_limit,
            max_body_bytes,
            service_port,
            service_host,
        })
    }

    /// In-memory store with every other setting at its default
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Config {
            store: StoreConfig::Memory,
            table: DEFAULT_TABLE.to_string(),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            list_page_limit: MAX_LIST_PAGE_LIMIT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            service_port: 3000,
            service_host: "0.0.0.0".to_string(),
        }
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        match &self.store {
            StoreConfig::Memory => tracing::info!("  Store backend: memory (not persisted)"),
            StoreConfig::Spanner(spanner) => {
                tracing::info!("  Store backend: spanner");
                tracing::info!("  Spanner emulator: {}",
                    spanner.emulator_host.as_deref().unwrap_or("disabled (using production)"));
                tracing::info!("  Spanner database: {}", spanner.database_path());
            }
        }
        tracing::info!("  Table: {}", self.table);
        tracing::info!("  CORS allowed origin: {}", self.allowed_origin);
        tracing::info!("  List page limit: {}", self.list_page_limit);
        tracing::info!("  Max request body: {} bytes", self.max_body_bytes);
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}

/// Serializes tests that read or write process environment variables
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
