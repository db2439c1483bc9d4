//! Configuration module
//!
//! Configuration is read once from the process environment (with `.env` support)
//! and validated before the server starts.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 3000;
const MAX_UPLOAD_SIZE_MB: usize = 500;
const MAX_CONCURRENT_CONVERSIONS: usize = 2;
const CONVERSION_TIMEOUT_SECS: u64 = 600;

/// What happens to local artifacts once a request has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Keep staged, archived and converted files (audit trail).
    #[default]
    Keep,
    /// Remove the archived original and the final artifact after both uploads confirm.
    PurgeOnSuccess,
    /// Remove every local file the request produced, whatever the outcome.
    PurgeAlways,
}

impl FromStr for RetentionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(RetentionPolicy::Keep),
            "purge_on_success" => Ok(RetentionPolicy::PurgeOnSuccess),
            "purge_always" => Ok(RetentionPolicy::PurgeAlways),
            _ => Err(anyhow::anyhow!("Invalid retention policy: {}", s)),
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionPolicy::Keep => f.write_str("keep"),
            RetentionPolicy::PurgeOnSuccess => f.write_str("purge_on_success"),
            RetentionPolicy::PurgeAlways => f.write_str("purge_always"),
        }
    }
}

/// Process-level settings.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub log_format: String,
}

/// Remote store settings.
#[derive(Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_store_path: PathBuf,
    /// owner -> secret; empty accepts any non-empty credential pair.
    pub local_store_accounts: HashMap<String, String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("local_store_path", &self.local_store_path)
            .field("local_store_accounts", &self.local_store_accounts.len())
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_region", &self.s3_region)
            .field("s3_endpoint", &self.s3_endpoint)
            .finish()
    }
}

/// Conversion and local layout settings.
#[derive(Clone, Debug)]
pub struct ProcessingConfig {
    pub uploads_dir: PathBuf,
    pub downloads_dir: PathBuf,
    pub ffmpeg_path: String,
    pub soffice_path: String,
    pub max_upload_size_bytes: usize,
    pub max_concurrent_conversions: usize,
    pub conversion_timeout_secs: u64,
    pub retention_policy: RetentionPolicy,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    pub processing: ProcessingConfig,
}

fn parse_accounts(raw: &str) -> Result<HashMap<String, String>, anyhow::Error> {
    let mut accounts = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (owner, secret) = entry.split_once(':').ok_or_else(|| {
            anyhow::anyhow!("LOCAL_STORE_ACCOUNTS entries must be owner:secret")
        })?;
        if owner.is_empty() || secret.is_empty() {
            return Err(anyhow::anyhow!(
                "LOCAL_STORE_ACCOUNTS entries must have a non-empty owner and secret"
            ));
        }
        accounts.insert(owner.to_string(), secret.to_string());
    }
    Ok(accounts)
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        };

        let storage = StorageConfig {
            backend: env::var("STORAGE_BACKEND")
                .unwrap_or_else(|_| "local".to_string())
                .parse()?,
            local_store_path: env::var("LOCAL_STORE_PATH")
                .unwrap_or_else(|_| "remote-store".to_string())
                .into(),
            local_store_accounts: parse_accounts(
                &env::var("LOCAL_STORE_ACCOUNTS").unwrap_or_default(),
            )?,
            s3_bucket: optional_var("S3_BUCKET"),
            s3_region: optional_var("S3_REGION").or_else(|| optional_var("AWS_REGION")),
            s3_endpoint: optional_var("S3_ENDPOINT"),
        };

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let processing = ProcessingConfig {
            uploads_dir: env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            downloads_dir: env::var("DOWNLOADS_DIR")
                .unwrap_or_else(|_| "downloads".to_string())
                .into(),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            soffice_path: env::var("SOFFICE_PATH").unwrap_or_else(|_| "soffice".to_string()),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            max_concurrent_conversions: env::var("MAX_CONCURRENT_CONVERSIONS")
                .unwrap_or_else(|_| MAX_CONCURRENT_CONVERSIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONCURRENT_CONVERSIONS),
            conversion_timeout_secs: env::var("CONVERSION_TIMEOUT_SECS")
                .unwrap_or_else(|_| CONVERSION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONVERSION_TIMEOUT_SECS),
            retention_policy: env::var("RETENTION_POLICY")
                .unwrap_or_else(|_| "keep".to_string())
                .parse()?,
        };

        Ok(Config {
            base,
            storage,
            processing,
        })
    }

    /// Defaults suitable for tests and local development, rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Config {
            base: BaseConfig {
                server_port: SERVER_PORT,
                environment: "development".to_string(),
                log_format: "pretty".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Local,
                local_store_path: root.join("remote-store"),
                local_store_accounts: HashMap::new(),
                s3_bucket: None,
                s3_region: None,
                s3_endpoint: None,
            },
            processing: ProcessingConfig {
                uploads_dir: root.join("uploads"),
                downloads_dir: root.join("downloads"),
                ffmpeg_path: "ffmpeg".to_string(),
                soffice_path: "soffice".to_string(),
                max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
                max_concurrent_conversions: MAX_CONCURRENT_CONVERSIONS,
                conversion_timeout_secs: CONVERSION_TIMEOUT_SECS,
                retention_policy: RetentionPolicy::Keep,
            },
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.server_port == 0 {
            return Err(anyhow::anyhow!("PORT must be non-zero"));
        }

        if !matches!(self.base.log_format.as_str(), "pretty" | "json") {
            return Err(anyhow::anyhow!("LOG_FORMAT must be 'pretty' or 'json'"));
        }

        if self.processing.max_concurrent_conversions == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_CONVERSIONS must be at least 1"
            ));
        }

        if self.processing.conversion_timeout_secs == 0 {
            return Err(anyhow::anyhow!("CONVERSION_TIMEOUT_SECS must be at least 1"));
        }

        if self.storage.backend == StorageBackend::S3
            && (self.storage.s3_bucket.is_none() || self.storage.s3_region.is_none())
        {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=s3 requires S3_BUCKET and S3_REGION (or AWS_REGION)"
            ));
        }

        // An empty account list accepts any credentials.
        if self.is_production()
            && self.storage.backend == StorageBackend::Local
            && self.storage.local_store_accounts.is_empty()
        {
            return Err(anyhow::anyhow!(
                "LOCAL_STORE_ACCOUNTS must be set when running the local store in production"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.base.log_format
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage.backend
    }

    pub fn uploads_dir(&self) -> &PathBuf {
        &self.processing.uploads_dir
    }

    pub fn downloads_dir(&self) -> &PathBuf {
        &self.processing.downloads_dir
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.processing.ffmpeg_path
    }

    pub fn soffice_path(&self) -> &str {
        &self.processing.soffice_path
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.processing.max_upload_size_bytes
    }

    pub fn max_concurrent_conversions(&self) -> usize {
        self.processing.max_concurrent_conversions
    }

    pub fn conversion_timeout_secs(&self) -> u64 {
        self.processing.conversion_timeout_secs
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        self.processing.retention_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accounts() {
        let accounts = parse_accounts("ana:pw1, bruno:pw2").unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts.get("bruno").map(String::as_str), Some("pw2"));

        assert!(parse_accounts("").unwrap().is_empty());
        assert!(parse_accounts("no-separator").is_err());
        assert!(parse_accounts(":secret").is_err());
    }

    #[test]
    fn test_retention_policy_parse() {
        assert_eq!(
            "purge_on_success".parse::<RetentionPolicy>().unwrap(),
            RetentionPolicy::PurgeOnSuccess
        );
        assert_eq!("KEEP".parse::<RetentionPolicy>().unwrap(), RetentionPolicy::Keep);
        assert!("sometimes".parse::<RetentionPolicy>().is_err());
    }

    #[test]
    fn test_for_root_validates() {
        let config = Config::for_root("/tmp/mediaferry");
        assert!(config.validate().is_ok());
        assert!(config.uploads_dir().ends_with("uploads"));
        assert!(!config.is_production());
    }

    #[test]
    fn test_s3_requires_bucket_and_region() {
        let mut config = Config::for_root("/tmp/mediaferry");
        config.storage.backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.storage.s3_bucket = Some("media".to_string());
        config.storage.s3_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_local_store_requires_accounts() {
        let mut config = Config::for_root("/tmp/mediaferry");
        config.base.environment = "Production".to_string();
        assert!(config.is_production());
        assert!(config.validate().is_err());

        config
            .storage
            .local_store_accounts
            .insert("ana".to_string(), "pw".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::for_root("/tmp/mediaferry");
        config.processing.max_concurrent_conversions = 0;
        assert!(config.validate().is_err());
    }
}
