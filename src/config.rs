use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_BATCH_DELAY_MS, DEFAULT_CONFIG_PATH, DEFAULT_PREFIX, DEFAULT_REGION,
    DEFAULT_TIMEOUT_SECONDS, ENV_ACCESS_KEY_ID, ENV_ACCESS_KEY_SECRET, ENV_BUCKET, ENV_ENDPOINT,
    ENV_PREFIX, ENV_REGION, ENV_TIMEOUT_SECONDS, STAFF_HEADER_ROW, STUDENT_HEADER_ROW,
};
use crate::error::{Result, RosterError};
use crate::oss::OssCredentials;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub oss: OssConfig,
    pub extract: ExtractConfig,
}

/// Bucket coordinates. Credentials are deliberately absent; see [`credentials_from_env`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OssConfig {
    pub region: String,
    pub bucket: String,
    pub endpoint: Option<String>,
    pub prefix: String,
    pub timeout_seconds: u64,
    pub batch_size: Option<usize>,
    pub batch_delay_ms: u64,
}

impl Default for OssConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            bucket: String::new(),
            endpoint: None,
            prefix: DEFAULT_PREFIX.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            batch_size: None,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
        }
    }
}

impl OssConfig {
    /// Configured endpoint, or the public virtual-hosted one for bucket + region.
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(e) if !e.trim().is_empty() => e.trim().trim_end_matches('/').to_string(),
            _ => format!("https://{}.{}.aliyuncs.com", self.bucket, self.region),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(RosterError::Config(format!(
                "bucket is required (set [oss].bucket or {})",
                ENV_BUCKET
            )));
        }
        if self.region.trim().is_empty() && self.endpoint.is_none() {
            return Err(RosterError::Config(format!(
                "region is required when no endpoint is set (set [oss].region or {})",
                ENV_REGION
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(RosterError::Config("timeout_seconds must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub staff_header_row: usize,
    pub student_header_row: usize,
    pub staff_sheet: Option<String>,
    pub output_dir: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            staff_header_row: STAFF_HEADER_ROW,
            student_header_row: STUDENT_HEADER_ROW,
            staff_sheet: None,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl Config {
    /// Reads `path` (or `roster.toml` if present) and applies `OSS_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Config::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RosterError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_REGION) {
            self.oss.region = v;
        }
        if let Some(v) = get(ENV_BUCKET) {
            self.oss.bucket = v;
        }
        if let Some(v) = get(ENV_ENDPOINT) {
            self.oss.endpoint = Some(v);
        }
        if let Some(v) = get(ENV_PREFIX) {
            self.oss.prefix = v;
        }
        if let Some(v) = get(ENV_TIMEOUT_SECONDS) {
            self.oss.timeout_seconds = v.trim().parse().map_err(|_| {
                RosterError::Config(format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT_SECONDS, v))
            })?;
        }
        Ok(())
    }
}

pub fn credentials_from_env() -> Result<OssCredentials> {
    credentials_from_lookup(|key| std::env::var(key).ok())
}

pub fn credentials_from_lookup<F>(lookup: F) -> Result<OssCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| {
        lookup(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| RosterError::Config(format!("{} is not set", key)))
    };
    Ok(OssCredentials::new(
        required(ENV_ACCESS_KEY_ID)?,
        required(ENV_ACCESS_KEY_SECRET)?,
    ))
}
