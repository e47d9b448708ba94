use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    /// S3 mirroring is optional; absent means local-only caching.
    #[serde(default)]
    pub s3: Option<S3Config>,
    #[serde(default)]
    pub bible: BibleConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_days_to_keep")]
    pub days_to_keep: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            days_to_keep: default_days_to_keep(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".lectio-cache")
}
fn default_days_to_keep() -> u32 {
    7
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct BibleConfig {
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for BibleConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
        }
    }
}

fn default_version() -> String {
    "NKJV".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_max_width")]
    pub max_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
        }
    }
}

fn default_max_width() -> usize {
    80
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.cache.days_to_keep == 0 {
        anyhow::bail!("cache.days_to_keep must be > 0");
    }
    if config.display.max_width < 20 {
        anyhow::bail!("display.max_width must be >= 20");
    }
    if let Some(ref s3) = config.s3 {
        if s3.bucket.trim().is_empty() {
            anyhow::bail!("s3.bucket must not be empty");
        }
    }

    Ok(config)
}

/// Load the config file if it exists, otherwise fall back to defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_full_config() {
        let f = write_config(
            r#"
[cache]
dir = "/tmp/lectio"
days_to_keep = 14

[s3]
bucket = "readings"
region = "eu-west-1"
prefix = "cache"
endpoint_url = "http://localhost:9000"

[bible]
version = "ESV"

[display]
max_width = 100
"#,
        );
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.cache.dir, PathBuf::from("/tmp/lectio"));
        assert_eq!(config.cache.days_to_keep, 14);
        let s3 = config.s3.unwrap();
        assert_eq!(s3.bucket, "readings");
        assert_eq!(s3.region, "eu-west-1");
        assert_eq!(s3.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.bible.version, "ESV");
        assert_eq!(config.display.max_width, 100);
    }

    #[test]
    fn test_defaults_applied() {
        let f = write_config("");
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.cache.dir, PathBuf::from(".lectio-cache"));
        assert_eq!(config.cache.days_to_keep, 7);
        assert!(config.s3.is_none());
        assert_eq!(config.bible.version, "NKJV");
        assert_eq!(config.display.max_width, 80);
    }

    #[test]
    fn test_validation() {
        let f = write_config("[cache]\ndays_to_keep = 0\n");
        assert!(load_config(f.path()).is_err());

        let f = write_config("[display]\nmax_width = 5\n");
        assert!(load_config(f.path()).is_err());

        let f = write_config("[s3]\nbucket = \"  \"\n");
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = load_config_or_default(Path::new("/nonexistent/lectio.toml")).unwrap();
        assert_eq!(config.bible.version, "NKJV");
    }
}
