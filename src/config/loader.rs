//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered with the
//! `config` crate, later sources overriding earlier ones:
//!
//! 1. the base TOML file (`standings.toml`)
//! 2. an optional environment overlay next to it (`standings.<env>.toml`)
//! 3. `STANDINGS__<SECTION>__<KEY>` environment variables

use super::error::{ConfigResult, ConfigurationError};
use super::StandingsConfig;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const ENV_PREFIX: &str = "STANDINGS";
const ENV_SEPARATOR: &str = "__";

/// Loaded, validated configuration plus the context it was loaded from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: StandingsConfig,
    environment: String,
    source_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from a base file with explicit environment
    pub fn load_from_file(
        path: impl AsRef<Path>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigurationError::config_file_not_found(path));
        }

        let overlay = Self::overlay_path(path, environment);
        debug!(
            base = %path.display(),
            overlay = %overlay.display(),
            environment = environment,
            "Loading standings configuration"
        );

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(config::File::from(overlay.as_path()).required(false))
            .add_source(Self::environment_source())
            .build()
            .map_err(|e| ConfigurationError::load_error(path.display().to_string(), e))?;

        let config: StandingsConfig = settings
            .try_deserialize()
            .map_err(|e| ConfigurationError::load_error(path.display().to_string(), e))?;

        Self::finish(config, environment, Some(path.to_path_buf()))
    }

    /// Load defaults overridden only by environment variables
    pub fn load_from_env() -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();

        let settings = config::Config::builder()
            .add_source(Self::environment_source())
            .build()
            .map_err(|e| ConfigurationError::load_error("environment", e))?;

        let config: StandingsConfig = settings
            .try_deserialize()
            .map_err(|e| ConfigurationError::load_error("environment", e))?;

        Self::finish(config, &environment, None)
    }

    /// Wrap an already constructed configuration, validating it first
    pub fn from_config(config: StandingsConfig) -> ConfigResult<Arc<ConfigManager>> {
        Self::finish(config, &Self::detect_environment(), None)
    }

    pub fn config(&self) -> &StandingsConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Current environment from `STANDINGS_ENV`, falling back to `development`
    pub fn detect_environment() -> String {
        env::var("STANDINGS_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    /// `config/standings.toml` + `test` -> `config/standings.test.toml`
    fn overlay_path(base: &Path, environment: &str) -> PathBuf {
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("standings");
        let extension = base
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("toml");
        base.with_file_name(format!("{stem}.{environment}.{extension}"))
    }

    fn environment_source() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }

    fn finish(
        config: StandingsConfig,
        environment: &str,
        source_path: Option<PathBuf>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;

        info!(
            environment = environment,
            concurrency = config.queue.concurrency,
            job_timeout_ms = config.queue.job_timeout_ms,
            max_retries = config.queue.max_retries,
            triggers_enabled = config.triggers.enabled,
            "🔧 Standings configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            source_path,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_overlay_path_naming() {
        let overlay = ConfigManager::overlay_path(Path::new("config/standings.toml"), "test");
        assert_eq!(overlay, PathBuf::from("config/standings.test.toml"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = ConfigManager::load_from_file("/definitely/not/here.toml", "test").unwrap_err();
        assert!(matches!(err, ConfigurationError::ConfigFileNotFound { .. }));
    }

    #[test]
    fn test_environment_overlay_overrides_base() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_file(
            dir.path(),
            "standings.toml",
            "[queue]\nconcurrency = 4\nmax_retries = 5\n",
        );
        write_file(dir.path(), "standings.staging.toml", "[queue]\nconcurrency = 7\n");

        let manager = ConfigManager::load_from_file(&base, "staging").unwrap();
        assert_eq!(manager.config().queue.concurrency, 7);
        assert_eq!(manager.config().queue.max_retries, 5);
        assert_eq!(manager.environment(), "staging");
        assert_eq!(manager.source_path(), Some(base.as_path()));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_file(dir.path(), "standings.toml", "[queue]\nconcurrency = 0\n");
        let err = ConfigManager::load_from_file(&base, "test").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    }
}
