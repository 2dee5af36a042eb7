use crate::db::APP_NAME;
use crate::errors::{AppError, AppResult};
use crate::export::DuplicatePolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the configuration directory (tests, portable installs).
pub const HOME_ENV: &str = "DAYTRACK_HOME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub import_policy: DuplicatePolicy,
    #[serde(default = "default_export_status")]
    pub export_status: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_export_status() -> String {
    "all".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            log_level: default_log_level(),
            import_policy: DuplicatePolicy::default(),
            export_status: default_export_status(),
        }
    }
}

impl Config {
    /// Standard configuration directory: `$DAYTRACK_HOME`, else the platform
    /// config dir, else `~/.daytrack`.
    pub fn config_dir() -> PathBuf {
        if let Ok(dir) = env::var(HOME_ENV)
            && !dir.is_empty()
        {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .map(|d| d.join(APP_NAME))
            .or_else(|| dirs::home_dir().map(|h| h.join(format!(".{APP_NAME}"))))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_NAME))
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join(format!("{APP_NAME}.conf"))
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join(format!("{APP_NAME}.sqlite"))
    }

    /// Load the configuration file, or defaults when there is none.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Write the configuration file (unless `is_test`) and return the
    /// database path it points to. Relative `custom_db` names land in the
    /// config directory.
    pub fn init_all(custom_db: Option<&str>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = match custom_db {
            Some(name) if Path::new(name).is_absolute() => PathBuf::from(name),
            Some(name) => dir.join(name),
            None => Self::database_file(),
        };

        if !is_test {
            let config = Config {
                database: db_path.to_string_lossy().to_string(),
                ..Self::load()?
            };
            config.save_to(&Self::config_file())?;
        }
        Ok(db_path)
    }

    /// Names of the top-level keys missing from the file on disk.
    pub fn missing_fields(path: &Path) -> AppResult<Vec<&'static str>> {
        let content = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&content)?;
        let map = value
            .as_mapping()
            .ok_or_else(|| AppError::Config("configuration root must be a mapping".into()))?;
        Ok(["database", "log_level", "import_policy", "export_status"]
            .into_iter()
            .filter(|k| !map.contains_key(*k))
            .collect())
    }
}
