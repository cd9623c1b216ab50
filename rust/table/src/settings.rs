use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_ENV: &str = "XIDACH_CONFIG";
pub const SEED_ENV: &str = "XIDACH_SEED";
pub const MAX_PARTICIPANTS_ENV: &str = "XIDACH_MAX_PARTICIPANTS";
pub const LOG_ENV: &str = "XIDACH_LOG";

/// Hard ceiling on players at one table, dealer not included.
pub const TABLE_CAPACITY: usize = 5;

pub const DEFAULT_LOG_FILTER: &str = "info,xidach_table=debug";

/// Table configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSettings {
    /// Players allowed in one lobby (1-5)
    pub max_participants: usize,
    /// Fixed shuffle seed; `None` draws a fresh seed for every game
    pub seed: Option<u64>,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            max_participants: TABLE_CAPACITY,
            seed: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl TableSettings {
    /// Validate settings values
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_participants == 0 || self.max_participants > TABLE_CAPACITY {
            return Err(SettingsError::InvalidValue(format!(
                "max_participants must be between 1 and {TABLE_CAPACITY}"
            )));
        }

        if self.log_filter.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "log_filter cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsSources {
    pub max_participants: ValueSource,
    pub seed: ValueSource,
    pub log_filter: ValueSource,
}

impl Default for SettingsSources {
    fn default() -> Self {
        Self {
            max_participants: ValueSource::Default,
            seed: ValueSource::Default,
            log_filter: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: TableSettings,
    pub sources: SettingsSources,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    #[serde(default)]
    max_participants: Option<usize>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    log_filter: Option<String>,
}

pub fn load() -> Result<TableSettings, SettingsError> {
    load_with_sources().map(|resolved| resolved.settings)
}

/// Defaults, then the TOML file named by `XIDACH_CONFIG`, then the
/// individual environment variables. Later layers win.
pub fn load_with_sources() -> Result<ResolvedSettings, SettingsError> {
    let path = non_empty_env(CONFIG_ENV);
    load_layers(path.as_deref().map(Path::new))
}

/// Same as [`load_with_sources`] but with an explicit file, e.g. from a
/// command-line flag. The environment still overrides the file.
pub fn load_from_file(path: &Path) -> Result<ResolvedSettings, SettingsError> {
    load_layers(Some(path))
}

fn load_layers(path: Option<&Path>) -> Result<ResolvedSettings, SettingsError> {
    let mut settings = TableSettings::default();
    let mut sources = SettingsSources::default();

    if let Some(path) = path {
        let text = fs::read_to_string(path)?;
        let file: FileSettings = toml::from_str(&text)?;
        if let Some(v) = file.max_participants {
            settings.max_participants = v;
            sources.max_participants = ValueSource::File;
        }
        if let Some(v) = file.seed {
            settings.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = file.log_filter {
            settings.log_filter = v;
            sources.log_filter = ValueSource::File;
        }
    }

    if let Some(seed) = non_empty_env(SEED_ENV) {
        settings.seed = Some(
            seed.parse()
                .map_err(|_| SettingsError::InvalidValue(format!("{SEED_ENV}: invalid seed")))?,
        );
        sources.seed = ValueSource::Env;
    }
    if let Some(max) = non_empty_env(MAX_PARTICIPANTS_ENV) {
        settings.max_participants = max.parse().map_err(|_| {
            SettingsError::InvalidValue(format!("{MAX_PARTICIPANTS_ENV}: not a number"))
        })?;
        sources.max_participants = ValueSource::Env;
    }
    if let Some(filter) = non_empty_env(LOG_ENV) {
        settings.log_filter = filter;
        sources.log_filter = ValueSource::Env;
    }

    settings.validate()?;
    Ok(ResolvedSettings { settings, sources })
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
