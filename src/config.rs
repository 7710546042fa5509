use crate::error::{AbacusError, AbacusResult};
use crate::history::HistoryOptions;
use crate::{CONFIG_FILE, DEFAULT_MAX_HISTORY_SIZE, DEFAULT_PRECISION, HISTORY_FILE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Environment variable overriding `history.file`
pub const HISTORY_FILE_ENV: &str = "ABACUS_HISTORY_FILE";

const AUDIT_FILE: &str = "audit.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub calculator: CalculatorConfig,
    pub logging: LoggingConfig,
    pub repl: ReplConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Defaults to `history.json` under `paths.data_dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub max_size: usize,
    pub auto_save: bool,
    pub load_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub precision: u32,
    pub max_input_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub audit: bool,
    /// Defaults to `audit.log` under `paths.data_dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    pub prompt: String,
    pub operand_prompt: String,
    pub save_on_exit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            calculator: CalculatorConfig::default(),
            logging: LoggingConfig::default(),
            repl: ReplConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file: None,
            max_size: DEFAULT_MAX_HISTORY_SIZE,
            auto_save: true,
            load_on_start: true,
        }
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            max_input_value: Decimal::from(1_000_000_000_000_000i64),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            audit: true,
            audit_file: None,
        }
    }
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "abacus> ".to_string(),
            operand_prompt: "  > ".to_string(),
            save_on_exit: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_dir: dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("abacus"),
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("abacus"),
        }
    }
}

impl Config {
    /// Load configuration from file or fall back to defaults
    pub async fn load(config_path: Option<&Path>) -> AbacusResult<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_file(),
        };

        let mut config = if config_file.exists() {
            let content = fs::read_to_string(&config_file).await?;
            toml::from_str::<Config>(&content)
                .map_err(|e| AbacusError::config(format!("Failed to parse config: {}", e)))?
        } else if config_path.is_some() {
            return Err(AbacusError::config(format!(
                "Config file not found: {}",
                config_file.display()
            )));
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `ABACUS_HISTORY_FILE` when it is set to a non-blank value
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(HISTORY_FILE_ENV) {
            self.override_history_file(path);
        }
    }

    /// Point the history store at `path`. Blank values are ignored.
    pub fn override_history_file<P: Into<PathBuf>>(&mut self, path: P) {
        let path = path.into();
        if path.as_os_str().to_string_lossy().trim().is_empty() {
            return;
        }
        self.history.file = Some(path);
    }

    /// Save configuration to file
    pub async fn save(&self, config_path: Option<&Path>) -> AbacusResult<()> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => self.paths.config_dir.join(CONFIG_FILE),
        };

        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AbacusError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_file, content).await?;
        Ok(())
    }

    /// Write a default configuration file, refusing to clobber one unless forced
    pub async fn init(&self, force: bool) -> AbacusResult<PathBuf> {
        let config_file = self.paths.config_dir.join(CONFIG_FILE);

        if config_file.exists() && !force {
            return Err(AbacusError::config(
                "Configuration file already exists. Use --force to overwrite.",
            ));
        }

        self.save(Some(&config_file)).await?;
        Ok(config_file)
    }

    pub fn validate(&self) -> AbacusResult<()> {
        if self.calculator.precision > 28 {
            return Err(AbacusError::config(format!(
                "calculator.precision must be at most 28, got {}",
                self.calculator.precision
            )));
        }
        if self.calculator.max_input_value <= Decimal::ZERO {
            return Err(AbacusError::config("calculator.max_input_value must be positive"));
        }
        Ok(())
    }

    /// History store path with `~` and environment variables expanded
    pub fn history_file(&self) -> PathBuf {
        match &self.history.file {
            Some(file) => expand_path(file),
            None => expand_path(&self.paths.data_dir).join(HISTORY_FILE),
        }
    }

    pub fn audit_file(&self) -> PathBuf {
        match &self.logging.audit_file {
            Some(file) => expand_path(file),
            None => expand_path(&self.paths.data_dir).join(AUDIT_FILE),
        }
    }

    pub fn history_options(&self) -> HistoryOptions {
        HistoryOptions {
            max_size: self.history.max_size,
            precision: self.calculator.precision,
            max_input_value: self.calculator.max_input_value,
        }
    }

    fn default_config_file() -> PathBuf {
        PathsConfig::default().config_dir.join(CONFIG_FILE)
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => path.to_path_buf(),
    }
}
