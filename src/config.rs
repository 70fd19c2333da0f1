use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::Level;

use crate::infra::viacep::client::{DEFAULT_TIMEOUT, DEFAULT_URL_TEMPLATE};

pub const CONFIG_FILE: &str = "cadastro.toml";
pub const DEFAULT_WORKBOOK_FILE: &str = "cadastros.xlsx";
pub const DEFAULT_SHEET_NAME: &str = "usuarios";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub workbook_path: PathBuf,
    pub sheet_name: String,
    pub lookup_url_template: String,
    pub lookup_timeout: Duration,
    pub log_level: Level,
}

impl Default for AppConfig {
    fn default() -> Self {
        let workbook_path = default_data_dir()
            .map(|dir| dir.join(DEFAULT_WORKBOOK_FILE))
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_WORKBOOK_FILE));
        Self {
            workbook_path,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            lookup_url_template: DEFAULT_URL_TEMPLATE.to_string(),
            lookup_timeout: DEFAULT_TIMEOUT,
            log_level: Level::INFO,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    workbook: Option<PathBuf>,
    sheet: Option<String>,
    cep_url: Option<String>,
    cep_timeout_secs: Option<u64>,
    log: Option<String>,
}

pub fn default_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("br", "cadastro", "cadastro")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().to_path_buf())
}

impl AppConfig {
    /// Defaults, then `cadastro.toml` in the working directory, then `CADASTRO_*`
    /// environment variables.
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_file(Path::new(CONFIG_FILE));
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn apply_file(&mut self, path: &Path) {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return;
        };
        match toml::from_str::<FileConfig>(&raw) {
            Ok(file) => self.merge(file),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config file")
            }
        }
    }

    fn merge(&mut self, file: FileConfig) {
        if let Some(v) = file.workbook {
            self.workbook_path = v;
        }
        if let Some(v) = file.sheet {
            self.sheet_name = v;
        }
        if let Some(v) = file.cep_url {
            self.lookup_url_template = v;
        }
        if let Some(v) = file.cep_timeout_secs {
            self.lookup_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.log {
            self.set_log_level(&v);
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("CADASTRO_WORKBOOK") {
            self.workbook_path = PathBuf::from(v);
        }
        if let Some(v) = var("CADASTRO_SHEET") {
            self.sheet_name = v;
        }
        if let Some(v) = var("CADASTRO_CEP_URL") {
            self.lookup_url_template = v;
        }
        if let Some(v) = var("CADASTRO_CEP_TIMEOUT_SECS") {
            match v.parse::<u64>() {
                Ok(secs) => self.lookup_timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %v, "ignoring invalid CADASTRO_CEP_TIMEOUT_SECS"),
            }
        }
        if let Some(v) = var("CADASTRO_LOG") {
            self.set_log_level(&v);
        }
    }

    fn set_log_level(&mut self, value: &str) {
        match Level::from_str(value.trim()) {
            Ok(level) => self.log_level = level,
            Err(_) => tracing::warn!(value, "ignoring invalid log level"),
        }
    }
}
