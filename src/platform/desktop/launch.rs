use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dioxus::desktop::{Config, LogicalSize, WindowBuilder};

use crate::config::{default_data_dir, AppConfig};
use crate::ui::app::App;

pub const WINDOW_TITLE: &str = "Cadastro de Usuários (ViaCEP + Excel)";

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

fn default_webview_data_dir() -> Result<PathBuf> {
    ensure_webview_data_dir(&default_data_dir()?)
}

pub fn launch(config: AppConfig) {
    let mut desktop_config = Config::new().with_window(
        WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(1100.0, 780.0)),
    );
    match default_webview_data_dir() {
        Ok(dir) => desktop_config = desktop_config.with_data_directory(dir),
        Err(err) => tracing::warn!(error = %format!("{err:#}"), "using default webview data dir"),
    }

    tracing::info!(
        workbook = %config.workbook_path.display(),
        sheet = %config.sheet_name,
        "starting"
    );
    dioxus::LaunchBuilder::desktop()
        .with_cfg(desktop_config)
        .with_context(config)
        .launch(App);
}
