mod config;
mod domain;
mod infra;
mod platform;
mod ui;
mod usecase;

#[cfg(test)]
mod tests;

use config::AppConfig;

fn main() {
    let config = AppConfig::load();
    if let Err(err) = dioxus::logger::init(config.log_level) {
        eprintln!("failed to initialize logger: {err}");
    }

    platform::desktop::launch::launch(config);
}
