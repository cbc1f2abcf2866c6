// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, BinanceSettings, LiveSettings, RunSettings, Settings, WindowSettings};

/// Loads the application settings from the `config/` directory.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
///
/// The result is validated before it is returned.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());
    load_settings_from(Path::new("config"), &environment)
}

/// Same as [`load_settings`] with an explicit directory and environment name.
pub fn load_settings_from(config_dir: &Path, environment: &str) -> Result<Settings> {
    let settings = Config::builder()
        // 1. Load the base configuration file.
        .add_source(File::with_name(&config_dir.join("base").to_string_lossy()))
        // 2. Load the environment-specific configuration file.
        .add_source(File::with_name(&config_dir.join(environment).to_string_lossy()).required(false))
        // 3. Load settings from environment variables (e.g., `APP_RUN__INITIAL_CASH=...`).
        // The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").prefix_separator("_").separator("__"))
        .build()?;

    // Deserialize the configuration into our `Settings` struct.
    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;

    const BASE: &str = r#"
[app]
environment = "test"
log_level = "debug"

[binance]
rest_base_url = "https://api.binance.com"

[run]
buy_fraction_of_cash = 0.5
minimum_trade_notional = 10
initial_cash = 1000

[strategy]
name = "threshold_recovery"

[live]
symbol = "BTCUSDT"

[windows]
window_len = 30
step = 15
simulations = 500
seed = 7
"#;

    #[test]
    fn loads_layered_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.toml"), BASE).unwrap();
        fs::write(
            dir.path().join("grid.toml"),
            "[strategy]\nname = \"grid\"\nparams = { grid_size = 0.05, max_levels = 20, max_drawdown = 1.0 }\n",
        )
        .unwrap();

        let base = load_settings_from(dir.path(), "missing").unwrap();
        assert_eq!(base.run.initial_cash, dec!(1000));
        assert_eq!(base.run.buy_fraction_of_cash, dec!(0.5));
        assert_eq!(base.strategy.name, "threshold_recovery");
        assert_eq!(base.live.poll_interval_secs, 60);
        assert_eq!(base.binance.request_timeout_secs, 10);

        let grid = load_settings_from(dir.path(), "grid").unwrap();
        assert_eq!(grid.strategy.name, "grid");
        assert_eq!(grid.windows.seed, 7);
    }

    #[test]
    fn invalid_strategy_params_fail_at_load_time() {
        let dir = tempfile::tempdir().unwrap();
        let bad = BASE.replace(
            "name = \"threshold_recovery\"",
            "name = \"threshold_recovery\"\nparams = { buy_threshold = 0 }",
        );
        fs::write(dir.path().join("base.toml"), bad).unwrap();
        let err = load_settings_from(dir.path(), "development").unwrap_err();
        assert!(matches!(err, Error::Strategy(_)));
    }

    #[test]
    fn profile_switching_strategy_does_not_inherit_foreign_params() {
        let dir = tempfile::tempdir().unwrap();
        let base = BASE.replace(
            "name = \"threshold_recovery\"",
            "name = \"threshold_recovery\"\nparams = { buy_threshold = 0.05, max_drawdown = 0.30 }",
        );
        fs::write(dir.path().join("base.toml"), base).unwrap();
        fs::write(
            dir.path().join("grid.toml"),
            "[strategy]\nname = \"grid\"\nparams = { grid_size = 0.05 }\n",
        )
        .unwrap();

        // The merged table still carries `buy_threshold`, which grid refuses.
        let err = load_settings_from(dir.path(), "grid").unwrap_err();
        assert!(matches!(err, Error::Strategy(_)));
    }

    #[test]
    fn missing_base_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_settings_from(dir.path(), "development"), Err(Error::LoadError(_))));
    }
}
