use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::PathBuf;
use tilth_core::models::RecurrenceConfig;
use uuid::Uuid;

/// CLI configuration, layered from `tilth.toml` and `TILTH_*` variables.
///
/// Nested keys use a double underscore in the environment, e.g.
/// `TILTH_RECURRENCE__WINDOW_DAYS=90`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// Plan used when `--plan` is not given
    pub default_plan_id: Uuid,
    pub recurrence: RecurrenceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("tilth.db"),
            default_plan_id: Uuid::nil(),
            recurrence: RecurrenceConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("tilth.toml"))
            .merge(Env::prefixed("TILTH_").split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::new()?;
            assert_eq!(config, Config::default());
            assert_eq!(config.recurrence.window_days, 180);
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "tilth.toml",
                r#"
                    database_path = "garden.db"

                    [recurrence]
                    window_days = 30
                    horizon_years = 2
                "#,
            )?;
            jail.set_env("TILTH_RECURRENCE__WINDOW_DAYS", "7");

            let config = Config::new()?;
            assert_eq!(config.database_path, PathBuf::from("garden.db"));
            assert_eq!(config.recurrence.window_days, 7);
            assert_eq!(config.recurrence.horizon_years, 2);
            assert_eq!(config.recurrence.listing_days, 365);
            Ok(())
        });
    }
}
