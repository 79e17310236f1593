use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from `config/Config.toml`, `COT_` environment
    /// variables and `config/Config.json`, on top of built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads configuration using a specific TOML file as the base layer.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let config: AppConfig = Self::base()
            .merge(Toml::file(path.as_ref()))
            .merge(Self::env())
            .join(Json::file("config/Config.json"))
            .extract()?;

        tracing::debug!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(config)
    }

    /// Loads application configuration with a specific profile.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        let config: AppConfig = Self::base()
            .merge(Toml::file("config/Config.toml"))
            .merge(Toml::file(format!("config/Config.{profile}.toml")))
            .merge(Self::env())
            .join(Json::file("config/Config.json"))
            .extract()?;

        tracing::debug!(profile, "Configuration loaded");
        Ok(config)
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }

    /// `COT_SECTION__KEY` variables plus the conventional `SODA_APP_TOKEN`.
    fn env() -> Figment {
        Figment::new()
            .merge(Env::prefixed("COT_").split("__"))
            .merge(
                Env::raw()
                    .only(&["SODA_APP_TOKEN"])
                    .map(|_| "source.app_token".into()),
            )
    }
}
