//! Configuration for a [`PreserveReference`](crate::PreserveReference) instance.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Environment variable read by [`Config::from_env`].
pub const ENV_VAR: &str = "PRESERVE_REFERENCE_ENV";

/// Value of [`ENV_VAR`] that selects production mode.
pub const PRODUCTION: &str = "production";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Suppress the advisories emitted for string and number inputs.
    #[serde(default = "default_production_mode")]
    pub production_mode: bool,
}

fn default_production_mode() -> bool {
    !cfg!(debug_assertions)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            production_mode: default_production_mode(),
        }
    }
}

impl Config {
    pub const fn production() -> Self {
        Self {
            production_mode: true,
        }
    }

    pub const fn development() -> Self {
        Self {
            production_mode: false,
        }
    }

    /// Read the mode from [`ENV_VAR`].
    pub fn from_env() -> Result<Self> {
        match std::env::var(ENV_VAR) {
            Ok(v) => Ok(Self::from_env_value(Some(&v))),
            Err(std::env::VarError::NotPresent) => Ok(Self::from_env_value(None)),
            Err(e) => Err(Error::Config(format!("{ENV_VAR}: {e}"))),
        }
    }

    /// `"production"` selects production mode, any other non-empty value
    /// selects development, unset or empty falls back to the default.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::default(),
            Some(v) => Self {
                production_mode: v == PRODUCTION,
            },
        }
    }
}
