//! Input validation that runs before any cache state is touched.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::reference::{Kind, Reference};
use core::fmt;

/// Non-fatal diagnostic: the cache is pointless for this kind of input
/// because primitives are already compared by value downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    String,
    Number,
}

impl Advisory {
    fn kind(self) -> Kind {
        match self {
            Advisory::String => Kind::String,
            Advisory::Number => Kind::Number,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind().name();
        write!(
            f,
            "You passed in a {name} to `PreserveReference`. You don't need `PreserveReference` for {name}s."
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InputGuard {
    production_mode: bool,
}

impl InputGuard {
    pub fn new(config: &Config) -> Self {
        Self {
            production_mode: config.production_mode,
        }
    }

    /// Classify without side effects: reject callables, and outside
    /// production mode report an advisory for strings and numbers.
    pub fn classify<T: Reference>(&self, value: &T) -> Result<Option<Advisory>> {
        let advisory = match value.kind() {
            Kind::Function => return Err(Error::UnsupportedType),
            _ if self.production_mode => None,
            Kind::String => Some(Advisory::String),
            Kind::Number => Some(Advisory::Number),
            _ => None,
        };
        Ok(advisory)
    }

    /// Like [`classify`](Self::classify), but writes the advisory to the
    /// warning channel. One warning per offending call.
    pub fn check<T: Reference>(&self, value: &T) -> Result<()> {
        if let Some(advisory) = self.classify(value)? {
            tracing::warn!("{}", advisory);
        }
        Ok(())
    }
}
