//! Runtime mode of the running service.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The mode the service was started in.
///
/// Established once at startup and passed to the components that care
/// about it. Development mode changes the default URL scheme to plain
/// `http` so the login flow works against a local server. Any name other
/// than `development` selects production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RuntimeMode {
    /// Local development.
    Development,
    /// Anything deployed.
    #[default]
    Production,
}

impl RuntimeMode {
    /// Maps a mode name to a mode, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("development") {
            Self::Development
        } else {
            Self::Production
        }
    }

    /// Returns true for development mode.
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the URL scheme used when a caller does not request one.
    #[must_use]
    pub fn default_scheme(&self) -> &'static str {
        match self {
            Self::Development => "http",
            Self::Production => "https",
        }
    }

    /// Returns the mode as a lowercase string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for RuntimeMode {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl FromStr for RuntimeMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}
