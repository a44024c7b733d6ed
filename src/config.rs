use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::transport::{Builder, Credentials, NtlmTransport};


/// Settings for fetching a resource from an NTLM-protected server.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Config {
    pub url: String,
    pub username: String,
    pub domain: String,

    /// If missing, the password has to be obtained some other way, e.g. by asking the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// The NT hostname announced in the Authenticate message.
    #[serde(default)]
    pub local_hostname: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default = "default_cookies")]
    pub cookies: bool,
}

fn default_cookies() -> bool {
    true
}


#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e)
                => write!(f, "failed to read configuration: {}", e),
            Self::Parse(e)
                => write!(f, "failed to parse configuration: {}", e),
        }
    }
}
impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}


impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_string = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;
        config_string.parse()
    }

    /// Combines the configured identity with the given password.
    pub fn credentials<P: Into<String>>(&self, password: P) -> Credentials {
        Credentials::new(
            self.domain.clone(),
            self.username.clone(),
            password,
        )
    }

    /// A transport builder preset with everything but the password source.
    pub fn transport_builder<P: Into<String>>(&self, password: P) -> Builder {
        let mut builder = NtlmTransport::builder(self.credentials(password))
            .workstation(self.local_hostname.clone())
            .cookie_store(self.cookies);
        if let Some(user_agent) = self.user_agent.as_ref() {
            builder = builder.user_agent(user_agent.clone());
        }
        builder
    }
}
impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
            .map_err(ConfigError::Parse)
    }
}
