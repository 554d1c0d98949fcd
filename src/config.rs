//! Application configuration loaded from environment variables.

use serde::Deserialize;

use crate::error::Result;

/// OAuth2 token endpoint of the identity provider.
pub const TOKEN_ENDPOINT: &str =
    "https://login.microsoftonline.com/0ae51e19-07c8-4e4b-bb6d-648ee58410f4/oauth2/v2.0/token";

/// Client identifier registered with the identity provider.
pub const CLIENT_ID: &str = "4d8f6526-df32-4870-8afb-9937ba66d739";

/// Scope requested with every token.
pub const TOKEN_SCOPE: &str = "api://dia-brain/.default";

/// Oracle connect descriptor of the authorization database.
pub const DB_CONNECT_DESCRIPTOR: &str = "(DESCRIPTION=(ADDRESS_LIST=(ADDRESS=(PROTOCOL=TCP)(HOST=si0exarac02.de.bosch.com)(PORT=38000)))(CONNECT_DATA=(SERVER=DEDICATED)(SERVICE_NAME=RLDD01_OPS_2.BOSCH.COM)))";

/// Names of the environment variables carrying the base64 secrets.
/// They are matched case-sensitively.
pub const CLIENT_SECRET_VAR: &str = "client_secret";
/// See [`CLIENT_SECRET_VAR`].
pub const USERNAME_VAR: &str = "username";
/// See [`CLIENT_SECRET_VAR`].
pub const PASSWORD_VAR: &str = "password";

/// Application configuration loaded from environment variables.
///
/// The three secrets are not part of this struct; see
/// [`crate::secrets::RawSecrets`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment. `production` switches logging to info-level JSON.
    #[serde(default)]
    pub app_env: Option<String>,

    /// Deadline for outbound token and database calls. Unset means wait forever.
    #[serde(default)]
    pub outbound_timeout_secs: Option<u64>,
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            app_env: None,
            outbound_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from explicit `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be a non-zero port number".to_string());
        }

        if self.outbound_timeout_secs == Some(0) {
            return Err("OUTBOUND_TIMEOUT_SECS must be greater than 0 when set".to_string());
        }

        Ok(())
    }

    /// Whether the service runs in production mode.
    pub fn is_production(&self) -> bool {
        self.app_env.as_deref() == Some("production")
    }

    /// Outbound deadline as a duration.
    pub fn outbound_timeout(&self) -> Option<std::time::Duration> {
        self.outbound_timeout_secs.map(std::time::Duration::from_secs)
    }
}
