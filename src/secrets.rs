//! Startup decoding of the base64 secrets.
//!
//! The deployment hands the client secret and the database login over as
//! base64 strings. They are decoded exactly once, before the server starts,
//! into a [`Credentials`] value that is shared read-only afterwards.
//!
//! Decoding is deliberately forgiving: a missing variable decodes the text
//! `undefined`, and malformed input yields whatever bytes the valid characters
//! spell out instead of an error.

use std::fmt;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::config::{CLIENT_SECRET_VAR, PASSWORD_VAR, USERNAME_VAR};

/// Placeholder decoded when a variable is not set.
pub const MISSING_PLACEHOLDER: &str = "undefined";

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Decode base64 text without ever failing.
///
/// Characters outside the alphabet are skipped, `-` and `_` are read as `+`
/// and `/`, input ends at the first `=`, and a lone trailing character is
/// dropped. Invalid UTF-8 in the result is replaced.
pub fn decode_lenient(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .take_while(|c| *c != '=')
        .filter_map(|c| match c {
            '-' => Some('+'),
            '_' => Some('/'),
            c if c.is_ascii_alphanumeric() || c == '+' || c == '/' => Some(c),
            _ => None,
        })
        .collect();

    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }

    let bytes = LENIENT.decode(cleaned.as_bytes()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Decode an optional variable, substituting the placeholder when absent.
pub fn decode_or_placeholder(raw: Option<&str>) -> String {
    decode_lenient(raw.unwrap_or(MISSING_PLACEHOLDER))
}

/// Undecoded secret values as found in the environment.
#[derive(Clone, Default)]
pub struct RawSecrets {
    /// Base64 OAuth2 client secret.
    pub client_secret: Option<String>,
    /// Base64 database user.
    pub username: Option<String>,
    /// Base64 database password.
    pub password: Option<String>,
}

impl RawSecrets {
    /// Read the secrets from the process environment by their exact names.
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
        };

        Self {
            client_secret: read(CLIENT_SECRET_VAR),
            username: read(USERNAME_VAR),
            password: read(PASSWORD_VAR),
        }
    }
}

impl fmt::Debug for RawSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSecrets")
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username.as_ref().map(|_| "<redacted>"))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Decoded credentials, immutable for the lifetime of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_secret: String,
    username: String,
    password: String,
}

impl Credentials {
    /// Decode all three secrets.
    pub fn decode(raw: &RawSecrets) -> Self {
        Self {
            client_secret: decode_or_placeholder(raw.client_secret.as_deref()),
            username: decode_or_placeholder(raw.username.as_deref()),
            password: decode_or_placeholder(raw.password.as_deref()),
        }
    }

    /// Build from already-decoded values.
    pub fn new(
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// OAuth2 client secret.
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Database user.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Database password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_secret", &"<redacted>")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}
