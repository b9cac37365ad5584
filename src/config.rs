//! Construction-time configuration.
//!
//! The process environment is read exactly once, here; crypto and codec
//! paths receive explicit values and never touch it. The creator's private
//! key is read-only after construction and is kept out of every `Debug`
//! representation and log line.

use std::env;
use std::fmt;
use std::str::FromStr;

use libsecp256k1::SecretKey;

use crate::crypto;

/// Primary environment variable for the creator's private key.
pub const WALLET_KEY_ENV: &str = "XMTP_WALLET_KEY";

/// Legacy alias checked when [`WALLET_KEY_ENV`] is unset.
pub const WALLET_KEY_ENV_ALIAS: &str = "WALLET_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid private key hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("private key must be exactly 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("invalid private key scalar")]
    InvalidKey(#[from] libsecp256k1::Error),
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),
    #[error("creator private key not set: export {WALLET_KEY_ENV} or {WALLET_KEY_ENV_ALIAS}")]
    MissingKey,
}

/// Deployment environment, selecting the default invite URL base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Dev,
    Local,
}

impl Environment {
    pub fn default_invite_base_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://popup.convos.org/v2",
            Environment::Dev | Environment::Local => "https://dev.convos.org/v2",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "dev" => Ok(Environment::Dev),
            "local" => Ok(Environment::Local),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Parse a 32-byte secp256k1 private key from hex, with or without `0x`.
pub fn parse_private_key(raw: &str) -> Result<SecretKey, ConfigError> {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(stripped)?;
    let array: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ConfigError::InvalidKeyLength(bytes.len()))?;
    Ok(SecretKey::parse(&array)?)
}

/// Configuration for an invite-issuing identity.
#[derive(Clone)]
pub struct InviteConfig {
    creator_private_key: SecretKey,
    pub invite_base_url: Option<String>,
    pub env: Environment,
}

impl InviteConfig {
    pub fn new(creator_private_key: SecretKey) -> Self {
        Self {
            creator_private_key,
            invite_base_url: None,
            env: Environment::default(),
        }
    }

    /// Build from the process environment.
    ///
    /// Reads the creator key from [`WALLET_KEY_ENV`], falling back to
    /// [`WALLET_KEY_ENV_ALIAS`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = env::var(WALLET_KEY_ENV)
            .or_else(|_| env::var(WALLET_KEY_ENV_ALIAS))
            .map_err(|_| ConfigError::MissingKey)?;
        Ok(Self::new(parse_private_key(&raw)?))
    }

    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn with_invite_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.invite_base_url = Some(base_url.into());
        self
    }

    /// The URL prefix placed before `?i=`, override first.
    pub fn invite_base_url(&self) -> &str {
        self.invite_base_url
            .as_deref()
            .unwrap_or_else(|| self.env.default_invite_base_url())
    }

    /// Bind this configuration to the substrate identity it signs for.
    pub fn credentials(&self, inbox_id: impl Into<String>) -> CreatorCredentials {
        CreatorCredentials::new(inbox_id, self.creator_private_key.clone())
    }
}

impl fmt::Debug for InviteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InviteConfig")
            .field("creator_private_key", &"<redacted>")
            .field("invite_base_url", &self.invite_base_url)
            .field("env", &self.env)
            .finish()
    }
}

/// A creator identity: the hex inbox id the substrate assigned and the
/// secp256k1 key that vouches for it.
#[derive(Clone)]
pub struct CreatorCredentials {
    inbox_id: String,
    secret: SecretKey,
}

impl CreatorCredentials {
    pub fn new(inbox_id: impl Into<String>, secret: SecretKey) -> Self {
        Self {
            inbox_id: inbox_id.into(),
            secret,
        }
    }

    pub fn inbox_id(&self) -> &str {
        &self.inbox_id
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// The 65-byte uncompressed public key for this identity.
    pub fn public_key(&self) -> [u8; crypto::UNCOMPRESSED_PUBLIC_KEY_LENGTH] {
        crypto::public_key(&self.secret)
    }
}

impl fmt::Debug for CreatorCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatorCredentials")
            .field("inbox_id", &self.inbox_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
