use crate::backend::BackendConfig;
use keepsake_core::{KeepsakeError, KeepsakeResult};
use serde::Deserialize;
use std::path::Path;

/// Per-installation session settings. Immutable once a
/// [`SessionInterface`](crate::SessionInterface) is built from them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Cookie `Domain` attribute; omitted when unset.
    #[serde(default)]
    pub domain: Option<String>,
    /// Seconds until the store record (and a persistent cookie) expires.
    #[serde(default = "default_expiry")]
    pub expiry: u64,
    /// Adds `HttpOnly` to the cookie.
    #[serde(default = "default_httponly")]
    pub httponly: bool,
    /// Name of the client cookie carrying the SID.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Store keys are `prefix + SID`.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Emit non-persistent cookies (no `Max-Age`/`expires`) on writes.
    /// Server-side expiry still applies through the record TTL.
    #[serde(default)]
    pub session_cookie: bool,
}

fn default_expiry() -> u64 {
    2_592_000
}
fn default_httponly() -> bool {
    true
}
fn default_cookie_name() -> String {
    "session".to_string()
}
fn default_prefix() -> String {
    "session:".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            domain: None,
            expiry: default_expiry(),
            httponly: default_httponly(),
            cookie_name: default_cookie_name(),
            prefix: default_prefix(),
            session_cookie: false,
        }
    }
}

impl SessionConfig {
    /// Sets the cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Sets the cookie domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the store key prefix. An empty prefix is allowed.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the expiry in seconds.
    pub fn with_expiry(mut self, expiry: u64) -> Self {
        self.expiry = expiry;
        self
    }

    /// Toggles the `HttpOnly` flag.
    pub fn with_httponly(mut self, httponly: bool) -> Self {
        self.httponly = httponly;
        self
    }

    /// Toggles session-cookie mode.
    pub fn with_session_cookie(mut self, session_cookie: bool) -> Self {
        self.session_cookie = session_cookie;
        self
    }

    /// Rejects settings that would produce unusable cookies or records.
    pub fn validate(&self) -> KeepsakeResult<()> {
        if self.cookie_name.is_empty() {
            return Err(KeepsakeError::Config("cookie_name must not be empty".into()));
        }
        if let Some(bad) = self.cookie_name.chars().find(|c| !is_token_char(*c)) {
            return Err(KeepsakeError::Config(format!(
                "cookie_name '{}' contains invalid character {bad:?}",
                self.cookie_name
            )));
        }
        if self.expiry == 0 {
            return Err(KeepsakeError::Config("expiry must be at least one second".into()));
        }
        if let Some(domain) = &self.domain {
            if domain.is_empty() || domain.chars().any(|c| c == ';' || c.is_ascii_control() || c.is_whitespace()) {
                return Err(KeepsakeError::Config(format!("invalid cookie domain '{domain}'")));
            }
        }
        Ok(())
    }
}

/// RFC 6265 cookie-name characters (an RFC 7230 token).
fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c)
}

/// Complete installation config: session settings plus the backend.
///
/// ```toml
/// [session]
/// cookie_name = "sid"
/// expiry = 3600
///
/// [backend]
/// kind = "file"
/// dir = "./data/sessions"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeepsakeConfig {
    /// Cookie and record settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Which store to build.
    #[serde(default)]
    pub backend: BackendConfig,
}

impl KeepsakeConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> KeepsakeResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.session.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub async fn load(path: impl AsRef<Path>) -> KeepsakeResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            KeepsakeError::Config(format!("Failed to read config file '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.prefix, "session:");
        assert_eq!(config.expiry, 2_592_000);
        assert!(config.httponly);
        assert!(!config.session_cookie);
        assert!(config.domain.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = KeepsakeConfig::from_toml_str("").unwrap();
        assert_eq!(config, KeepsakeConfig::default());
        assert_eq!(config.backend, BackendConfig::Memory);
    }

    #[test]
    fn test_toml_overrides() {
        let config = KeepsakeConfig::from_toml_str(
            r#"
            [session]
            cookie_name = "sid"
            domain = "example.com"
            expiry = 3600
            httponly = false
            prefix = ""
            session_cookie = true

            [backend]
            kind = "file"
            dir = "/var/lib/keepsake"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.session.domain.as_deref(), Some("example.com"));
        assert_eq!(config.session.expiry, 3600);
        assert!(!config.session.httponly);
        assert_eq!(config.session.prefix, "");
        assert!(config.session.session_cookie);
        assert_eq!(
            config.backend,
            BackendConfig::File {
                dir: PathBuf::from("/var/lib/keepsake")
            }
        );
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = KeepsakeConfig::from_toml_str("[backend]\nkind = \"memcache\"\n").unwrap_err();
        assert!(matches!(err, KeepsakeError::Toml(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SessionConfig::default().with_cookie_name("").validate().is_err());
        assert!(SessionConfig::default().with_cookie_name("my session").validate().is_err());
        assert!(SessionConfig::default().with_cookie_name("a;b").validate().is_err());
        assert!(SessionConfig::default().with_expiry(0).validate().is_err());
        assert!(SessionConfig::default().with_domain("").validate().is_err());
        assert!(SessionConfig::default().with_domain("a.com; evil").validate().is_err());
        assert!(SessionConfig::default().with_cookie_name("my.sid").validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("keepsake.toml");
        tokio::fs::write(&path, "[session]\ncookie_name = \"cookie\"\n")
            .await
            .unwrap();

        let config = KeepsakeConfig::load(&path).await.unwrap();
        assert_eq!(config.session.cookie_name, "cookie");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_config_error() {
        let err = KeepsakeConfig::load("/definitely/not/here.toml").await.unwrap_err();
        assert!(matches!(err, KeepsakeError::Config(_)));
    }
}
