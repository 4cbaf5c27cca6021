use crate::config::SessionConfig;
use chrono::{DateTime, TimeDelta, Utc};
use http::header::{HeaderMap, HeaderValue, COOKIE};
use keepsake_core::{KeepsakeError, KeepsakeResult};

/// Session cookies are scoped to the whole site.
pub const COOKIE_PATH: &str = "/";

/// Formats a timestamp in the cookie `expires` style,
/// e.g. `Sun, 02-Apr-2017 21:27:42 GMT`.
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d-%b-%Y %H:%M:%S GMT").to_string()
}

/// `Thu, 01-Jan-1970 00:00:00 GMT`, the `expires` of a delete cookie.
pub fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Attributes of one outgoing session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Always the SID.
    pub value: String,
    /// `Domain` attribute, if configured.
    pub domain: Option<String>,
    /// `HttpOnly` flag.
    pub http_only: bool,
    /// `Path` attribute.
    pub path: &'static str,
    /// `Max-Age` in seconds; `None` for a browser-session cookie.
    pub max_age: Option<u64>,
    /// `expires` timestamp; `None` for a browser-session cookie.
    pub expires: Option<DateTime<Utc>>,
}

impl SessionCookie {
    /// The cookie sent after a store write. In session-cookie mode it carries
    /// no lifetime; otherwise it lives for `config.expiry` seconds from `now`.
    pub fn issue(sid: &str, config: &SessionConfig, now: DateTime<Utc>) -> Self {
        let (max_age, expires) = if config.session_cookie {
            (None, None)
        } else {
            let expires = i64::try_from(config.expiry)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            (Some(config.expiry), Some(expires))
        };
        Self {
            max_age,
            expires,
            ..Self::base(sid, config)
        }
    }

    /// The cookie that makes the browser drop the session immediately.
    /// Carries `Max-Age=0` and an epoch `expires` in every mode.
    pub fn expire(sid: &str, config: &SessionConfig) -> Self {
        Self {
            max_age: Some(0),
            expires: Some(unix_epoch()),
            ..Self::base(sid, config)
        }
    }

    fn base(sid: &str, config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value: sid.to_string(),
            domain: config.domain.clone(),
            http_only: config.httponly,
            path: COOKIE_PATH,
            max_age: None,
            expires: None,
        }
    }

    /// True for the delete form.
    pub fn is_removal(&self) -> bool {
        self.max_age == Some(0)
    }

    /// Renders the `Set-Cookie` header value.
    pub fn to_header_string(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(expires) = self.expires {
            out.push_str("; expires=");
            out.push_str(&format_http_date(expires));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={max_age}"));
        }
        out.push_str("; Path=");
        out.push_str(self.path);
        out
    }

    /// Renders the cookie as a header value.
    pub fn to_header_value(&self) -> KeepsakeResult<HeaderValue> {
        HeaderValue::from_str(&self.to_header_string())
            .map_err(|e| KeepsakeError::Session(format!("Invalid Set-Cookie value: {e}")))
    }
}

/// Returns the value of the first non-empty cookie called `name` across all
/// `Cookie` headers. Malformed pairs and empty values are skipped.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(::cookie::Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}
