//! `Set-Cookie` relay from backend responses to the client.
//!
//! Each `Set-Cookie` instance is parsed into its attributes and emitted again
//! on the client response. Attributes the backend sent are kept with their
//! values. Nothing is added: a cookie without `Secure` stays without it, even
//! with `SameSite=None`.

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};

/// The attributes of one `Set-Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieAttributes {
    /// Cookie name.
    pub name: String,
    /// Cookie value, verbatim (quotes included).
    pub value: String,
    /// `HttpOnly` flag.
    pub http_only: bool,
    /// `Secure` flag.
    pub secure: bool,
    /// `SameSite` value as sent (`Strict`, `Lax`, `None`).
    pub same_site: Option<String>,
    /// `Path` value.
    pub path: Option<String>,
    /// `Max-Age` in seconds.
    pub max_age: Option<i64>,
    /// `Domain` value, verbatim.
    pub domain: Option<String>,
    /// `Expires` value, verbatim.
    pub expires: Option<String>,
    /// Any other attributes (e.g. `Partitioned`, `Priority=High`), verbatim.
    pub extensions: Vec<String>,
}

impl CookieAttributes {
    /// Parse one `Set-Cookie` header value.
    ///
    /// Returns `None` if there is no `name=value` pair or the name is empty.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Self {
            name: name.to_string(),
            value: value.trim().to_string(),
            ..Self::default()
        };

        for attr in parts {
            let attr = attr.trim();
            if attr.is_empty() {
                continue;
            }
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (attr, None),
            };
            match (key.to_ascii_lowercase().as_str(), val) {
                ("httponly", _) => cookie.http_only = true,
                ("secure", _) => cookie.secure = true,
                ("samesite", Some(v)) => cookie.same_site = Some(v.to_string()),
                ("path", Some(v)) => cookie.path = Some(v.to_string()),
                ("domain", Some(v)) => cookie.domain = Some(v.to_string()),
                ("expires", Some(v)) => cookie.expires = Some(v.to_string()),
                ("max-age", Some(v)) => match v.parse() {
                    Ok(seconds) => cookie.max_age = Some(seconds),
                    Err(_) => cookie.extensions.push(attr.to_string()),
                },
                _ => cookie.extensions.push(attr.to_string()),
            }
        }

        Some(cookie)
    }

    /// Render as a `Set-Cookie` header value.
    #[must_use]
    pub fn to_header_string(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(expires) = &self.expires {
            out.push_str("; Expires=");
            out.push_str(expires);
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={max_age}"));
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = &self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site);
        }
        for ext in &self.extensions {
            out.push_str("; ");
            out.push_str(ext);
        }
        out
    }
}

/// Copy every `Set-Cookie` from `backend` onto `client`.
///
/// Returns the number of cookies relayed. Headers that cannot be parsed or
/// re-encoded are dropped with a warning.
pub fn relay(backend: &HeaderMap, client: &mut HeaderMap) -> usize {
    let mut relayed = 0;
    for raw in backend.get_all(SET_COOKIE) {
        let Some(cookie) = raw.to_str().ok().and_then(CookieAttributes::parse) else {
            tracing::warn!("Dropping unparseable Set-Cookie header from backend");
            continue;
        };
        match HeaderValue::from_str(&cookie.to_header_string()) {
            Ok(value) => {
                client.append(SET_COOKIE, value);
                relayed += 1;
            }
            Err(e) => {
                tracing::warn!(cookie = %cookie.name, error = %e, "Dropping invalid Set-Cookie header");
            }
        }
    }
    relayed
}
