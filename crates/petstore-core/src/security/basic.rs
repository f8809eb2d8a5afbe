//! HTTP Basic credentials
//!
//! Presentation layers hand the service layer either a raw
//! `Authorization: Basic ...` header value or a login/password pair; both
//! end up as [`Credentials`].

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::fmt;
use zeroize::Zeroizing;

/// A login and clear-text password, wiped from memory on drop
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Parse the value of an `Authorization` header using the Basic scheme
///
/// Returns `None` for any other scheme, undecodable base64, non UTF-8
/// payloads, a payload without `:` or an empty login.
pub fn parse_basic_header(header: &str) -> Option<Credentials> {
    let header = header.trim();
    let (scheme, encoded) = header.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = Zeroizing::new(BASE64.decode(encoded.trim()).ok()?);
    let payload = Zeroizing::new(String::from_utf8(decoded.to_vec()).ok()?);
    let (login, password) = payload.split_once(':')?;
    if login.is_empty() {
        return None;
    }

    Some(Credentials::new(login, password))
}
