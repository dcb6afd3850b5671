//! Sync address parsing.
//!
//! An address takes the form `[[user@]host:]path`. Without the prefix the
//! address names a path on the local machine. There is no escaping
//! mechanism, so a purely local path containing a colon before any `@`
//! parses as a remote address; callers must avoid such paths.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::SyncError;

static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();

fn address_re() -> &'static Regex {
    ADDRESS_RE.get_or_init(|| {
        Regex::new(r"^(?:(?:(?P<user>[^@]+)@)?(?P<host>[^:]+):)?(?P<path>.+)$")
            .expect("address grammar regex is valid")
    })
}

/// One side of a sync relationship, as written by the user.
///
/// `hostname` is empty for the local machine, and `username` is empty
/// whenever `hostname` is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAddress {
    pub username: String,
    pub hostname: String,
    pub path: String,
}

impl SyncAddress {
    /// Parse an address string into its (username, hostname, path) parts.
    ///
    /// When the `host:` prefix is present without `user@`, the username
    /// defaults to the invoking process's OS user; if that cannot be
    /// resolved the username is left empty rather than failing the parse.
    pub fn parse(address: &str) -> Result<SyncAddress, SyncError> {
        let captures = address_re()
            .captures(address)
            .ok_or_else(|| SyncError::MalformedAddress(address.to_string()))?;

        let hostname = captures
            .name("host")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let username = if hostname.is_empty() {
            String::new()
        } else {
            match captures.name("user") {
                Some(user) => user.as_str().to_string(),
                None => whoami::username().unwrap_or_default(),
            }
        };
        let path = captures["path"].to_string();

        Ok(SyncAddress {
            username,
            hostname,
            path,
        })
    }

    pub fn is_remote(&self) -> bool {
        !self.hostname.is_empty()
    }
}
