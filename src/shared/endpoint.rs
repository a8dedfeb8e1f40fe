//! Server address normalization.
//!
//! Users hand the client anything from `localhost:8000` to
//! `https://tes.example.org/some/page`. The client only needs the scheme and
//! authority; request paths are always rooted at `/v1/tasks`.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::error::{Error, Result};

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid scheme pattern"))
}

/// Reduce `address` to `scheme://authority`.
///
/// Any path is dropped and a missing scheme defaults to `http://`. Schemes
/// other than `http`/`https` are rejected with [`Error::InvalidEndpoint`];
/// an address without a host is rejected with [`Error::Config`].
///
/// # Examples
///
/// ```
/// use tes_client::shared::endpoint::normalize_endpoint;
///
/// assert_eq!(normalize_endpoint("localhost:8000").unwrap(), "http://localhost:8000");
/// assert_eq!(
///     normalize_endpoint("https://tes.example.org/v1/tasks").unwrap(),
///     "https://tes.example.org"
/// );
/// assert!(normalize_endpoint("ftp://files.example.org").is_err());
/// assert!(normalize_endpoint("http://").is_err());
/// ```
pub fn normalize_endpoint(address: &str) -> Result<String> {
    let address = address.trim();
    let (scheme, rest) = match scheme_pattern().find(address) {
        Some(found) => {
            let scheme = found.as_str().to_ascii_lowercase();
            if scheme != "http://" && scheme != "https://" {
                return Err(Error::InvalidEndpoint {
                    scheme: found.as_str().to_string(),
                });
            }
            (scheme, &address[found.end()..])
        },
        None => ("http://".to_string(), address),
    };

    let missing_host = || Error::Config(format!("invalid server address '{address}': missing host"));
    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() {
        return Err(missing_host());
    }

    let endpoint = format!("{scheme}{authority}");
    let url = Url::parse(&endpoint)
        .map_err(|e| Error::Config(format!("invalid server address '{address}': {e}")))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(missing_host());
    }
    Ok(endpoint)
}
