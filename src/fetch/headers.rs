//! Outgoing request header construction.
//!
//! [`build_request_headers`] starts from the crate defaults (`User-Agent`,
//! `Accept`), adds the form `Content-Type` for POST bodies, and finally
//! applies the caller's headers, which win on conflict. Authorization
//! values arrive already assembled and are only marked sensitive.

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue};

use super::Method;
use crate::error::HarvestError;

const DEFAULT_USER_AGENT: HeaderValue =
    HeaderValue::from_static(concat!("infraharvest/", env!("CARGO_PKG_VERSION")));

pub fn build_request_headers(method: Method, extra: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, DEFAULT_USER_AGENT);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if method == Method::Post {
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
    }

    // Replace defaults per name, keeping every value the caller repeated.
    for key in extra.keys() {
        headers.remove(key);
        for value in extra.get_all(key) {
            headers.append(key, value.clone());
        }
    }
    headers
}

/// Parse a caller-supplied header pair.
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HarvestError> {
    let key = name
        .parse::<HeaderName>()
        .map_err(|e| HarvestError::InvalidHeader {
            name: name.to_string(),
            message: e.to_string(),
        })?;
    let mut val = HeaderValue::from_str(value).map_err(|e| HarvestError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    if key == AUTHORIZATION {
        val.set_sensitive(true);
    }
    Ok((key, val))
}
