use std::collections::BTreeMap;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION},
    Method,
};

use crate::{ApiError, ErrorEnvelope};

/// Per-call options accepted by every verb on [`crate::ApiClient`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Headers merged over the client defaults; these win on conflict.
    pub headers: BTreeMap<String, String>,
    /// Query-string pairs, attached in order.
    pub params: Vec<(String, String)>,
    /// Overrides the client's retry budget for this call only.
    pub retries: Option<usize>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Builds options from query pairs only.
    pub fn params<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        pairs
            .into_iter()
            .fold(Self::default(), |opts, (key, value)| opts.param(key, value))
    }

    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = Some(retries);
        self
    }
}

/// Fully resolved request, reused verbatim for every retry of one call.
#[derive(Debug)]
pub(crate) struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub max_retries: usize,
}

/// Merges default headers, caller headers and the authorization value, in
/// that order of increasing precedence.
pub(crate) fn merge_headers(
    defaults: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
    authorization: Option<&str>,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::with_capacity(defaults.len() + overrides.len() + 1);
    for (name, value) in defaults.iter().chain(overrides.iter()) {
        headers.insert(parse_name(name)?, parse_value(name, value)?);
    }
    if let Some(authorization) = authorization {
        headers.insert(AUTHORIZATION, parse_value("authorization", authorization)?);
    }
    Ok(headers)
}

fn parse_name(name: &str) -> Result<HeaderName, ApiError> {
    HeaderName::from_bytes(name.trim().as_bytes()).map_err(|err| {
        ApiError::InvalidRequest(ErrorEnvelope::without_response(format!(
            "invalid header name '{name}': {err}"
        )))
    })
}

fn parse_value(name: &str, value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|err| {
        ApiError::InvalidRequest(ErrorEnvelope::without_response(format!(
            "invalid value for header '{name}': {err}"
        )))
    })
}
