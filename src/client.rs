use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

// tokio::time::sleep is only available on non-WASM targets.
#[cfg(not(target_arch = "wasm32"))]
use tokio::time::sleep;

use crate::{
    decode::{decode_error_envelope, decode_response},
    options::join_url,
    request::{merge_headers, RequestDescriptor},
    ApiError, ApiResponse, ClientOptions, ErrorEnvelope, LogSessionExpired, RequestOptions,
    Result, SessionExpiredHandler, TokenStorage,
};

#[derive(Clone)]
/// HTTP client for the school-admin API.
///
/// Cloning is cheap: clones share the connection pool, the token storage and
/// the session-expired handler.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStorage,
    on_session_expired: Arc<dyn SessionExpiredHandler>,
    options: ClientOptions,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `base_url` with default options, two in-memory
    /// token stores and a session-expired handler that only logs.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            tokens: TokenStorage::in_memory(),
            on_session_expired: Arc::new(LogSessionExpired),
            options: ClientOptions::default(),
        }
    }

    /// Creates a client whose base URL comes from `API_BASE_URL`, falling
    /// back to `http://localhost:5000/api` when unset or blank.
    ///
    /// **Not available on `wasm32` targets** — pass the URL to
    /// [`ApiClient::new`] instead.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use schooladmin_http::ApiClient;
    ///
    /// let api = ApiClient::from_env();
    /// ```
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let configured = std::env::var(crate::options::BASE_URL_ENV).ok();
        Self::new(crate::options::resolve_base_url(configured))
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Replaces the stores the bearer token is read from.
    pub fn with_token_storage(mut self, tokens: TokenStorage) -> Self {
        self.tokens = tokens;
        self
    }

    /// Replaces the hook run after a `401`.
    pub fn with_session_expired_handler(
        mut self,
        handler: impl SessionExpiredHandler + 'static,
    ) -> Self {
        self.on_session_expired = Arc::new(handler);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStorage {
        &self.tokens
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        self.request(Method::GET, path, None, options).await
    }

    pub async fn post<T, B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.request(Method::POST, path, Some(body), options).await
    }

    pub async fn put<T, B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.request(Method::PUT, path, Some(body), options).await
    }

    pub async fn patch<T, B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.request(Method::PATCH, path, Some(body), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        self.request(Method::DELETE, path, None, options).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        let authorization = self
            .tokens
            .bearer()
            .map(|token| normalize_bearer_authorization(&token));
        let headers = merge_headers(
            &self.options.default_headers,
            &options.headers,
            authorization.as_deref(),
        )?;

        let descriptor = RequestDescriptor {
            method,
            url: join_url(&self.base_url, path),
            headers,
            query: options.params,
            body,
            max_retries: options.retries.unwrap_or(self.options.max_retries),
        };
        self.send_with_retry(&descriptor).await
    }

    async fn send_with_retry<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ApiResponse<T>> {
        // Scoped to this call; concurrent calls never share a retry budget.
        let mut attempt = 0usize;
        loop {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %descriptor.method,
                url = %descriptor.url,
                attempt,
                "sending api request"
            );

            // On WASM, reqwest uses AbortController for the timeout; the
            // `.timeout()` method is available on both targets.
            let mut request = self
                .http
                .request(descriptor.method.clone(), &descriptor.url)
                .headers(descriptor.headers.clone())
                .timeout(Duration::from_millis(self.options.timeout_ms));
            if !descriptor.query.is_empty() {
                request = request.query(&descriptor.query);
            }
            if let Some(body) = &descriptor.body {
                request = request.body(body.clone());
            }

            let err = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    match response.text().await {
                        Ok(body) => return self.handle_response(status, &body),
                        // Error statuses are judged on the status alone.
                        Err(_) if !status.is_success() => {
                            return self.handle_response(status, "");
                        }
                        Err(err) if err.is_timeout() && attempt < descriptor.max_retries => {
                            attempt += 1;
                            self.wait_before_retry(attempt).await;
                            continue;
                        }
                        Err(err) => {
                            return Err(ApiError::UnknownTransportFailure(ErrorEnvelope {
                                status_code: status.as_u16(),
                                ..ErrorEnvelope::without_response(err.to_string())
                            }));
                        }
                    }
                }
                Err(err) => err,
            };

            let envelope = ErrorEnvelope::without_response(err.to_string());
            if !is_transient(&err) {
                return Err(ApiError::UnknownTransportFailure(envelope));
            }
            if attempt < descriptor.max_retries {
                attempt += 1;
                self.wait_before_retry(attempt).await;
                continue;
            }
            return Err(ApiError::TransientNetworkFailure {
                envelope,
                attempts: attempt + 1,
            });
        }
    }

    fn handle_response<T: DeserializeOwned>(
        &self,
        status: StatusCode,
        body: &str,
    ) -> Result<ApiResponse<T>> {
        if status.is_success() {
            return decode_response(status, body);
        }

        let envelope = decode_error_envelope(status, body);
        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(ApiError::AuthenticationExpired(envelope));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(status = status.as_u16(), message = %envelope.message, "api request rejected");

        Err(ApiError::ServerRejection(envelope))
    }

    fn expire_session(&self) {
        #[cfg(feature = "tracing")]
        tracing::warn!(key = self.tokens.key(), "api answered 401, clearing stored tokens");

        self.tokens.clear();
        self.on_session_expired
            .session_expired(&self.options.login_path);
    }

    /// Waits before retry number `attempt` (1-based).
    ///
    /// On native targets: `tokio::time::sleep`.
    /// On WASM targets: a `setTimeout` promise on the JS global.
    async fn wait_before_retry(&self, attempt: usize) {
        let delay = backoff_delay(self.options.retry_backoff_ms, attempt);

        #[cfg(feature = "tracing")]
        tracing::warn!("retrying api request after {} ms", delay.as_millis());

        sleep(delay).await;
    }
}

/// Delay before retry number `attempt`: `unit_ms * 2^attempt`.
pub(crate) fn backoff_delay(unit_ms: u64, attempt: usize) -> Duration {
    let exp = attempt.min(16) as u32;
    let multiplier = 1u64 << exp;
    Duration::from_millis(unit_ms.saturating_mul(multiplier))
}

#[cfg(target_arch = "wasm32")]
async fn sleep(delay: Duration) {
    use wasm_bindgen::{JsCast, JsValue};

    let millis = delay.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let global = js_sys::global();
        let set_timeout = js_sys::Reflect::get(&global, &JsValue::from("setTimeout"))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok());
        match set_timeout {
            Some(set_timeout) => {
                let _ = set_timeout.call2(&global, &resolve, &JsValue::from(millis));
            }
            None => {
                let _ = resolve.call0(&JsValue::UNDEFINED);
            }
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Timeouts and failures where no response arrived are worth retrying.
fn is_transient(err: &reqwest::Error) -> bool {
    if err.status().is_some() {
        return false;
    }
    err.is_timeout()
        || err.is_request()
        // is_connect() is not available on wasm32 targets (no TCP)
        || {
            #[cfg(not(target_arch = "wasm32"))]
            { err.is_connect() }
            #[cfg(target_arch = "wasm32")]
            { false }
        }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(|err| {
        ApiError::InvalidRequest(ErrorEnvelope::without_response(format!(
            "request body could not be encoded: {err}"
        )))
    })
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
