//! `schooladmin-http` is an async HTTP client for the school-admin API.
//!
//! Every call goes through [`ApiClient`], which:
//! - attaches `Authorization: Bearer <token>` from [`TokenStorage`]
//! - clears stored tokens and runs a [`SessionExpiredHandler`] on `401`
//! - retries timeouts and dropped connections with exponential backoff
//! - normalizes every failure into an [`ErrorEnvelope`]
//!
//! Verbs: [`ApiClient::get`], [`ApiClient::post`], [`ApiClient::put`],
//! [`ApiClient::patch`], [`ApiClient::delete`].

mod client;
mod decode;
mod error;
mod options;
mod request;
mod session;
mod storage;
mod types;
mod wire;

pub use client::ApiClient;
pub use error::ApiError;
pub use options::{resolve_base_url, ClientOptions, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use request::RequestOptions;
pub use session::{LogSessionExpired, SessionExpiredHandler};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileTokenStore;
pub use storage::{MemoryTokenStore, TokenStorage, TokenStore, DEFAULT_TOKEN_KEY};
pub use types::{ApiResponse, ErrorEnvelope, FieldErrors};

pub type Result<T> = std::result::Result<T, ApiError>;
