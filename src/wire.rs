use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Success body as sent by the API. Every field is optional so that
/// partially conforming servers still decode.
#[derive(Debug, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, rename = "statusCode", alias = "status_code")]
    pub status_code: Option<u16>,
}

/// Keys that mark a JSON object as a response envelope.
pub const ENVELOPE_KEYS: [&str; 3] = ["data", "success", "statusCode"];

/// Error body as sent by the API.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<JsonValue>,
    #[serde(default)]
    pub errors: Option<JsonValue>,
    #[serde(default)]
    pub timestamp: Option<JsonValue>,
    #[serde(default)]
    pub path: Option<String>,
}
