use serde::Deserialize;
use validator::Validate;

/// Body of `POST /api/execute`, forwarded to the judge as-is.
/// `versionIndex` stays untyped because the upstream API accepts both the
/// string and the numeric form and clients have sent both.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[validate(length(min = 1, message = "script is required"))]
    pub script: String,
    #[serde(default)]
    pub stdin: Option<String>,
    #[validate(length(min = 1, message = "language is required"))]
    pub language: String,
    #[serde(default)]
    pub version_index: serde_json::Value,
}
