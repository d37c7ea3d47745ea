//! HTTP client for the Treasure Map followup service.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::SubmissionSuccess;

use super::{ApiError, DoiRequest, SubmissionApi, SubmissionRequest};

pub const DEFAULT_BASE_URL: &str = "https://treasuremap.space/api/v0";

/// Blocking client; one request per call, no retries.
pub struct TreasureMapClient {
    base_url: String,
    http: Client,
}

impl TreasureMapClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("tmsubmit/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn post(&self, target: &str, body: &impl Serialize) -> Result<(u16, String), ApiError> {
        let url = format!("{}/{target}", self.base_url);
        tracing::debug!(%url, "POST");

        let response = self.http.post(&url).json(body).send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        Ok((status, text))
    }
}

impl SubmissionApi for TreasureMapClient {
    fn submit_pointings(
        &self,
        request: &SubmissionRequest<'_>,
    ) -> Result<SubmissionSuccess, ApiError> {
        let (status, body) = self.post("pointings", request)?;
        parse_pointings_response(status, &body)
    }

    fn request_doi(&self, request: &DoiRequest<'_>) -> Result<Value, ApiError> {
        let (status, body) = self.post("request_doi", request)?;
        parse_doi_response(status, body)
    }
}

/// Interpret a `/request_doi` response. The endpoint has answered with bare
/// text as well as JSON.
fn parse_doi_response(status: u16, body: String) -> Result<Value, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status { status, body });
    }
    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

#[derive(Debug, Deserialize)]
struct PointingsResponse {
    #[serde(default)]
    pointing_ids: Vec<u64>,
    #[serde(default, rename = "ERRORS")]
    errors: Vec<Value>,
    #[serde(default, rename = "WARNINGS")]
    warnings: Vec<Value>,
}

/// Interpret a `/pointings` response.
///
/// Non-2xx is a failure. A 2xx that assigned no ids but listed errors means
/// every pointing was rejected. Anything else is a success, with any
/// per-pointing errors and warnings kept alongside the ids.
fn parse_pointings_response(status: u16, body: &str) -> Result<SubmissionSuccess, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            body: body.to_string(),
        });
    }

    let response: Value = serde_json::from_str(body)?;
    let parsed: PointingsResponse = serde_json::from_value(response.clone())?;

    if parsed.pointing_ids.is_empty() && !parsed.errors.is_empty() {
        return Err(ApiError::Rejected(Value::Array(parsed.errors).to_string()));
    }

    Ok(SubmissionSuccess {
        pointing_ids: parsed.pointing_ids,
        errors: parsed.errors,
        warnings: parsed.warnings,
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_yields_ids() {
        let success = parse_pointings_response(
            200,
            r#"{"pointing_ids": [41, 42], "ERRORS": [], "WARNINGS": ["duplicate time"]}"#,
        )
        .unwrap();

        assert_eq!(success.pointing_ids, [41, 42]);
        assert!(success.errors.is_empty());
        assert_eq!(success.warnings.len(), 1);
        assert_eq!(success.response["pointing_ids"][1], 42);
    }

    #[test]
    fn doi_json_response_is_parsed() {
        let value =
            parse_doi_response(200, r#"{"DOI URL": "https://doi.org/10.5281/x"}"#.into()).unwrap();
        assert_eq!(value["DOI URL"], "https://doi.org/10.5281/x");
    }

    #[test]
    fn doi_plain_text_response_is_kept_as_string() {
        let value = parse_doi_response(200, "DOI already minted".into()).unwrap();
        assert_eq!(value, Value::String("DOI already minted".into()));
    }

    #[test]
    fn doi_error_status_is_failure() {
        let err = parse_doi_response(403, "invalid api_token".into()).unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 403, body } if body.contains("api_token")));
    }

    #[test]
    fn server_error_is_failure() {
        let err = parse_pointings_response(502, "bad gateway").unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 502, .. }));
    }

    #[test]
    fn all_rejected_is_failure() {
        let err = parse_pointings_response(
            200,
            r#"{"pointing_ids": [], "ERRORS": [["Invalid instrumentid"]]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(msg) if msg.contains("instrumentid")));
    }

    #[test]
    fn partial_errors_still_succeed() {
        let success = parse_pointings_response(
            200,
            r#"{"pointing_ids": [7], "ERRORS": ["row 2: bad depth"]}"#,
        )
        .unwrap();
        assert_eq!(success.pointing_ids, [7]);
        assert_eq!(success.errors.len(), 1);
    }

    #[test]
    fn non_json_body_is_decode_error() {
        let err = parse_pointings_response(200, "<html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = TreasureMapClient::new("http://localhost:9/api/v0/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9/api/v0");
    }
}
