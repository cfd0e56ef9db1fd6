//! Generic HTTP request handling
//!
//! Sending, logging, and classifying replies is the same for every route;
//! building the `RequestBuilder` (auth headers, body encoding) stays with the
//! concrete client.

use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, UpstreamError};
use crate::types::{ApiMessage, ResultInfo, UpstreamReply};
use crate::utils::log_sanitizer::truncate_for_log;

/// `{success, result, errors, result_info}` as the upstream sends it
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<ApiMessage>>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Send a request and return the status code and body text.
    ///
    /// Connection-level failures are mapped to `Timeout` / `Unreachable`;
    /// any status code is returned as-is for [`Self::classify_reply`].
    pub async fn execute_request(
        request_builder: RequestBuilder,
        upstream_name: &str,
        method_name: &str,
        path: &str,
    ) -> Result<(u16, String)> {
        log::debug!("[{upstream_name}] {method_name} {path}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout {
                    detail: e.to_string(),
                }
            } else {
                UpstreamError::Unreachable {
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("[{upstream_name}] Response Status: {status_code}");

        let response_text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Unreachable {
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{upstream_name}] Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok((status_code, response_text))
    }

    /// Reduce a raw reply to a successful result or a classified error.
    pub fn classify_reply(status: u16, body: &str) -> Result<UpstreamReply> {
        match serde_json::from_str::<Envelope>(body) {
            Ok(envelope) if envelope.success && status < 400 => Ok(UpstreamReply {
                status,
                result: envelope.result.filter(|v| !v.is_null()),
                result_info: envelope.result_info,
            }),
            Ok(envelope) => {
                let errors = envelope.errors.unwrap_or_default();
                let (code, message) = errors.first().map_or_else(
                    || (i64::from(status), format!("HTTP {status}")),
                    |e| (e.code, e.message.clone()),
                );
                Err(UpstreamError::Rejected {
                    status,
                    code,
                    message,
                    errors,
                })
            }
            // Gateway errors in front of the API carry HTML, not an envelope.
            Err(_) if matches!(status, 502..=504) => Err(UpstreamError::Unreachable {
                detail: format!("HTTP {status}: {}", truncate_for_log(body)),
            }),
            Err(_) if status >= 400 => Err(UpstreamError::Rejected {
                status,
                code: i64::from(status),
                message: truncate_for_log(body),
                errors: Vec::new(),
            }),
            Err(_) if body.is_empty() => Ok(UpstreamReply {
                status,
                result: None,
                result_info: None,
            }),
            // KV values and script downloads come back as raw bodies.
            Err(_) => Ok(UpstreamReply {
                status,
                result: Some(Value::String(body.to_string())),
                result_info: None,
            }),
        }
    }
}
