//! Request / reply types shared by every upstream implementation

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::log_sanitizer::mask_secret;

/// Authentication material for one Cloudflare account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthMaterial {
    /// Scoped API token, sent as a bearer token.
    #[serde(rename_all = "camelCase")]
    ApiToken { api_token: String },
    /// Legacy global API key, sent with the owning email.
    #[serde(rename_all = "camelCase")]
    GlobalApiKey { email: String, api_key: String },
}

impl AuthMaterial {
    /// Short label for logs and listings.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiToken { .. } => "api-token",
            Self::GlobalApiKey { .. } => "global-api-key",
        }
    }

    /// Whether any secret field is empty.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        match self {
            Self::ApiToken { api_token } => api_token.trim().is_empty(),
            Self::GlobalApiKey { email, api_key } => {
                email.trim().is_empty() || api_key.trim().is_empty()
            }
        }
    }
}

// Secrets never reach a log line through `{:?}`.
impl fmt::Debug for AuthMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiToken { api_token } => f
                .debug_struct("ApiToken")
                .field("api_token", &mask_secret(api_token))
                .finish(),
            Self::GlobalApiKey { email, api_key } => f
                .debug_struct("GlobalApiKey")
                .field("email", email)
                .field("api_key", &mask_secret(api_key))
                .finish(),
        }
    }
}

/// HTTP verb of an upstream route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    /// Set for file parts; plain fields leave it empty.
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FormPart {
    /// Plain text field
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: value.into().into_bytes(),
        }
    }

    /// File field
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data,
        }
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Text(String),
    Multipart(Vec<FormPart>),
}

/// A fully resolved request: the path has no placeholders left.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: HttpMethod,
    /// Path relative to the API base, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub auth: AuthMaterial,
}

impl UpstreamRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>, auth: AuthMaterial) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            auth,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

/// One `{code, message}` entry of an envelope's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub code: i64,
    pub message: String,
}

impl ApiMessage {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Pagination block of list replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_count: u32,
}

/// A successful reply.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    /// `result` of the envelope, or the raw body for non-JSON replies.
    pub result: Option<Value>,
    pub result_info: Option<ResultInfo>,
}

impl UpstreamReply {
    pub fn ok(result: Option<Value>) -> Self {
        Self {
            status: 200,
            result,
            result_info: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_masks_secrets() {
        let token = AuthMaterial::ApiToken {
            api_token: "abcd1234secretvalue".to_string(),
        };
        let printed = format!("{token:?}");
        assert!(!printed.contains("secretvalue"), "{printed}");

        let key = AuthMaterial::GlobalApiKey {
            email: "ops@example.com".to_string(),
            api_key: "0123456789abcdef".to_string(),
        };
        let printed = format!("{key:?}");
        assert!(printed.contains("ops@example.com"));
        assert!(!printed.contains("456789abcdef"), "{printed}");
    }

    #[test]
    fn auth_material_serde_shape() {
        let key = AuthMaterial::GlobalApiKey {
            email: "ops@example.com".to_string(),
            api_key: "k".to_string(),
        };
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["type"], "globalApiKey");
        assert_eq!(json["apiKey"], "k");
    }

    #[test]
    fn incomplete_material() {
        assert!(AuthMaterial::ApiToken { api_token: "  ".into() }.is_incomplete());
        assert!(
            AuthMaterial::GlobalApiKey {
                email: String::new(),
                api_key: "k".into()
            }
            .is_incomplete()
        );
        assert!(!AuthMaterial::ApiToken { api_token: "t".into() }.is_incomplete());
    }

    #[test]
    fn form_part_text_has_no_file_name() {
        let part = FormPart::text("branch", "main");
        assert_eq!(part.file_name, None);
        assert_eq!(part.data, b"main");
    }
}
