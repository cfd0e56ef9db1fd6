//! Request construction: URL, authentication headers, body encoding

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};

use crate::error::{Result, UpstreamError};
use crate::types::{AuthMaterial, FormPart, HttpMethod, RequestBody, UpstreamRequest};

use super::CloudflareClient;

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn to_multipart(parts: &[FormPart]) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        let mut field = Part::bytes(part.data.clone());
        if let Some(file_name) = &part.file_name {
            field = field.file_name(file_name.clone());
        }
        if let Some(content_type) = &part.content_type {
            field = field
                .mime_str(content_type)
                .map_err(|e| UpstreamError::InvalidRequest {
                    detail: format!("Invalid content type for part '{}': {e}", part.name),
                })?;
        }
        form = form.part(part.name.clone(), field);
    }
    Ok(form)
}

impl CloudflareClient {
    /// Build an authenticated `RequestBuilder` for one upstream request.
    pub(crate) fn build_request(&self, request: &UpstreamRequest) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.api_base, request.path);
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.auth {
            AuthMaterial::ApiToken { api_token } => builder.bearer_auth(api_token),
            AuthMaterial::GlobalApiKey { email, api_key } => builder
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", api_key),
        };

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Text(text) => builder
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(text.clone()),
            RequestBody::Multipart(parts) => builder.multipart(to_multipart(parts)?),
        };

        Ok(builder)
    }
}
