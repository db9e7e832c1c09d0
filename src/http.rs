//! The HTTP capability consumed by the remote orchestrator.
//!
//! The pipeline only ever needs "send a request, receive a status and a
//! body", so that is the whole trait. Keeping the transport behind
//! [`HttpCapability`] lets tests drive the full orchestration against a
//! scripted mock, and lets embedders substitute their own client (proxying,
//! instrumentation) without the pipeline knowing.
//!
//! [`ReqwestCapability`] is the default implementation, built on `reqwest`
//! with rustls.

use crate::error::OcrMdError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// HTTP method, restricted to what the OCR protocol uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body variants.
///
/// Multipart is modelled structurally (not as raw encoded bytes) so mock
/// transports can assert on fields without parsing MIME boundaries.
#[derive(Debug, Clone)]
pub enum HttpBody {
    Empty,
    Json(Value),
    Multipart {
        file_name: String,
        bytes: Vec<u8>,
        fields: Vec<(String, String)>,
    },
}

/// One outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: HttpBody,
}

/// Status code plus raw body: all the pipeline ever inspects.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for any 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A transport-level failure: the request never produced a status code.
///
/// Status-code failures are not errors at this layer; they come back as a
/// normal [`HttpResponse`] for the orchestrator to classify.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HttpError(pub String);

/// The capability contract: issue one request, receive status + body.
#[async_trait]
pub trait HttpCapability: Send + Sync {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Default transport backed by a shared `reqwest::Client`.
pub struct ReqwestCapability {
    client: reqwest::Client,
}

impl ReqwestCapability {
    /// Build a client with the given whole-request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self, OcrMdError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OcrMdError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpCapability for ReqwestCapability {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = match req.method {
            HttpMethod::Get => self.client.get(&req.url),
            HttpMethod::Post => self.client.post(&req.url),
        };

        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match req.body {
            HttpBody::Empty => builder,
            HttpBody::Json(value) => builder.json(&value),
            HttpBody::Multipart {
                file_name,
                bytes,
                fields,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                builder.multipart(form.part("file", part))
            }
        };

        let response = builder.send().await.map_err(|e| HttpError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError(format!("failed to read response body: {e}")))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_covers_2xx_only() {
        assert!(HttpResponse { status: 200, body: vec![] }.ok());
        assert!(HttpResponse { status: 299, body: vec![] }.ok());
        assert!(!HttpResponse { status: 199, body: vec![] }.ok());
        assert!(!HttpResponse { status: 300, body: vec![] }.ok());
        assert!(!HttpResponse { status: 500, body: vec![] }.ok());
    }

    #[test]
    fn text_is_lossy() {
        let resp = HttpResponse {
            status: 200,
            body: vec![0x68, 0x69, 0xFF],
        };
        assert!(resp.text().starts_with("hi"));
    }

    #[test]
    fn json_parses_body() {
        let resp = HttpResponse {
            status: 200,
            body: br#"{"id": "file-123"}"#.to_vec(),
        };
        let value = resp.json().unwrap();
        assert_eq!(value["id"], "file-123");
    }

    #[test]
    fn json_rejects_non_json() {
        let resp = HttpResponse {
            status: 200,
            body: b"not json".to_vec(),
        };
        assert!(resp.json().is_err());
    }
}
